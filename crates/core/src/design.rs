//! Response validation: the trust boundary between service output and
//! safe-to-compile designs.
//!
//! The reasoning service's reply is untrusted text. This stage strips the
//! decoration models like to add (code fences, leading prose), parses the
//! remainder as JSON, and checks the per-mode shape. Only replies that pass
//! every check become an [`ArtifactDesign`]; everything else is discarded
//! with `MalformedResponse` or `SchemaViolation`.

use crate::error::PipelineError;
use crate::request::ArtifactMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A validated game design, ready for compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDesign {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub learning_goals: Vec<String>,
    pub achievements: BTreeSet<String>,
    /// The self-contained game markup the service produced. Treated as data
    /// until the compiler wraps it; never interpreted by the host.
    pub markup: String,
}

/// One validated quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`, already checked to be in bounds.
    pub correct_answer: usize,
    pub explanation: String,
    pub difficulty: Option<String>,
    pub points: Option<u32>,
}

/// A validated explanatory lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDesign {
    pub title: String,
    pub content: String,
    pub achievement_unlocked: Option<String>,
    pub fun_fact: Option<String>,
}

/// The service's structured reply after validation. Guaranteed to carry
/// every field the artifact compiler requires for its mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactDesign {
    Game(GameDesign),
    Quiz(Vec<QuizQuestion>),
    Lesson(LessonDesign),
    Chat(String),
}

/// Parses and validates a raw service reply against the schema for `mode`.
pub fn validate_reply(mode: ArtifactMode, raw: &str) -> Result<ArtifactDesign, PipelineError> {
    if mode == ArtifactMode::Chat {
        // Chat replies are plain text; an empty reply is still unusable.
        let text = raw.trim();
        if text.is_empty() {
            return Err(PipelineError::schema(mode, "reply was empty"));
        }
        return Ok(ArtifactDesign::Chat(text.to_string()));
    }

    let json = extract_json(raw)
        .ok_or_else(|| PipelineError::MalformedResponse("no JSON value found".to_string()))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;

    match mode {
        ArtifactMode::Game => validate_game(value).map(ArtifactDesign::Game),
        ArtifactMode::Quiz => validate_quiz(value).map(ArtifactDesign::Quiz),
        ArtifactMode::Lesson => validate_lesson(value).map(ArtifactDesign::Lesson),
        ArtifactMode::Chat => unreachable!("handled above"),
    }
}

/// Trims code fences and any prose before the first JSON object or array.
fn extract_json(raw: &str) -> Option<&str> {
    let mut text = raw.trim();
    if let Some(idx) = text.find("```json") {
        text = &text[idx + "```json".len()..];
    }
    if let Some(idx) = text.find("```") {
        text = &text[..idx];
    }
    let start = text.find(['{', '['])?;
    Some(text[start..].trim())
}

fn required_str(
    mode: ArtifactMode,
    value: &Value,
    field: &str,
) -> Result<String, PipelineError> {
    let text = value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::schema(mode, format!("`{}` missing or not a string", field)))?;
    if text.trim().is_empty() {
        return Err(PipelineError::schema(mode, format!("`{}` is empty", field)));
    }
    Ok(text.to_string())
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

fn string_list(mode: ArtifactMode, value: &Value, field: &str) -> Result<Vec<String>, PipelineError> {
    let items = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::schema(mode, format!("`{}` missing or not a list", field)))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                PipelineError::schema(mode, format!("`{}` contains a non-string entry", field))
            })
        })
        .collect()
}

fn validate_game(value: Value) -> Result<GameDesign, PipelineError> {
    let mode = ArtifactMode::Game;
    if !value.is_object() {
        return Err(PipelineError::schema(mode, "reply is not a JSON object"));
    }
    // `htmlCode` holds the mechanics; a game without it cannot run.
    let markup = required_str(mode, &value, "htmlCode")
        .map_err(|_| PipelineError::schema(mode, "`htmlCode` (mechanics) missing or empty"))?;
    Ok(GameDesign {
        title: required_str(mode, &value, "title")?,
        description: required_str(mode, &value, "description")?,
        instructions: required_str(mode, &value, "instructions")?,
        learning_goals: string_list(mode, &value, "learningGoals")?,
        achievements: string_list(mode, &value, "achievements")?
            .into_iter()
            .collect(),
        markup,
    })
}

fn validate_quiz(value: Value) -> Result<Vec<QuizQuestion>, PipelineError> {
    let mode = ArtifactMode::Quiz;
    let items = value
        .as_array()
        .ok_or_else(|| PipelineError::schema(mode, "reply is not a JSON array"))?;
    if items.is_empty() {
        return Err(PipelineError::schema(mode, "quiz has no questions"));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let options = string_list(mode, item, "options")?;
            if options.len() < 2 {
                return Err(PipelineError::schema(
                    mode,
                    format!("question {} has fewer than 2 options", i),
                ));
            }
            let correct = item
                .get("correctAnswer")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    PipelineError::schema(
                        mode,
                        format!("question {} has no numeric `correctAnswer`", i),
                    )
                })? as usize;
            if correct >= options.len() {
                return Err(PipelineError::schema(
                    mode,
                    format!("question {} `correctAnswer` out of bounds", i),
                ));
            }
            Ok(QuizQuestion {
                question: required_str(mode, item, "question")?,
                options,
                correct_answer: correct,
                explanation: required_str(mode, item, "explanation")?,
                difficulty: optional_str(item, "difficulty"),
                points: item
                    .get("points")
                    .and_then(Value::as_u64)
                    .map(|p| p as u32),
            })
        })
        .collect()
}

fn validate_lesson(value: Value) -> Result<LessonDesign, PipelineError> {
    let mode = ArtifactMode::Lesson;
    if !value.is_object() {
        return Err(PipelineError::schema(mode, "reply is not a JSON object"));
    }
    Ok(LessonDesign {
        title: required_str(mode, &value, "title")?,
        content: required_str(mode, &value, "content")?,
        achievement_unlocked: optional_str(&value, "achievement_unlocked"),
        fun_fact: optional_str(&value, "fun_fact").or_else(|| optional_str(&value, "funFact")),
    })
}

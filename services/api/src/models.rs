//! API Models
//!
//! This module defines the request and response bodies for the HTTP
//! endpoints, shaped to match the frontend's wire format (camelCase field
//! names where the original protocol uses them) and annotated for OpenAPI
//! documentation with `utoipa`.

use serde::{Deserialize, Serialize};
use sprout_core::design::{GameDesign, LessonDesign, QuizQuestion};
use sprout_core::compiler::RuntimeBundle;
use utoipa::ToSchema;

/// Request body shared by `/game`, `/quiz` and `/explain`.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct LearningPayload {
    #[schema(example = 8)]
    pub age: i64,
    /// Stated accommodation need; free text, empty for none.
    #[schema(example = "adhd")]
    pub disability: String,
    #[schema(example = "Science")]
    pub subject: String,
    #[schema(example = "Plants")]
    pub topic: String,
}

/// Request body for `/generate_text`.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct GenerateTextPayload {
    #[schema(example = "a short poem about rain")]
    pub prompt: String,
    #[schema(example = 8)]
    pub age: i64,
    #[schema(example = "none")]
    pub disability: String,
}

/// Response body for `/game`. `htmlCode` carries the compiled,
/// self-contained bundle document.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct GameResponse {
    pub title: String,
    pub description: String,
    pub instructions: String,
    #[serde(rename = "htmlCode")]
    pub html_code: String,
    #[serde(rename = "learningGoals")]
    pub learning_goals: Vec<String>,
    pub achievements: Vec<String>,
}

impl GameResponse {
    pub fn from_parts(design: GameDesign, bundle: RuntimeBundle) -> Self {
        Self {
            title: bundle.title,
            description: design.description,
            instructions: bundle.instructions,
            html_code: bundle.document,
            learning_goals: design.learning_goals,
            achievements: bundle.achievements.into_iter().collect(),
        }
    }
}

/// One question in a `/quiz` response.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct QuizQuestionDto {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl From<QuizQuestion> for QuizQuestionDto {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
            difficulty: q.difficulty,
            points: q.points,
        }
    }
}

/// Response body for `/explain`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ExplainResponse {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_unlocked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
}

impl From<LessonDesign> for ExplainResponse {
    fn from(lesson: LessonDesign) -> Self {
        Self {
            title: lesson.title,
            content: lesson.content,
            achievement_unlocked: lesson.achievement_unlocked,
            fun_fact: lesson.fun_fact,
        }
    }
}

/// Response body for `/generate_text`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct GeneratedTextResponse {
    pub generated_text: String,
}

/// Response body for `/transcribe`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TranscriptResponse {
    pub transcript: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

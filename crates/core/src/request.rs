//! Learner profiles and canonical generation requests.
//!
//! Raw user-entered fields enter the pipeline through
//! [`GenerationRequest::normalize`], which either rejects them with
//! `InvalidRequest` or produces a canonical, immutable request. Nothing past
//! this point sees free-form mode or subject strings.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of learning artifact a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactMode {
    Game,
    Quiz,
    Lesson,
    Chat,
}

impl fmt::Display for ArtifactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactMode::Game => "game",
            ArtifactMode::Quiz => "quiz",
            ArtifactMode::Lesson => "lesson",
            ArtifactMode::Chat => "chat",
        };
        write!(f, "{}", s)
    }
}

impl ArtifactMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "game" => Some(Self::Game),
            "quiz" => Some(Self::Quiz),
            "lesson" | "explain" => Some(Self::Lesson),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

/// Subject areas the prompt templates know how to frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Math,
    Science,
    Reading,
    Art,
    Music,
    SocialStudies,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Subject::Math => "Math",
            Subject::Science => "Science",
            Subject::Reading => "Reading",
            Subject::Art => "Art",
            Subject::Music => "Music",
            Subject::SocialStudies => "Social Studies",
        };
        write!(f, "{}", s)
    }
}

impl Subject {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "math" | "maths" | "mathematics" => Some(Self::Math),
            "science" => Some(Self::Science),
            "reading" | "english" | "language" => Some(Self::Reading),
            "art" => Some(Self::Art),
            "music" => Some(Self::Music),
            "social_studies" | "history" | "geography" => Some(Self::SocialStudies),
            _ => None,
        }
    }
}

/// A stated accommodation need that prompt construction adapts content to.
///
/// Known tags get dedicated adaptation rules; anything else is carried as
/// free text so the reasoning service can still take it into account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccommodationTag {
    Visual,
    Motor,
    Adhd,
    Hearing,
    Other(String),
    None,
}

impl AccommodationTag {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "none" | "no" | "n/a" => Self::None,
            "visual" | "blind" | "low vision" => Self::Visual,
            "motor" | "mobility" => Self::Motor,
            "adhd" => Self::Adhd,
            "hearing" | "deaf" => Self::Hearing,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for AccommodationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccommodationTag::Visual => write!(f, "visual"),
            AccommodationTag::Motor => write!(f, "motor"),
            AccommodationTag::Adhd => write!(f, "adhd"),
            AccommodationTag::Hearing => write!(f, "hearing"),
            AccommodationTag::Other(text) => write!(f, "{}", text),
            AccommodationTag::None => write!(f, "none"),
        }
    }
}

/// Who the artifact is for. Immutable once submitted for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub name: String,
    pub age: u8,
    pub accommodation: AccommodationTag,
}

impl LearnerProfile {
    /// The age band used to pick content complexity and pacing.
    pub fn age_band(&self) -> AgeBand {
        match self.age {
            0..=6 => AgeBand::Early,
            7..=10 => AgeBand::Middle,
            _ => AgeBand::Upper,
        }
    }
}

/// Coarse age grouping mirrored in the prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    /// Ages 3-6: large targets, bright visuals, minimal text.
    Early,
    /// Ages 7-10: simple rules, points, short text.
    Middle,
    /// Ages 11+: timers, richer logic, detailed explanations.
    Upper,
}

/// Raw user-entered fields, before validation.
#[derive(Debug, Clone)]
pub struct RawGenerationRequest {
    pub name: String,
    pub age: i64,
    pub accommodation: String,
    pub subject: String,
    pub topic: String,
    pub mode: String,
}

/// A canonical, validated request. Created per user action, consumed once by
/// the pipeline, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub profile: LearnerProfile,
    pub subject: Subject,
    pub topic: String,
    pub mode: ArtifactMode,
}

impl GenerationRequest {
    /// Validates and shapes raw fields into a canonical request.
    ///
    /// Fails with `InvalidRequest` when the topic is blank, the mode or
    /// subject is unrecognized, or the age falls outside 1-18. Pure; no side
    /// effects.
    pub fn normalize(raw: RawGenerationRequest) -> Result<Self, PipelineError> {
        let topic = raw.topic.trim().to_string();
        if topic.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "topic must not be empty".to_string(),
            ));
        }

        let mode = ArtifactMode::parse(&raw.mode).ok_or_else(|| {
            PipelineError::InvalidRequest(format!("unrecognized mode '{}'", raw.mode))
        })?;

        let subject = Subject::parse(&raw.subject).ok_or_else(|| {
            PipelineError::InvalidRequest(format!("unrecognized subject '{}'", raw.subject))
        })?;

        if !(1..=18).contains(&raw.age) {
            return Err(PipelineError::InvalidRequest(format!(
                "age must be between 1 and 18, got {}",
                raw.age
            )));
        }

        Ok(Self {
            profile: LearnerProfile {
                name: raw.name.trim().to_string(),
                age: raw.age as u8,
                accommodation: AccommodationTag::parse(&raw.accommodation),
            },
            subject,
            topic,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(topic: &str, mode: &str) -> RawGenerationRequest {
        RawGenerationRequest {
            name: "Mia".to_string(),
            age: 8,
            accommodation: "ADHD".to_string(),
            subject: "Science".to_string(),
            topic: topic.to_string(),
            mode: mode.to_string(),
        }
    }

    #[test]
    fn normalizes_a_valid_request() {
        let req = GenerationRequest::normalize(raw("Plants", "game")).unwrap();
        assert_eq!(req.mode, ArtifactMode::Game);
        assert_eq!(req.subject, Subject::Science);
        assert_eq!(req.topic, "Plants");
        assert_eq!(req.profile.accommodation, AccommodationTag::Adhd);
        assert_eq!(req.profile.age_band(), AgeBand::Middle);
    }

    #[test]
    fn rejects_blank_topic() {
        let err = GenerationRequest::normalize(raw("   ", "game")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = GenerationRequest::normalize(raw("Plants", "arcade")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_unknown_subject() {
        let mut r = raw("Plants", "quiz");
        r.subject = "alchemy".to_string();
        let err = GenerationRequest::normalize(r).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_out_of_range_age() {
        for age in [0, 19, -3] {
            let mut r = raw("Plants", "lesson");
            r.age = age;
            let err = GenerationRequest::normalize(r).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidRequest(_)));
        }
    }

    #[test]
    fn explain_is_an_alias_for_lesson() {
        let req = GenerationRequest::normalize(raw("Plants", "explain")).unwrap();
        assert_eq!(req.mode, ArtifactMode::Lesson);
    }

    #[test]
    fn accommodation_free_text_is_preserved() {
        let mut r = raw("Plants", "chat");
        r.accommodation = "dyslexia".to_string();
        let req = GenerationRequest::normalize(r).unwrap();
        assert_eq!(
            req.profile.accommodation,
            AccommodationTag::Other("dyslexia".to_string())
        );
    }

    #[test]
    fn age_bands_cover_all_ages() {
        let profile = |age| LearnerProfile {
            name: String::new(),
            age,
            accommodation: AccommodationTag::None,
        };
        assert_eq!(profile(4).age_band(), AgeBand::Early);
        assert_eq!(profile(6).age_band(), AgeBand::Early);
        assert_eq!(profile(7).age_band(), AgeBand::Middle);
        assert_eq!(profile(10).age_band(), AgeBand::Middle);
        assert_eq!(profile(11).age_band(), AgeBand::Upper);
        assert_eq!(profile(18).age_band(), AgeBand::Upper);
    }
}

//! The staged generation pipeline: normalize, prompt, invoke, validate,
//! compile.
//!
//! Each stage hands off to the next through typed values; nothing downstream
//! of validation ever sees raw service text. The pipeline never retries --
//! retry with backoff is the caller's policy decision.

use crate::compiler::{self, RuntimeBundle};
use crate::design::{self, ArtifactDesign, GameDesign, LessonDesign, QuizQuestion};
use crate::error::PipelineError;
use crate::llm_client::ReasoningClient;
use crate::prompt;
use crate::request::{ArtifactMode, GenerationRequest, LearnerProfile};
use std::sync::Arc;
use tracing::{info, instrument};

/// The pipeline's output for one request.
#[derive(Debug, Clone)]
pub enum GeneratedArtifact {
    /// A game design together with its compiled, executable bundle.
    Game {
        design: GameDesign,
        bundle: RuntimeBundle,
    },
    Quiz(Vec<QuizQuestion>),
    Lesson(LessonDesign),
    Chat(String),
}

/// Runs validated requests through the full generation pipeline.
pub struct ArtifactGenerator {
    client: Arc<dyn ReasoningClient>,
}

impl ArtifactGenerator {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    /// Generates one artifact from an already-normalized request.
    ///
    /// Game designs are compiled before anything is returned, so a caller
    /// holding a `GeneratedArtifact::Game` always has a bundle that passed
    /// the validate-then-compile boundary.
    #[instrument(skip(self, request), fields(mode = %request.mode, topic = %request.topic))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let instruction = prompt::build_instruction(request);
        let raw = self.client.complete(&instruction).await?;
        let artifact = match design::validate_reply(request.mode, &raw)? {
            ArtifactDesign::Game(game) => {
                let bundle = compiler::compile(&game)?;
                GeneratedArtifact::Game {
                    design: game,
                    bundle,
                }
            }
            ArtifactDesign::Quiz(questions) => GeneratedArtifact::Quiz(questions),
            ArtifactDesign::Lesson(lesson) => GeneratedArtifact::Lesson(lesson),
            ArtifactDesign::Chat(text) => GeneratedArtifact::Chat(text),
        };
        info!("artifact generated");
        Ok(artifact)
    }

    /// Single-turn text generation for an ad hoc prompt.
    pub async fn generate_text(
        &self,
        user_prompt: &str,
        profile: &LearnerProfile,
    ) -> Result<String, PipelineError> {
        if user_prompt.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        let instruction = prompt::text_instruction(user_prompt, profile);
        let raw = self.client.complete(&instruction).await?;
        match design::validate_reply(ArtifactMode::Chat, &raw)? {
            ArtifactDesign::Chat(text) => Ok(text),
            _ => unreachable!("chat validation only yields chat designs"),
        }
    }
}

//! Transport to the external reasoning service.
//!
//! This stage has no knowledge of artifact schemas; it sends an instruction
//! and returns the raw text reply. Failures are surfaced unmodified as
//! `ServiceUnavailable` or `ServiceRejected` -- retries, if any, belong to
//! the caller.

use crate::conversation::{ChatEntry, ChatRole};
use crate::error::PipelineError;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// A generic client for the reasoning service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Sends a single instruction and returns the raw text reply.
    async fn complete(&self, instruction: &str) -> Result<String, PipelineError>;

    /// Sends a full conversation transcript and returns the raw text reply.
    /// The leading system entry is always included.
    async fn chat(&self, entries: &[ChatEntry]) -> Result<String, PipelineError>;
}

/// An implementation of `ReasoningClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL for the service.
    /// * `model` - Model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    async fn create(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, PipelineError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(4000u32)
            .build()
            .map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                PipelineError::ServiceRejected("reply carried no text content".to_string())
            })?;

        Ok(content)
    }
}

/// Network-level failures mean the service could not be reached; everything
/// else is a service-side rejection.
fn map_openai_error(err: OpenAIError) -> PipelineError {
    match err {
        OpenAIError::Reqwest(e) => PipelineError::ServiceUnavailable(e.to_string()),
        other => PipelineError::ServiceRejected(other.to_string()),
    }
}

fn to_request_message(entry: &ChatEntry) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    Ok(match entry.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(entry.content.clone())
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(entry.content.clone())
            .build()?
            .into(),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(entry.content.clone())
            .build()?
            .into(),
    })
}

#[async_trait]
impl ReasoningClient for OpenAICompatibleClient {
    async fn complete(&self, instruction: &str) -> Result<String, PipelineError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(instruction.to_string())
            .build()
            .map_err(map_openai_error)?
            .into();
        self.create(vec![message]).await
    }

    async fn chat(&self, entries: &[ChatEntry]) -> Result<String, PipelineError> {
        let messages = entries
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_openai_error)?;
        self.create(messages).await
    }
}

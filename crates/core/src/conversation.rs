//! Multi-turn conversation state and orchestration.
//!
//! The conversation is an explicit append-only log, replayed in full on
//! every turn rather than relying on any server-side session memory. The
//! leading system entry primes the coach persona; it is resent every turn
//! but never shown to the user. Message count only ever grows: a failed turn
//! appends a fixed fallback assistant message instead of rolling back.

use crate::llm_client::ReasoningClient;
use crate::prompt;
use crate::request::LearnerProfile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Shown in place of an assistant reply when a turn fails for any reason.
pub const FALLBACK_REPLY: &str =
    "Hmm, I got a little mixed up there. Could you say that again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

impl ChatEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The append-only conversation log. The first entry is always the system
/// priming message; it is fixed at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    entries: Vec<ChatEntry>,
}

impl ConversationState {
    fn new(priming: String) -> Self {
        Self {
            entries: vec![ChatEntry::system(priming)],
        }
    }

    /// Every entry, system priming included, in order.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Entries suitable for display: everything except the system priming.
    pub fn visible_entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.role != ChatRole::System)
    }

    fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }
}

/// Drives a coaching conversation with the reasoning service.
pub struct ConversationOrchestrator {
    client: Arc<dyn ReasoningClient>,
    state: ConversationState,
}

impl ConversationOrchestrator {
    /// Starts a session: synthesizes the system priming entry and runs one
    /// pipeline turn to get the opening assistant message.
    pub async fn open(client: Arc<dyn ReasoningClient>, profile: &LearnerProfile) -> Self {
        let mut orchestrator = Self {
            client,
            state: ConversationState::new(prompt::conversation_priming(profile)),
        };
        let reply = orchestrator.invoke().await;
        orchestrator.state.push(ChatEntry::assistant(reply));
        orchestrator
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The most recent assistant message. `open` guarantees at least one.
    pub fn last_reply(&self) -> &str {
        self.state
            .entries
            .iter()
            .rev()
            .find(|entry| entry.role == ChatRole::Assistant)
            .map(|entry| entry.content.as_str())
            .unwrap_or(FALLBACK_REPLY)
    }

    /// Runs one user turn: appends the user entry, resends the entire log,
    /// appends the assistant reply. Never rolls back on failure.
    pub async fn say(&mut self, text: &str) -> &str {
        self.state.push(ChatEntry::user(text));
        let reply = self.invoke().await;
        self.state.push(ChatEntry::assistant(reply));
        self.last_reply()
    }

    async fn invoke(&self) -> String {
        match self.client.chat(self.state.entries()).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!("conversation turn returned an empty reply, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                warn!(error = %e, "conversation turn failed, using fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm_client::MockReasoningClient;
    use crate::request::AccommodationTag;

    fn profile() -> LearnerProfile {
        LearnerProfile {
            name: "Mia".to_string(),
            age: 8,
            accommodation: AccommodationTag::None,
        }
    }

    #[tokio::test]
    async fn open_produces_an_opening_assistant_entry() {
        let mut client = MockReasoningClient::new();
        client
            .expect_chat()
            .times(1)
            .returning(|_| Ok("Hi Mia! What should we explore today?".to_string()));

        let orchestrator = ConversationOrchestrator::open(Arc::new(client), &profile()).await;

        // Only the system entry preceded the opening turn.
        let entries = orchestrator.state().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, ChatRole::System);
        assert_eq!(entries[1].role, ChatRole::Assistant);
        assert_eq!(
            orchestrator.last_reply(),
            "Hi Mia! What should we explore today?"
        );
    }

    #[tokio::test]
    async fn say_resends_the_entire_state_including_the_system_entry() {
        let mut client = MockReasoningClient::new();
        client
            .expect_chat()
            .withf(|entries: &[ChatEntry]| entries.first().map(|e| e.role) == Some(ChatRole::System))
            .times(2)
            .returning(|_| Ok("reply".to_string()));

        let mut orchestrator = ConversationOrchestrator::open(Arc::new(client), &profile()).await;
        orchestrator.say("tell me about plants").await;

        let entries = orchestrator.state().entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2], ChatEntry::user("tell me about plants"));
        assert_eq!(entries[3].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn failed_turn_appends_the_fallback_instead_of_breaking_the_log() {
        let mut client = MockReasoningClient::new();
        let mut calls = 0;
        client.expect_chat().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok("Welcome!".to_string())
            } else {
                Err(PipelineError::ServiceUnavailable("down".to_string()))
            }
        });

        let mut orchestrator = ConversationOrchestrator::open(Arc::new(client), &profile()).await;
        let reply = orchestrator.say("hello?").await.to_string();

        assert_eq!(reply, FALLBACK_REPLY);
        // Log grew by exactly two entries: user then fallback assistant.
        assert_eq!(orchestrator.state().entries().len(), 4);
    }

    #[tokio::test]
    async fn system_entry_is_hidden_from_display() {
        let mut client = MockReasoningClient::new();
        client
            .expect_chat()
            .returning(|_| Ok("hi".to_string()));

        let orchestrator = ConversationOrchestrator::open(Arc::new(client), &profile()).await;
        assert!(
            orchestrator
                .state()
                .visible_entries()
                .all(|entry| entry.role != ChatRole::System)
        );
    }
}

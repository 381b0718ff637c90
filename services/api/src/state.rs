//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the generation pipeline and the transcription
//! provider.

use crate::config::Config;
use sprout_core::{
    llm_client::ReasoningClient, pipeline::ArtifactGenerator,
    voice::transcribe::TranscriptionProvider,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ArtifactGenerator>,
    pub reasoning: Arc<dyn ReasoningClient>,
    /// `None` when no transcription key is configured; `/transcribe` then
    /// reports the capability unavailable.
    pub transcriber: Option<Arc<dyn TranscriptionProvider>>,
    pub config: Arc<Config>,
}

//! Error taxonomy for the generation pipeline.
//!
//! Every stage boundary translates lower-level failures into one of these
//! kinds before crossing into another component. Raw transport errors never
//! reach display logic.

use crate::request::ArtifactMode;

/// Failures that can occur between accepting a generation request and
/// producing a runtime bundle.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The caller's input was defective. Not retryable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The reasoning service could not be reached (network failure or
    /// timeout). The caller may retry with backoff; the pipeline never does.
    #[error("reasoning service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The reasoning service answered with a service-side error.
    #[error("reasoning service rejected the request: {0}")]
    ServiceRejected(String),

    /// The service reply could not be parsed as structured data.
    #[error("reasoning service reply was not parseable: {0}")]
    MalformedResponse(String),

    /// The reply parsed, but required fields for the requested mode were
    /// missing or of the wrong shape.
    #[error("reply violated the {mode} schema: {detail}")]
    SchemaViolation { mode: ArtifactMode, detail: String },

    /// Structural injection could not satisfy the bundle skeleton. Internal
    /// invariant violation, fatal for the request.
    #[error("artifact compilation failed: {0}")]
    CompilationError(String),
}

impl PipelineError {
    /// Shorthand for a schema violation on the given mode.
    pub fn schema(mode: ArtifactMode, detail: impl Into<String>) -> Self {
        Self::SchemaViolation {
            mode,
            detail: detail.into(),
        }
    }
}

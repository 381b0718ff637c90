pub mod bridge;
pub mod compiler;
pub mod conversation;
pub mod design;
pub mod error;
pub mod llm_client;
pub mod pipeline;
pub mod prompt;
pub mod quiz;
pub mod request;
pub mod voice;

pub use error::PipelineError;

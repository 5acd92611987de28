//! Convenience re-exports for common use.

pub use crate::config::StudioConfig;
pub use crate::error::{LlmError, Result};
pub use crate::provider::{LocalLlm, OllamaClient};
pub use crate::session::ChatSession;
pub use crate::stream::{
    read_stream, Completion, FrameShape, IncrementalChunk, PullProgress, StreamOutcome,
};
pub use crate::types::{
    ChatMessage, ChatRequest, GenerateRequest, GenerationOptions, LocalModel, Role,
};

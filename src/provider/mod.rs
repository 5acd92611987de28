//! Local model provider trait and the Ollama implementation.

pub mod http;
pub mod ollama;

pub use ollama::OllamaClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::stream::PullProgress;
use crate::types::{ChatRequest, GenerateRequest, LocalModel};

/// Core operations of a local inference server.
///
/// Callbacks run synchronously between transport reads, in arrival order.
#[async_trait]
pub trait LocalLlm: Send + Sync {
    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Models installed on the server.
    async fn list_models(&self) -> Result<Vec<LocalModel>>;

    /// Stream a free-form completion; returns the full text.
    async fn generate(
        &self,
        request: &GenerateRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String>;

    /// Stream one assistant turn; returns the full reply.
    async fn chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String>;

    /// Download a model, reporting progress.
    async fn pull_model(
        &self,
        name: &str,
        on_progress: &mut (dyn for<'a> FnMut(&'a PullProgress) + Send),
    ) -> Result<()>;
}

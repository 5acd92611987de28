//! studio-llm: local LLM client for the creator studio.
//!
//! Talks to a local Ollama server and consumes its streamed,
//! newline-delimited JSON responses: free-form generation, chat turns and
//! model downloads. Text arrives through a callback as it is generated.
//!
//! # Quick Start
//!
//! ```no_run
//! use studio_llm::prelude::*;
//!
//! # async fn example() -> studio_llm::error::Result<()> {
//! let config = StudioConfig::from_env()?;
//! let client = OllamaClient::from_config(&config)?;
//!
//! if !client.is_available().await {
//!     eprintln!("start Ollama first");
//!     return Ok(());
//! }
//!
//! let script = client
//!     .generate(&GenerateRequest::prompt("A 60-second script about cold brew"), |t| print!("{t}"))
//!     .await?;
//! println!("\n{} characters", script.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod stream;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn public_types_are_send_sync() {
        assert_send_sync::<provider::OllamaClient>();
        assert_send_sync::<config::StudioConfig>();
        assert_send_sync::<error::LlmError>();
        assert_send_sync::<stream::StreamOutcome>();
        assert_send_sync::<stream::IncrementalChunk>();
        assert_send_sync::<session::ChatSession>();
    }
}

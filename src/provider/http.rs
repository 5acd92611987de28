//! Shared HTTP client construction and status mapping.

use std::time::Duration;

use crate::error::{LlmError, Result};

/// Build the pooled HTTP client.
///
/// Only connection establishment is bounded: a generation or a model pull
/// may legitimately stream for many minutes.
pub fn build_client(connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a non-2xx response to an error, unwrapping Ollama's
/// `{"error": "..."}` body when present.
pub fn status_to_error(status: u16, body: &str) -> LlmError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        404 => LlmError::ModelNotFound(message),
        _ => LlmError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

//! Error types for studio-llm.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all local LLM operations.
///
/// Malformed stream lines never show up here: the reader discards them.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server could not be reached at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// An `error` field reported inside a streamed frame, verbatim.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Map a reqwest error raised while establishing a request.
    ///
    /// Connect failures become [`LlmError::Connection`] so callers can tell
    /// "server unreachable" apart from other network trouble.
    pub fn from_send(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(timeout.as_millis() as u64)
        } else {
            Self::Network(err)
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(e) if e.is_decode() => ErrorCategory::Serialization,
            Self::Connection(_) | Self::Network(_) => ErrorCategory::Transport,
            Self::Upstream(_) => ErrorCategory::Upstream,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::InvalidArgument(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::ModelNotFound(_) => ErrorCategory::Api,
            Self::Api { status, .. } => match status {
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the connection to the server failed, as opposed to the server
    /// answering with an error.
    pub fn is_transport_failure(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Transport => RecoverySuggestion::CheckServerRunning,
            ErrorCategory::Upstream => RecoverySuggestion::ShowServerMessage,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Api => match self {
                Self::ModelNotFound(_) => RecoverySuggestion::PullModel,
                _ => RecoverySuggestion::ShowServerMessage,
            },
            ErrorCategory::Cancelled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ReportBug,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_kept_verbatim() {
        let err = LlmError::Upstream("disk full".to_string());
        assert_eq!(err.to_string(), "Upstream error: disk full");
        assert!(!err.is_retryable());
        assert_eq!(err.recovery_suggestion(), RecoverySuggestion::ShowServerMessage);
    }

    #[test]
    fn connection_failure_is_transport() {
        let err = LlmError::Connection("refused".to_string());
        assert!(err.is_transport_failure());
        assert!(err.is_retryable());
        assert_eq!(err.recovery_suggestion(), RecoverySuggestion::CheckServerRunning);
    }

    #[test]
    fn missing_model_suggests_pull() {
        let err = LlmError::ModelNotFound("llama3.2".to_string());
        assert_eq!(err.category(), ErrorCategory::Api);
        assert_eq!(err.recovery_suggestion(), RecoverySuggestion::PullModel);
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        assert!(LlmError::api(503, "loading").is_retryable());
        assert!(!LlmError::api(400, "bad request").is_retryable());
    }
}

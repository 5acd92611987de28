//! Error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Server unreachable or connection dropped.
    Transport,
    /// The server reported an error inside the stream.
    Upstream,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Cancelled,
    Unknown,
}

/// Suggested recovery action, surfaced by callers as a UI affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Offer a retry and remind the user to start the local server.
    CheckServerRunning,
    /// Display the server-provided message.
    ShowServerMessage,
    RetryWithBackoff,
    IncreaseTimeout,
    CheckConfiguration,
    PullModel,
    ReportBug,
    None,
}

impl RecoverySuggestion {
    /// Short user-facing hint, if there is anything useful to say.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::CheckServerRunning => Some("is Ollama running? try `ollama serve`"),
            Self::RetryWithBackoff => Some("the server is busy, try again in a moment"),
            Self::IncreaseTimeout => Some("raise STUDIO_LLM_CONNECT_TIMEOUT_SECS"),
            Self::CheckConfiguration => Some("check ~/.studio-llm/config.toml and STUDIO_LLM_* variables"),
            Self::PullModel => Some("download it first with `studio-llm pull <model>`"),
            Self::ShowServerMessage | Self::ReportBug | Self::None => None,
        }
    }
}

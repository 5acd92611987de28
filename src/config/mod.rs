//! Configuration system (layered: code > env > config file > defaults).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{LlmError, Result};
use crate::util::retry::RetryPolicy;

/// Default local Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CONFIG_FILE_NAME: &str = "config.toml";

/// Runtime configuration for the local LLM client.
///
/// Resolution order, highest first:
/// 1. Values set in code (`with_*`)
/// 2. Environment variables (a `.env` file is loaded if present)
/// 3. `~/.studio-llm/config.toml`
/// 4. Built-in defaults
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub base_url: String,
    pub model: String,
    /// Applies to establishing the connection only; streams may run long.
    pub connect_timeout: Duration,
    /// Bound for non-streaming calls (model listing, deletion).
    pub request_timeout: Duration,
    /// How long the server keeps the model loaded, e.g. `"5m"`.
    pub keep_alive: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            keep_alive: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// On-disk form of the config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub keep_alive: Option<String>,
    pub retry_attempts: Option<u32>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| LlmError::Configuration(format!("invalid config file: {e}")))
    }

    /// Read a config file; a missing file yields an empty config.
    pub fn read(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(LlmError::Io(err)),
        }
    }
}

impl StudioConfig {
    /// Load defaults, the default config file, then the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(default_config_path().as_deref())
    }

    /// Like [`StudioConfig::from_env`] with an explicit config file path.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        if let Some(path) = path {
            config.apply_file(FileConfig::read(path)?);
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        tracing::debug!(base_url = %config.base_url, model = %config.model, "resolved config");
        Ok(config)
    }

    /// Overlay values from a parsed config file.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(url) = file.base_url {
            self.base_url = normalize_base_url(&url);
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if file.keep_alive.is_some() {
            self.keep_alive = file.keep_alive;
        }
        if let Some(attempts) = file.retry_attempts {
            self.retry.max_attempts = attempts.max(1);
        }
    }

    /// Overlay values from environment variables, read through `lookup`.
    ///
    /// `OLLAMA_BASE_URL` wins over `OLLAMA_HOST`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("OLLAMA_BASE_URL").or_else(|| lookup("OLLAMA_HOST")) {
            self.base_url = normalize_base_url(&url);
        }
        if let Some(model) = lookup("STUDIO_LLM_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("STUDIO_LLM_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout = parse_secs("STUDIO_LLM_CONNECT_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("STUDIO_LLM_REQUEST_TIMEOUT_SECS") {
            self.request_timeout = parse_secs("STUDIO_LLM_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(keep_alive) = lookup("STUDIO_LLM_KEEP_ALIVE") {
            self.keep_alive = Some(keep_alive);
        }
        Ok(())
    }

    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(url.as_ref());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<Duration> {
    raw.trim().parse().map(Duration::from_secs).map_err(|_| {
        LlmError::Configuration(format!("{var} must be a whole number of seconds, got '{raw}'"))
    })
}

/// `~/.studio-llm/config.toml`, if a home directory can be found.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".studio-llm").join(CONFIG_FILE_NAME))
}

/// Trim trailing slashes and add `http://` when no scheme is given, so
/// `OLLAMA_HOST=127.0.0.1:11434` works as-is.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

//! Ollama HTTP client.
//!
//! Streaming endpoints (`/api/generate`, `/api/chat`, `/api/pull`) answer with
//! NDJSON bodies that are handed to [`read_stream`] once the status is known
//! to be 2xx.
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md>

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::http::{build_client, status_to_error};
use super::LocalLlm;
use crate::config::StudioConfig;
use crate::error::{LlmError, Result};
use crate::stream::{read_stream, Completion, FrameShape, IncrementalChunk, PullProgress, StreamOutcome};
use crate::types::model::{TagsResponse, VersionResponse};
use crate::types::{ChatRequest, GenerateRequest, LocalModel};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// Client for a local Ollama server.
///
/// Cheap to clone; clones share one connection pool. Every call owns its own
/// stream buffer and accumulator, so calls may run concurrently.
///
/// ```no_run
/// use studio_llm::provider::OllamaClient;
/// use studio_llm::types::GenerateRequest;
///
/// # async fn example() -> studio_llm::error::Result<()> {
/// let client = OllamaClient::new("http://localhost:11434")?;
/// let text = client
///     .generate(&GenerateRequest::prompt("Three title ideas for a baking vlog"), |t| print!("{t}"))
///     .await?;
/// # let _ = text;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    keep_alive: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl OllamaClient {
    /// Client with default settings against `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(&StudioConfig::default().with_base_url(base_url))
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(LlmError::Configuration("default model must not be empty".into()));
        }
        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            keep_alive: config.keep_alive.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            retry: config.retry.clone(),
            http: build_client(config.connect_timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Whether the server answers at all. Never errors.
    pub async fn is_available(&self) -> bool {
        let probe = self.get_json::<TagsResponse>("/api/tags");
        match with_timeout(self.connect_timeout, probe).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(base_url = %self.base_url, error = %e, "local LLM server unavailable");
                false
            }
        }
    }

    /// Server version string, e.g. `"0.5.7"`.
    pub async fn version(&self) -> Result<String> {
        let response: VersionResponse = self.get_json("/api/version").await?;
        Ok(response.version)
    }

    pub async fn list_models(&self) -> Result<Vec<LocalModel>> {
        let tags: TagsResponse = self.get_json("/api/tags").await?;
        Ok(tags.models)
    }

    /// Remove a model from the server.
    pub async fn delete_model(&self, name: &str) -> Result<()> {
        let name = require_model_name(name)?;
        let url = self.endpoint("/api/delete");
        let body = serde_json::json!({ "model": name, "name": name });
        tracing::debug!(url = %url, model = %name, "deleting model");

        let request = async {
            let response = self
                .http
                .delete(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::from_send(e, self.connect_timeout))?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(status_to_error(status.as_u16(), &text));
            }
            Ok(())
        };
        with_timeout(self.request_timeout, request).await
    }

    /// Stream a completion from `/api/generate`, calling `on_text` per chunk.
    pub async fn generate<F>(&self, request: &GenerateRequest, mut on_text: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let never = CancellationToken::new();
        let outcome = self
            .generate_with_cancel(request, &never, |t| on_text(t))
            .await?;
        Ok(outcome.text)
    }

    /// Like [`OllamaClient::generate`], stopping early when `cancel` fires.
    pub async fn generate_with_cancel<F>(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
        on_text: F,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(&str),
    {
        let body = self.stream_body(request)?;
        self.stream_text("/api/generate", body, FrameShape::Generate, cancel, on_text)
            .await
    }

    /// Stream one assistant turn from `/api/chat`.
    pub async fn chat<F>(&self, request: &ChatRequest, mut on_text: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let never = CancellationToken::new();
        let outcome = self
            .chat_with_cancel(request, &never, |t| on_text(t))
            .await?;
        Ok(outcome.text)
    }

    /// Like [`OllamaClient::chat`], stopping early when `cancel` fires.
    pub async fn chat_with_cancel<F>(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        on_text: F,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(&str),
    {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidArgument("chat request has no messages".into()));
        }
        let body = self.stream_body(request)?;
        self.stream_text("/api/chat", body, FrameShape::Chat, cancel, on_text)
            .await
    }

    /// Download `name` through `/api/pull`, reporting progress.
    pub async fn pull_model<F>(&self, name: &str, on_progress: F) -> Result<()>
    where
        F: FnMut(&PullProgress),
    {
        self.pull_model_with_cancel(name, &CancellationToken::new(), on_progress)
            .await
    }

    /// Like [`OllamaClient::pull_model`]. A cancelled pull is an error: a
    /// partially downloaded model is not a success.
    pub async fn pull_model_with_cancel<F>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<()>
    where
        F: FnMut(&PullProgress),
    {
        let name = require_model_name(name)?;
        let body = serde_json::json!({ "model": name, "name": name, "stream": true });
        let response = self.open_stream("/api/pull", &body).await?;

        let outcome = read_stream(
            response.bytes_stream(),
            FrameShape::Pull,
            cancel,
            |chunk: &IncrementalChunk| {
                if let Some(progress) = chunk.as_progress() {
                    on_progress(progress);
                }
            },
        )
        .await?;

        match outcome.completion {
            Completion::Cancelled => Err(LlmError::Cancelled),
            Completion::Done | Completion::EndOfStream => {
                tracing::debug!(model = %name, updates = outcome.chunks, "model pull finished");
                Ok(())
            }
        }
    }

    async fn stream_text<F>(
        &self,
        path: &str,
        body: Value,
        shape: FrameShape,
        cancel: &CancellationToken,
        mut on_text: F,
    ) -> Result<StreamOutcome>
    where
        F: FnMut(&str),
    {
        let response = self.open_stream(path, &body).await?;
        read_stream(response.bytes_stream(), shape, cancel, |chunk: &IncrementalChunk| {
            if let Some(text) = chunk.as_text() {
                on_text(text);
            }
        })
        .await
    }

    /// Serialize a request, filling in the default model and keep-alive,
    /// and force streaming on.
    fn stream_body<T: Serialize>(&self, request: &T) -> Result<Value> {
        let mut body = serde_json::to_value(request)?;
        let Some(map) = body.as_object_mut() else {
            return Err(LlmError::InvalidArgument("request must serialize to an object".into()));
        };
        if !map.get("model").is_some_and(|m| m.as_str().is_some_and(|s| !s.is_empty())) {
            map.insert("model".into(), Value::String(self.model.clone()));
        }
        if let (false, Some(keep_alive)) = (map.contains_key("keep_alive"), &self.keep_alive) {
            map.insert("keep_alive".into(), Value::String(keep_alive.clone()));
        }
        map.insert("stream".into(), Value::Bool(true));
        Ok(body)
    }

    /// POST and validate the status before any body byte is read. Retried
    /// per the configured policy; nothing has been dispatched yet.
    async fn open_stream(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let url = self.endpoint(path);
        let url = &url;
        tracing::debug!(url = %url, model = %body["model"], "opening NDJSON stream");

        self.retry
            .execute(|| async move {
                let response = self
                    .http
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| LlmError::from_send(e, self.connect_timeout))?;
                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(status_to_error(status.as_u16(), &text));
                }
                Ok(response)
            })
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let url = &url;
        let request = self.retry.execute(|| async move {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| LlmError::from_send(e, self.connect_timeout))?;
            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(status_to_error(status.as_u16(), &text));
            }
            Ok(serde_json::from_str(&text)?)
        });
        with_timeout(self.request_timeout, request).await
    }
}

fn require_model_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LlmError::InvalidArgument("model name must not be empty".into()));
    }
    Ok(name)
}

#[async_trait]
impl LocalLlm for OllamaClient {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<LocalModel>> {
        OllamaClient::list_models(self).await
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        OllamaClient::generate(self, request, |t| on_text(t)).await
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        OllamaClient::chat(self, request, |t| on_text(t)).await
    }

    async fn pull_model(
        &self,
        name: &str,
        on_progress: &mut (dyn for<'a> FnMut(&'a PullProgress) + Send),
    ) -> Result<()> {
        OllamaClient::pull_model(self, name, |p| on_progress(p)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, GenerationOptions};

    fn client() -> OllamaClient {
        OllamaClient::from_config(
            &StudioConfig::default()
                .with_base_url("http://localhost:9999/")
                .with_model("mistral")
                .with_keep_alive("5m"),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(client().endpoint("/api/chat"), "http://localhost:9999/api/chat");
    }

    #[test]
    fn stream_body_fills_defaults() {
        let body = client().stream_body(&GenerateRequest::prompt("hi")).unwrap();
        assert_eq!(body["model"], "mistral");
        assert_eq!(body["keep_alive"], "5m");
        assert_eq!(body["stream"], true);
        assert_eq!(body["prompt"], "hi");
    }

    #[test]
    fn stream_body_keeps_explicit_values() {
        let request = ChatRequest::builder()
            .model("qwen2.5")
            .messages(vec![ChatMessage::user("hi")])
            .keep_alive("0")
            .options(GenerationOptions::builder().seed(7).build())
            .build();
        let body = client().stream_body(&request).unwrap();
        assert_eq!(body["model"], "qwen2.5");
        assert_eq!(body["keep_alive"], "0");
        assert_eq!(body["options"]["seed"], 7);
    }

    #[test]
    fn empty_default_model_is_rejected() {
        let err = OllamaClient::from_config(&StudioConfig::default().with_model(" ")).unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[test]
    fn blank_model_names_are_rejected() {
        assert!(require_model_name("  ").is_err());
        assert_eq!(require_model_name(" llama3.2 ").unwrap(), "llama3.2");
    }
}

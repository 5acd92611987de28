//! Generation requests and sampling options.

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Sampling options, sent as Ollama's `options` object.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum number of tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    /// Context window size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl GenerationOptions {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A free-form completion request for `/api/generate`.
///
/// ```
/// use studio_llm::types::{GenerateRequest, GenerationOptions};
///
/// let request = GenerateRequest::builder()
///     .prompt("Write a 30-second hook about sourdough")
///     .system("You write short-form video scripts.")
///     .options(GenerationOptions::builder().temperature(0.7).build())
///     .build();
/// assert!(request.model.is_none());
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    /// Falls back to the client's default model when `None`.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[builder(into)]
    pub prompt: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Base64-encoded images.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "GenerationOptions::is_empty")]
    pub options: GenerationOptions,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl GenerateRequest {
    /// Shorthand for a bare prompt with default settings.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::builder().prompt(prompt).build()
    }

    /// Attach raw image bytes; they are base64-encoded for the wire.
    pub fn with_image(mut self, bytes: &[u8]) -> Self {
        self.images.push(super::encode_image(bytes));
        self
    }
}

/// A multi-turn chat request for `/api/chat`.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Falls back to the client's default model when `None`.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "GenerationOptions::is_empty")]
    pub options: GenerationOptions,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self::builder().messages(messages).build()
    }
}

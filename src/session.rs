//! Multi-turn chat on top of any [`LocalLlm`].

use std::sync::Arc;

use crate::error::Result;
use crate::provider::LocalLlm;
use crate::types::{ChatMessage, ChatRequest, GenerationOptions};

/// A conversation whose history is resent with every turn.
///
/// A turn only lands in the history once the reply finished; a failed turn
/// leaves the history exactly as it was.
pub struct ChatSession {
    llm: Arc<dyn LocalLlm>,
    model: Option<String>,
    system: Option<String>,
    options: GenerationOptions,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LocalLlm>) -> Self {
        Self {
            llm,
            model: None,
            system: None,
            options: GenerationOptions::default(),
            history: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Model this session talks to.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.llm.default_model())
    }

    /// Completed turns, oldest first. The system prompt is not included.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Forget all turns; the system prompt stays.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send a user turn, streaming the reply through `on_text`.
    pub async fn send<F>(&mut self, prompt: impl Into<String>, mut on_text: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let user = ChatMessage::user(prompt);
        let request = self.request_with(user.clone());
        tracing::debug!(model = %self.model(), turns = self.history.len() / 2, "sending chat turn");

        let reply = self.llm.chat(&request, &mut on_text).await?;

        self.history.push(user);
        self.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    fn request_with(&self, next: ChatMessage) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(next);

        ChatRequest {
            model: self.model.clone(),
            messages,
            options: self.options.clone(),
            keep_alive: None,
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.model)
            .field("system", &self.system)
            .field("turns", &(self.history.len() / 2))
            .finish()
    }
}

//! Shared test helpers and mock LLM.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, Stream};

use studio_llm::error::{LlmError, Result};
use studio_llm::provider::LocalLlm;
use studio_llm::stream::PullProgress;
use studio_llm::types::{ChatRequest, GenerateRequest, LocalModel};

/// A byte stream that yields each piece as one transport chunk.
pub fn byte_chunks(pieces: &[&str]) -> impl Stream<Item = Result<Vec<u8>>> {
    let owned: Vec<Result<Vec<u8>>> = pieces.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
    stream::iter(owned)
}

/// NDJSON body for `/api/generate` with the given text pieces, ending in a
/// `done` frame.
pub fn generate_body(pieces: &[&str]) -> String {
    let mut body = String::new();
    for piece in pieces {
        body.push_str(&serde_json::json!({"model": "llama3.2", "response": piece, "done": false}).to_string());
        body.push('\n');
    }
    body.push_str(r#"{"model":"llama3.2","response":"","done":true,"done_reason":"stop"}"#);
    body.push('\n');
    body
}

/// NDJSON body for `/api/chat`.
pub fn chat_body(pieces: &[&str]) -> String {
    let mut body = String::new();
    for piece in pieces {
        body.push_str(
            &serde_json::json!({
                "model": "llama3.2",
                "message": {"role": "assistant", "content": piece},
                "done": false
            })
            .to_string(),
        );
        body.push('\n');
    }
    body.push_str(r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true}"#);
    body.push('\n');
    body
}

enum Reply {
    Text(Vec<String>),
    Failure(String),
}

/// A mock LLM that replays queued replies and records chat requests.
pub struct MockLlm {
    model: String,
    replies: Mutex<Vec<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlm {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            replies: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply streamed as the given pieces.
    pub fn queue_reply(&self, pieces: &[&str]) {
        self.replies
            .lock()
            .unwrap()
            .push(Reply::Text(pieces.iter().map(|p| p.to_string()).collect()));
    }

    /// Queue an upstream failure.
    pub fn queue_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push(Reply::Failure(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, on_text: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::Upstream("no queued reply".into()));
        }
        match replies.remove(0) {
            Reply::Text(pieces) => {
                for piece in &pieces {
                    on_text(piece);
                }
                Ok(pieces.concat())
            }
            Reply::Failure(message) => Err(LlmError::Upstream(message)),
        }
    }
}

#[async_trait]
impl LocalLlm for MockLlm {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<LocalModel>> {
        Ok(Vec::new())
    }

    async fn generate(
        &self,
        _request: &GenerateRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        self.next_reply(on_text)
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply(on_text)
    }

    async fn pull_model(
        &self,
        _name: &str,
        _on_progress: &mut (dyn for<'a> FnMut(&'a PullProgress) + Send),
    ) -> Result<()> {
        Ok(())
    }
}

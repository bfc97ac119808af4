//! ChatProvider trait - the abstraction over the language-model runtime.
//!
//! A provider sends an ordered list of role-tagged messages as one
//! non-streaming chat completion and returns the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::message::Message;

/// A single chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "llama2")
    pub model: String,

    /// The conversation messages, in order
    pub messages: Vec<Message>,

    /// Sampling temperature; the runtime default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message
    pub message: Message,

    /// Which model actually responded
    pub model: String,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ChatRequest) -> std::result::Result<ChatResponse, GenerationError>;

    /// List models the runtime has available.
    async fn list_models(&self) -> std::result::Result<Vec<String>, GenerationError> {
        Ok(Vec::new())
    }

    /// Health check - can we reach the runtime?
    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        Ok(true)
    }
}

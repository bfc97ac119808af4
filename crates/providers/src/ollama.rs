//! Ollama provider implementation.
//!
//! Uses Ollama's native API:
//! - `POST /api/chat` - non-streaming chat completion
//! - `GET  /api/tags` - model listing and health checks

use async_trait::async_trait;
use ragchat_config::LlmConfig;
use ragchat_core::error::GenerationError;
use ragchat_core::message::{Message, Role};
use ragchat_core::provider::{ChatProvider, ChatRequest, ChatResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A local (or remote) Ollama runtime.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for the runtime at `base_url` (e.g. `http://127.0.0.1:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.base_url)
    }

    /// Convert our Message types to Ollama's wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_wire().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });

        if let Some(temperature) = request.temperature {
            body["options"] = serde_json::json!({ "temperature": temperature });
        }

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(model = %request.model, body = %error_body, "Model not found");
            return Err(GenerationError::ModelNotFound(request.model));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model runtime returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: api_response.message.content,
            timestamp: Some(chrono::Utc::now()),
        };

        Ok(ChatResponse {
            message,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model listing failed");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let tags: ApiTagsResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> Result<bool, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// ── Ollama API types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiTagsResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Deserialize)]
struct ApiModel {
    name: String,
}

//! Response generation.
//!
//! Builds the fixed three-message prompt and runs one non-streaming chat
//! completion. Failures never escape: they become [`GENERATION_ERROR_MESSAGE`].

use ragchat_config::LlmConfig;
use ragchat_core::error::GenerationError;
use ragchat_core::message::Message;
use ragchat_core::provider::{ChatProvider, ChatRequest};
use std::sync::Arc;
use tracing::{debug, error};

/// Returned in place of a reply when the model call fails.
pub const GENERATION_ERROR_MESSAGE: &str = "An error occurred during response generation.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\n# Role and Purpose:\n\n# Guidelines:\n";

const QUESTION_HEADER: &str = "# User question:\n";
const CONTEXT_HEADER: &str = "# Retrieved information:\n";

pub struct ResponseGenerator {
    provider: Arc<dyn ChatProvider>,
    model: String,
    system_prompt: String,
    temperature: Option<f32>,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
        }
    }

    pub fn from_config(provider: Arc<dyn ChatProvider>, config: &LlmConfig) -> Self {
        Self::new(provider, &config.model)
            .with_system_prompt(&config.system_prompt)
            .with_temperature(config.temperature)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// System prompt, the user's question, then the retrieved context as
    /// something the assistant already said.
    pub fn build_messages(&self, message: &str, context: &str) -> Vec<Message> {
        vec![
            Message::system(&self.system_prompt),
            Message::user(format!("{QUESTION_HEADER}{message}")),
            Message::assistant(format!("{CONTEXT_HEADER}{context}")),
        ]
    }

    /// Generate a reply. Always returns text.
    pub async fn generate(&self, user_id: &str, message: &str, context: &str) -> String {
        match self.try_generate(message, context).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(user_id, model = %self.model, error = %e, "Response generation failed");
                GENERATION_ERROR_MESSAGE.to_string()
            }
        }
    }

    async fn try_generate(&self, message: &str, context: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(message, context),
            temperature: self.temperature,
        };

        debug!(model = %self.model, context_len = context.len(), "Requesting completion");
        let response = self.provider.complete(request).await?;

        if response.message.content.trim().is_empty() {
            return Err(GenerationError::InvalidResponse("empty completion".into()));
        }
        Ok(response.message.content)
    }
}

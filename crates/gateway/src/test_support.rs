//! Lightweight mocks for gateway tests.

use async_trait::async_trait;
use ragchat_config::AppConfig;
use ragchat_core::artifact::{Artifact, ArtifactKind};
use ragchat_core::embedding::{ArtifactEmbedding, Embedder};
use ragchat_core::error::{EmbeddingError, GenerationError};
use ragchat_core::message::Message;
use ragchat_core::provider::{ChatProvider, ChatRequest, ChatResponse};
use ragchat_store::InMemoryStore;
use std::sync::Arc;

use crate::{SharedState, build_state};

/// Embeds everything to the same vector.
pub struct MockEmbedder {
    caption: Option<String>,
    fail_images: bool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            caption: None,
            fail_images: false,
        }
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn name(&self) -> &str {
        "gateway_mock"
    }

    async fn embed_artifact(&self, artifact: &Artifact) -> Result<ArtifactEmbedding, EmbeddingError> {
        if artifact.kind != ArtifactKind::Image {
            return Ok(ArtifactEmbedding::new(vec![1.0, 0.0]));
        }
        if self.fail_images {
            return Err(EmbeddingError::ApiError {
                status_code: 502,
                message: "bad gateway".into(),
            });
        }
        Ok(ArtifactEmbedding {
            vector: vec![1.0, 0.0],
            caption: self.caption.clone(),
        })
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![1.0, 0.0])
    }
}

/// Answers every request with the same text, or fails.
pub struct MockProvider {
    reply: Option<String>,
}

impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.into()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "gateway_mock"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GenerationError> {
        match &self.reply {
            Some(text) => Ok(ChatResponse {
                message: Message::assistant(text.as_str()),
                model: request.model,
            }),
            None => Err(GenerationError::Network("connection refused".into())),
        }
    }
}

pub fn test_state(embedder: MockEmbedder, provider: MockProvider) -> SharedState {
    build_state(
        AppConfig::default(),
        Arc::new(embedder),
        Arc::new(InMemoryStore::new()),
        Arc::new(provider),
    )
}

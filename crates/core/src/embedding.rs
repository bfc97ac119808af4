//! Embedder trait - the abstraction over the external embedding services.
//!
//! Images go to the vision service, documents and plain text to the
//! document-embedding service. Implementations never retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::EmbeddingError;

/// The result of embedding one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEmbedding {
    pub vector: Vec<f32>,

    /// Caption produced by the vision service, when images are embedded
    /// through their caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ArtifactEmbedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            caption: None,
        }
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name for this embedder.
    fn name(&self) -> &str;

    /// Embed raw artifact bytes with the service matching its kind.
    async fn embed_artifact(
        &self,
        artifact: &Artifact,
    ) -> std::result::Result<ArtifactEmbedding, EmbeddingError>;

    /// Embed plain text through the text endpoint.
    async fn embed_text(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;

    /// Can we reach the embedding services?
    async fn health_check(&self) -> std::result::Result<bool, EmbeddingError> {
        Ok(true)
    }
}

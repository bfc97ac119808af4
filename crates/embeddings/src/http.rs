//! Embedding gateway over HTTP.
//!
//! Talks to two services:
//!
//! - the **vision** service: `POST {vision_url}/process`, multipart field
//!   `image`, answering `{"embedding": [...]}` and/or `{"caption": "..."}`
//! - the **document** service: `POST {document_url}/embed`, either multipart
//!   field `document` or JSON `{"text": "..."}`, answering
//!   `{"embedding": [...]}`
//!
//! Every response is checked against those shapes before use. No retries.

use async_trait::async_trait;
use ragchat_config::{EmbeddingsConfig, ImageMode};
use ragchat_core::artifact::{Artifact, ArtifactKind};
use ragchat_core::embedding::{ArtifactEmbedding, Embedder};
use ragchat_core::error::EmbeddingError;
use serde::Deserialize;
use tracing::{debug, warn};

const VISION: &str = "vision";
const DOCUMENT: &str = "document";

/// Response contract of the vision service.
#[derive(Debug, Deserialize)]
struct VisionResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    caption: Option<String>,
}

/// Response contract of the document/text embedding service.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// HTTP client for the vision and document embedding services.
pub struct HttpEmbedder {
    vision_url: String,
    document_url: String,
    image_mode: ImageMode,
    client: reqwest::Client,
}

impl HttpEmbedder {
    pub fn new(vision_url: impl Into<String>, document_url: impl Into<String>) -> Self {
        Self {
            vision_url: vision_url.into().trim_end_matches('/').to_string(),
            document_url: document_url.into().trim_end_matches('/').to_string(),
            image_mode: ImageMode::Embedding,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &EmbeddingsConfig) -> Self {
        Self::new(&config.vision_url, &config.document_url).with_image_mode(config.image_mode)
    }

    /// Choose how images become vectors.
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    async fn post_file(
        &self,
        service: &str,
        url: &str,
        field: &'static str,
        artifact: &Artifact,
    ) -> Result<reqwest::Response, EmbeddingError> {
        let part = reqwest::multipart::Part::bytes(artifact.data.clone())
            .file_name(artifact.name.clone());
        let form = reqwest::multipart::Form::new().part(field, part);

        debug!(service, name = %artifact.name, bytes = artifact.data.len(), "Sending embedding request");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| network(service, e))?;

        check_status(service, response).await
    }

    async fn embed_image(&self, artifact: &Artifact) -> Result<ArtifactEmbedding, EmbeddingError> {
        let url = format!("{}/process", self.vision_url);
        let response = self.post_file(VISION, &url, "image", artifact).await?;
        let body: VisionResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(format!("vision service: {e}")))?;

        let caption = body
            .caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match self.image_mode {
            ImageMode::Embedding => {
                let vector = body.embedding.ok_or_else(|| {
                    EmbeddingError::InvalidResponse("vision service: missing 'embedding'".into())
                })?;
                Ok(ArtifactEmbedding {
                    vector: validate_vector(VISION, vector)?,
                    caption,
                })
            }
            ImageMode::Caption => {
                let caption = caption.ok_or_else(|| {
                    EmbeddingError::InvalidResponse("vision service: missing 'caption'".into())
                })?;
                let vector = self.embed_text(&caption).await?;
                Ok(ArtifactEmbedding {
                    vector,
                    caption: Some(caption),
                })
            }
        }
    }

    async fn embed_document(&self, artifact: &Artifact) -> Result<ArtifactEmbedding, EmbeddingError> {
        let url = format!("{}/embed", self.document_url);
        let response = self.post_file(DOCUMENT, &url, "document", artifact).await?;
        let vector = parse_embedding(DOCUMENT, response).await?;
        Ok(ArtifactEmbedding::new(vector))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed_artifact(&self, artifact: &Artifact) -> Result<ArtifactEmbedding, EmbeddingError> {
        if artifact.data.is_empty() {
            return Err(EmbeddingError::EmptyInput(format!(
                "{} '{}' has no content",
                artifact.kind, artifact.name
            )));
        }

        match artifact.kind {
            ArtifactKind::Image => self.embed_image(artifact).await,
            ArtifactKind::Document => self.embed_document(artifact).await,
            ArtifactKind::Message => {
                let text = artifact.text().ok_or_else(|| {
                    EmbeddingError::EmptyInput("message is not valid text".into())
                })?;
                Ok(ArtifactEmbedding::new(self.embed_text(text).await?))
            }
        }
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput("text is empty".into()));
        }

        let url = format!("{}/embed", self.document_url);
        debug!(service = DOCUMENT, chars = text.len(), "Sending text embedding request");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| network(DOCUMENT, e))?;

        let response = check_status(DOCUMENT, response).await?;
        parse_embedding(DOCUMENT, response).await
    }

    async fn health_check(&self) -> Result<bool, EmbeddingError> {
        // Any HTTP answer means the service is up; the services expose no
        // dedicated health route.
        for (service, url) in [(VISION, &self.vision_url), (DOCUMENT, &self.document_url)] {
            self.client
                .get(url.as_str())
                .send()
                .await
                .map_err(|e| network(service, e))?;
        }
        Ok(true)
    }
}

fn network(service: &str, e: reqwest::Error) -> EmbeddingError {
    EmbeddingError::Network {
        service: service.to_string(),
        reason: e.to_string(),
    }
}

async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, EmbeddingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(service, status = status.as_u16(), body = %body, "Embedding service returned error");
    Err(EmbeddingError::ApiError {
        status_code: status.as_u16(),
        message: body,
    })
}

async fn parse_embedding(service: &str, response: reqwest::Response) -> Result<Vec<f32>, EmbeddingError> {
    let body: EmbedResponse = response
        .json()
        .await
        .map_err(|e| EmbeddingError::InvalidResponse(format!("{service} service: {e}")))?;
    validate_vector(service, body.embedding)
}

fn validate_vector(service: &str, vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::InvalidResponse(format!(
            "{service} service returned an empty embedding"
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::InvalidResponse(format!(
            "{service} service returned a non-finite embedding value"
        )));
    }
    Ok(vector)
}

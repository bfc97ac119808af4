//! The request-level facade used by the transport.

use ragchat_config::AppConfig;
use ragchat_core::artifact::{Artifact, ArtifactKind};
use ragchat_core::error::Result;
use serde::Serialize;
use tracing::info;

use crate::assembler::ContextAssembler;
use crate::generator::ResponseGenerator;

/// Upper bound on records returned by [`ChatService::list_images`].
pub const IMAGE_LIST_LIMIT: usize = 100;

/// Acknowledgement for artifacts embedded without prompting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedSummary {
    pub stored: usize,
    pub ids: Vec<String>,
}

/// A stored image as shown in the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredImage {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Context assembly followed by response generation.
pub struct ChatService {
    assembler: ContextAssembler,
    generator: ResponseGenerator,
    default_user_id: String,
}

impl ChatService {
    pub fn new(assembler: ContextAssembler, generator: ResponseGenerator) -> Self {
        Self {
            assembler,
            generator,
            default_user_id: "admin".into(),
        }
    }

    /// Wire already-built parts using the pipeline and model settings.
    pub fn from_config(assembler: ContextAssembler, generator: ResponseGenerator, config: &AppConfig) -> Self {
        Self::new(assembler.with_pipeline(&config.pipeline), generator)
            .with_default_user_id(&config.pipeline.default_user_id)
    }

    pub fn with_default_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.default_user_id = user_id.into();
        self
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    /// The given user id, or the default when absent or blank.
    pub fn resolve_user<'a>(&'a self, user_id: Option<&'a str>) -> &'a str {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => &self.default_user_id,
        }
    }

    /// Answer one chat message.
    ///
    /// Assembly failures are returned; generation failures are already
    /// folded into the reply text.
    pub async fn respond(&self, user_id: Option<&str>, message: &str, artifacts: &[Artifact]) -> Result<String> {
        let user_id = self.resolve_user(user_id);
        info!(user_id, artifacts = artifacts.len(), "Handling chat message");

        let assembled = self.assembler.assemble(user_id, message, artifacts).await?;
        Ok(self.generator.generate(user_id, message, &assembled.context).await)
    }

    /// Embed and store artifacts for later retrieval.
    pub async fn embed_artifacts(&self, user_id: Option<&str>, artifacts: &[Artifact]) -> Result<EmbedSummary> {
        let user_id = self.resolve_user(user_id);
        let ids = self.assembler.store_artifacts(user_id, artifacts).await?;
        info!(user_id, stored = ids.len(), "Artifacts embedded");
        Ok(EmbedSummary { stored: ids.len(), ids })
    }

    /// The user's stored images.
    pub async fn list_images(&self, user_id: Option<&str>) -> Result<Vec<StoredImage>> {
        let user_id = self.resolve_user(user_id);
        let records = self
            .assembler
            .list(user_id, Some(ArtifactKind::Image), IMAGE_LIST_LIMIT)
            .await?;

        Ok(records
            .into_iter()
            .map(|r| {
                let (filename, caption) = match r.metadata {
                    Some(meta) => (meta.name.unwrap_or_else(|| r.id.clone()), meta.caption),
                    None => (r.id.clone(), None),
                };
                StoredImage { filename, caption }
            })
            .collect())
    }
}

//! Context assembly pipeline.
//!
//! Turns a user message plus uploaded artifacts into the context string
//! injected into the model prompt:
//!
//! 1. Resolve the user's collection (created if absent)
//! 2. Embed every uploaded artifact concurrently
//! 3. Upsert the resulting records, if any
//! 4. Embed the message text
//! 5. Query the `top_n` nearest records
//! 6. Join their `text` metadata, nearest first
//!
//! Any failure aborts the request. Records already written stay written.

use futures::future::{join_all, try_join_all};
use ragchat_config::PipelineConfig;
use ragchat_core::artifact::{Artifact, ArtifactKind, EmbeddingRecord, IdScheme, RecordMetadata};
use ragchat_core::embedding::{ArtifactEmbedding, Embedder};
use ragchat_core::error::{EmbeddingError, Result};
use ragchat_core::store::{Collection, QueryMatch, StoredRecord, VectorStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between the segments of different records.
pub const RECORD_SEPARATOR: &str = "\n\n";

/// Where a request currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStage {
    Idle,
    EmbeddingArtifacts,
    StoringArtifacts,
    EmbeddingQuery,
    QueryingStore,
    ContextReady,
}

/// The output of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// Joined record text, possibly empty
    pub context: String,
    /// Ids written to the collection during this request
    pub stored_ids: Vec<String>,
    /// The records the context was built from, nearest first
    pub matches: Vec<QueryMatch>,
    pub stage: AssemblyStage,
}

/// Orchestrates the embedding gateway and the vector store for one request.
pub struct ContextAssembler {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_n: usize,
    id_scheme: IdScheme,
    store_partial_batches: bool,
}

impl ContextAssembler {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            top_n: 3,
            id_scheme: IdScheme::default(),
            store_partial_batches: false,
        }
    }

    /// Apply the pipeline section of the configuration.
    pub fn with_pipeline(self, config: &PipelineConfig) -> Self {
        self.with_top_n(config.top_n)
            .with_id_scheme(config.id_scheme)
            .with_partial_batches(config.store_partial_batches)
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_id_scheme(mut self, id_scheme: IdScheme) -> Self {
        self.id_scheme = id_scheme;
        self
    }

    /// When set, a batch of one artifact kind that embedded completely is
    /// stored even if another kind failed. The request still fails.
    pub fn with_partial_batches(mut self, enabled: bool) -> Self {
        self.store_partial_batches = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Run the full pipeline for one chat message.
    pub async fn assemble(&self, user_id: &str, message: &str, artifacts: &[Artifact]) -> Result<AssembledContext> {
        let mut stage = AssemblyStage::Idle;
        let result = self.run(&mut stage, user_id, message, artifacts).await;
        if let Err(e) = &result {
            warn!(user_id, stage = ?stage, error = %e, "Context assembly failed");
        }
        result
    }

    /// Embed and store artifacts without querying. Returns the stored ids.
    pub async fn store_artifacts(&self, user_id: &str, artifacts: &[Artifact]) -> Result<Vec<String>> {
        let collection = self.store.ensure_collection(user_id).await?;
        let mut stage = AssemblyStage::Idle;
        self.embed_and_store(&mut stage, &collection, artifacts).await
    }

    /// List a user's stored records, optionally of a single kind.
    pub async fn list(&self, user_id: &str, kind: Option<ArtifactKind>, limit: usize) -> Result<Vec<StoredRecord>> {
        let collection = self.store.ensure_collection(user_id).await?;
        Ok(self.store.list(&collection, kind, limit).await?)
    }

    async fn run(
        &self,
        stage: &mut AssemblyStage,
        user_id: &str,
        message: &str,
        artifacts: &[Artifact],
    ) -> Result<AssembledContext> {
        let collection = self.store.ensure_collection(user_id).await?;

        let stored_ids = self.embed_and_store(stage, &collection, artifacts).await?;

        advance(stage, AssemblyStage::EmbeddingQuery);
        let query = self.embedder.embed_text(message).await?;

        advance(stage, AssemblyStage::QueryingStore);
        let matches = self.store.query(&collection, &query, self.top_n).await?;

        let context = join_context(&matches);
        advance(stage, AssemblyStage::ContextReady);

        info!(
            user_id,
            records = stored_ids.len(),
            matches = matches.len(),
            context_len = context.len(),
            "Context assembled"
        );

        Ok(AssembledContext {
            context,
            stored_ids,
            matches,
            stage: *stage,
        })
    }

    async fn embed_and_store(
        &self,
        stage: &mut AssemblyStage,
        collection: &Collection,
        artifacts: &[Artifact],
    ) -> Result<Vec<String>> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }

        advance(stage, AssemblyStage::EmbeddingArtifacts);
        let (embedded, failure) = self.embed_artifacts(artifacts).await;

        if failure.is_none() || self.store_partial_batches {
            let records = self.build_records(&embedded);
            if !records.is_empty() {
                advance(stage, AssemblyStage::StoringArtifacts);
                let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
                debug!(collection = %collection.name, records = records.len(), "Upserting records");
                self.store.upsert(collection, records).await?;
                if failure.is_none() {
                    return Ok(ids);
                }
                warn!(stored = ids.len(), "Stored partial batch before failing");
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(Vec::new()),
        }
    }

    /// Embed all artifacts concurrently.
    ///
    /// All-or-nothing by default: the first failure discards every result.
    /// With partial batches enabled each kind is joined on its own and the
    /// kinds that fully succeeded are kept.
    async fn embed_artifacts<'a>(
        &self,
        artifacts: &'a [Artifact],
    ) -> (Vec<(&'a Artifact, ArtifactEmbedding)>, Option<EmbeddingError>) {
        let images = artifacts.iter().filter(|a| a.kind == ArtifactKind::Image).count();
        debug!(images, documents = artifacts.len() - images, "Embedding artifacts");

        if !self.store_partial_batches {
            let calls = artifacts.iter().map(|a| self.embed_one(a));
            return match try_join_all(calls).await {
                Ok(embedded) => (embedded, None),
                Err(e) => (Vec::new(), Some(e)),
            };
        }

        let mut by_kind: Vec<(ArtifactKind, Vec<&Artifact>)> = Vec::new();
        for artifact in artifacts {
            match by_kind.iter_mut().find(|(k, _)| *k == artifact.kind) {
                Some((_, group)) => group.push(artifact),
                None => by_kind.push((artifact.kind, vec![artifact])),
            }
        }

        let batches = by_kind
            .iter()
            .map(|(_, group)| try_join_all(group.iter().copied().map(|a| self.embed_one(a))));

        let mut embedded = Vec::new();
        let mut failure = None;
        for result in join_all(batches).await {
            match result {
                Ok(batch) => embedded.extend(batch),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        (embedded, failure)
    }

    async fn embed_one<'a>(&self, artifact: &'a Artifact) -> std::result::Result<(&'a Artifact, ArtifactEmbedding), EmbeddingError> {
        let embedding = self.embedder.embed_artifact(artifact).await?;
        Ok((artifact, embedding))
    }

    /// Build records in upload order, numbering each kind from zero.
    fn build_records(&self, embedded: &[(&Artifact, ArtifactEmbedding)]) -> Vec<EmbeddingRecord> {
        let mut counters: HashMap<ArtifactKind, usize> = HashMap::new();
        embedded
            .iter()
            .map(|(artifact, embedding)| {
                let index = counters.entry(artifact.kind).or_default();
                let id = self.id_scheme.assign(artifact, *index);
                *index += 1;
                EmbeddingRecord {
                    id,
                    embedding: embedding.vector.clone(),
                    metadata: record_metadata(artifact, embedding),
                }
            })
            .collect()
    }
}

fn advance(stage: &mut AssemblyStage, next: AssemblyStage) {
    debug!(from = ?*stage, to = ?next, "Assembly stage");
    *stage = next;
}

fn record_metadata(artifact: &Artifact, embedding: &ArtifactEmbedding) -> RecordMetadata {
    let mut metadata = RecordMetadata::new(artifact.kind);
    metadata.name = Some(artifact.name.clone());
    metadata.caption = embedding.caption.clone();
    metadata.text = match artifact.kind {
        ArtifactKind::Image => embedding.caption.clone(),
        ArtifactKind::Document | ArtifactKind::Message => artifact.text().map(str::to_string),
    };
    metadata
}

/// Join the `text` of each match, nearest first. A match without text
/// contributes an empty segment.
pub fn join_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|m| m.metadata.as_ref().and_then(|meta| meta.text.as_deref()).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

//! VectorStore trait - per-user collections of embedding records.
//!
//! Each user id names one collection. Collections are created lazily and
//! never deleted. The store is the only state shared between requests and
//! gives no transactional guarantee: concurrent writers race.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKind, EmbeddingRecord, RecordMetadata};
use crate::error::StoreError;

/// A handle to a user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Store-assigned identifier
    pub id: String,
    /// The user id the collection is named after
    pub name: String,
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub metadata: Option<RecordMetadata>,
    /// Distance to the query vector (smaller is closer), when the store reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// A record as listed back from a collection (no vector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub metadata: Option<RecordMetadata>,
}

/// The core VectorStore trait.
///
/// Implementations: Chroma over HTTP, in-memory (for tests and demos).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "chroma", "in_memory").
    fn name(&self) -> &str;

    /// Return the user's collection, creating it if absent. Idempotent.
    async fn ensure_collection(&self, user_id: &str) -> std::result::Result<Collection, StoreError>;

    /// Look up an existing collection without creating it.
    /// Fails with [`StoreError::CollectionNotFound`] when absent.
    async fn get_collection(&self, name: &str) -> std::result::Result<Collection, StoreError>;

    /// Write records; an existing id is overwritten. Empty input is a no-op.
    async fn upsert(
        &self,
        collection: &Collection,
        records: Vec<EmbeddingRecord>,
    ) -> std::result::Result<(), StoreError>;

    /// The `top_n` nearest records, closest first. Empty collection → empty result.
    async fn query(
        &self,
        collection: &Collection,
        vector: &[f32],
        top_n: usize,
    ) -> std::result::Result<Vec<QueryMatch>, StoreError>;

    /// List up to `limit` records, optionally only those of one kind.
    async fn list(
        &self,
        collection: &Collection,
        kind: Option<ArtifactKind>,
        limit: usize,
    ) -> std::result::Result<Vec<StoredRecord>, StoreError>;

    /// Number of records in the collection.
    async fn count(&self, collection: &Collection) -> std::result::Result<usize, StoreError>;

    /// Can we reach the store?
    async fn health_check(&self) -> std::result::Result<bool, StoreError> {
        Ok(true)
    }
}

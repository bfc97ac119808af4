//! In-memory store - useful for testing and running without a vector database.

use async_trait::async_trait;
use ragchat_core::artifact::{ArtifactKind, EmbeddingRecord};
use ragchat_core::error::StoreError;
use ragchat_core::store::{Collection, QueryMatch, StoredRecord, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::nearest;

/// A store that keeps each user's records in a Vec, ranked by cosine similarity.
/// Contents are lost when the process exits.
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<EmbeddingRecord>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_collection(&self, user_id: &str) -> Result<Collection, StoreError> {
        if user_id.is_empty() {
            return Err(StoreError::InvalidCollection("empty user id".into()));
        }
        self.collections
            .write()
            .await
            .entry(user_id.to_string())
            .or_default();
        Ok(Collection {
            id: user_id.to_string(),
            name: user_id.to_string(),
        })
    }

    async fn get_collection(&self, name: &str) -> Result<Collection, StoreError> {
        if !self.collections.read().await.contains_key(name) {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }
        Ok(Collection {
            id: name.to_string(),
            name: name.to_string(),
        })
    }

    async fn upsert(&self, collection: &Collection, records: Vec<EmbeddingRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(&collection.id)
            .ok_or_else(|| StoreError::InvalidCollection(collection.name.clone()))?;

        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    async fn query(&self, collection: &Collection, vector: &[f32], top_n: usize) -> Result<Vec<QueryMatch>, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.id)
            .ok_or_else(|| StoreError::InvalidCollection(collection.name.clone()))?;
        Ok(nearest(stored, vector, top_n))
    }

    async fn list(
        &self,
        collection: &Collection,
        kind: Option<ArtifactKind>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(&collection.id)
            .ok_or_else(|| StoreError::InvalidCollection(collection.name.clone()))?;

        Ok(stored
            .iter()
            .filter(|r| kind.is_none_or(|k| r.metadata.kind == Some(k)))
            .take(limit)
            .map(|r| StoredRecord {
                id: r.id.clone(),
                metadata: Some(r.metadata.clone()),
            })
            .collect())
    }

    async fn count(&self, collection: &Collection) -> Result<usize, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection.id).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::artifact::RecordMetadata;

    fn record(id: &str, kind: ArtifactKind, embedding: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.into(),
            embedding,
            metadata: RecordMetadata::new(kind),
        }
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryStore::new();
        let a = store.ensure_collection("admin").await.unwrap();
        store
            .upsert(&a, vec![record("document_0", ArtifactKind::Document, vec![1.0])])
            .await
            .unwrap();

        let b = store.ensure_collection("admin").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.count(&b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn query_empty_collection_returns_nothing() {
        let store = InMemoryStore::new();
        let c = store.ensure_collection("fresh").await.unwrap();
        assert!(store.query(&c, &[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let store = InMemoryStore::new();
        let c = store.ensure_collection("admin").await.unwrap();
        store
            .upsert(&c, vec![record("image_0", ArtifactKind::Image, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert(&c, vec![record("image_0", ArtifactKind::Image, vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(store.count(&c).await.unwrap(), 1);
        let hits = store.query(&c, &[0.0, 1.0], 1).await.unwrap();
        assert!(hits[0].distance.unwrap().abs() < 1e-6);
    }

    #[tokio::test]
    async fn collections_are_isolated_per_user() {
        let store = InMemoryStore::new();
        let alice = store.ensure_collection("alice").await.unwrap();
        let bob = store.ensure_collection("bob").await.unwrap();
        store
            .upsert(&alice, vec![record("document_0", ArtifactKind::Document, vec![1.0])])
            .await
            .unwrap();

        assert_eq!(store.count(&alice).await.unwrap(), 1);
        assert_eq!(store.count(&bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_filters_by_kind() {
        let store = InMemoryStore::new();
        let c = store.ensure_collection("admin").await.unwrap();
        store
            .upsert(
                &c,
                vec![
                    record("image_0", ArtifactKind::Image, vec![1.0]),
                    record("document_0", ArtifactKind::Document, vec![1.0]),
                    record("image_1", ArtifactKind::Image, vec![1.0]),
                ],
            )
            .await
            .unwrap();

        let images = store.list(&c, Some(ArtifactKind::Image), 10).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(store.list(&c, None, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_collection_is_an_error() {
        let store = InMemoryStore::new();
        let ghost = Collection {
            id: "ghost".into(),
            name: "ghost".into(),
        };
        assert!(store.query(&ghost, &[1.0], 3).await.is_err());
    }

    #[tokio::test]
    async fn get_collection_does_not_create() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.get_collection("typo").await,
            Err(StoreError::CollectionNotFound(_))
        ));
        assert!(store.get_collection("typo").await.is_err());

        store.ensure_collection("admin").await.unwrap();
        assert_eq!(store.get_collection("admin").await.unwrap().name, "admin");
    }
}

//! Chroma vector database adapter.
//!
//! Speaks Chroma's v1 REST API, served by Chroma 0.4.x and 0.5.x. Chroma 1.x
//! removed these paths in favour of `/api/v2` and is not supported.
//!
//! - `POST /api/v1/collections` with `get_or_create` - resolve a collection
//! - `GET  /api/v1/collections/{name}` - look up a collection without creating it
//! - `POST /api/v1/collections/{id}/upsert` - write records
//! - `POST /api/v1/collections/{id}/query` - nearest neighbours
//! - `POST /api/v1/collections/{id}/get` - list records
//! - `GET  /api/v1/collections/{id}/count`
//! - `GET  /api/v1/heartbeat`

use async_trait::async_trait;
use ragchat_core::artifact::{ArtifactKind, EmbeddingRecord, RecordMetadata};
use ragchat_core::error::StoreError;
use ragchat_core::store::{Collection, QueryMatch, StoredRecord, VectorStore};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// A Chroma server reached over HTTP.
pub struct ChromaStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
    name: String,
}

/// `query` answers one inner list per query vector.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<serde_json::Value>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    metadatas: Option<Vec<Option<serde_json::Value>>>,
}

impl ChromaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self, collection: &Collection, op: &str) -> String {
        format!("{}/api/v1/collections/{}/{op}", self.base_url, collection.id)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, body: serde_json::Value) -> Result<T, StoreError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        decode(response).await
    }
}

/// Chroma collection names: 3-63 chars of `[A-Za-z0-9._-]`, starting and
/// ending with an alphanumeric.
fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let valid_len = (3..=63).contains(&name.len());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    let valid_ends = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());

    if valid_len && valid_chars && valid_ends {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(format!(
            "'{name}' must be 3-63 characters of letters, digits, '.', '_' or '-', starting and ending with a letter or digit"
        )))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Vector store returned error");
        return Err(StoreError::ApiError {
            status_code: status.as_u16(),
            message: body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

/// Records written by other tools may carry metadata we cannot read; those
/// surface as `None` rather than failing the whole query.
fn parse_metadata(value: Option<serde_json::Value>) -> Option<RecordMetadata> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(meta) => Some(meta),
        Err(e) => {
            debug!(error = %e, "Skipping unreadable record metadata");
            None
        }
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    fn name(&self) -> &str {
        "chroma"
    }

    async fn ensure_collection(&self, user_id: &str) -> Result<Collection, StoreError> {
        validate_collection_name(user_id)?;

        let url = format!("{}/api/v1/collections", self.base_url);
        let body = serde_json::json!({ "name": user_id, "get_or_create": true });
        let resp: CollectionResponse = self.post(&url, body).await?;

        debug!(collection = %resp.name, id = %resp.id, "Resolved collection");
        Ok(Collection {
            id: resp.id,
            name: resp.name,
        })
    }

    async fn get_collection(&self, name: &str) -> Result<Collection, StoreError> {
        validate_collection_name(name)?;

        let response = self
            .client
            .get(format!("{}/api/v1/collections/{name}", self.base_url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // 0.4 servers answer a missing collection with 500 and a ValueError body.
        let resp: CollectionResponse = decode(response).await.map_err(|e| match e {
            StoreError::ApiError { status_code: 404, .. } => StoreError::CollectionNotFound(name.to_string()),
            StoreError::ApiError { ref message, .. } if message.contains("does not exist") => {
                StoreError::CollectionNotFound(name.to_string())
            }
            other => other,
        })?;

        Ok(Collection {
            id: resp.id,
            name: resp.name,
        })
    }

    async fn upsert(&self, collection: &Collection, records: Vec<EmbeddingRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(records.len());
        let mut embeddings = Vec::with_capacity(records.len());
        let mut metadatas = Vec::with_capacity(records.len());
        for record in records {
            ids.push(record.id);
            embeddings.push(record.embedding);
            metadatas.push(
                serde_json::to_value(&record.metadata)
                    .map_err(|e| StoreError::InvalidRecords(e.to_string()))?,
            );
        }

        debug!(collection = %collection.name, records = ids.len(), "Upserting records");

        let body = serde_json::json!({
            "ids": ids,
            "embeddings": embeddings,
            "metadatas": metadatas,
        });
        // Chroma answers `true` or an empty object depending on version.
        let _: serde_json::Value = self.post(&self.collection_url(collection, "upsert"), body).await?;
        Ok(())
    }

    async fn query(&self, collection: &Collection, vector: &[f32], top_n: usize) -> Result<Vec<QueryMatch>, StoreError> {
        // Older Chroma servers reject n_results larger than the collection.
        let available = self.count(collection).await?;
        let n_results = top_n.min(available);
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "query_embeddings": [vector],
            "n_results": n_results,
            "include": ["metadatas", "distances"],
        });
        let resp: QueryResponse = self.post(&self.collection_url(collection, "query"), body).await?;

        let ids = resp.ids.into_iter().next().unwrap_or_default();
        let mut metadatas = resp
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut distances = resp
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();

        Ok(ids
            .into_iter()
            .map(|id| QueryMatch {
                id,
                metadata: parse_metadata(metadatas.next().flatten()),
                distance: distances.next().flatten(),
            })
            .collect())
    }

    async fn list(
        &self,
        collection: &Collection,
        kind: Option<ArtifactKind>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut body = serde_json::json!({
            "limit": limit,
            "include": ["metadatas"],
        });
        if let Some(kind) = kind {
            body["where"] = serde_json::json!({ "type": kind.as_str() });
        }

        let resp: GetResponse = self.post(&self.collection_url(collection, "get"), body).await?;
        let mut metadatas = resp.metadatas.unwrap_or_default().into_iter();

        Ok(resp
            .ids
            .into_iter()
            .map(|id| StoredRecord {
                id,
                metadata: parse_metadata(metadatas.next().flatten()),
            })
            .collect())
    }

    async fn count(&self, collection: &Collection) -> Result<usize, StoreError> {
        let response = self
            .client
            .get(self.collection_url(collection, "count"))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        decode(response).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(format!("{}/api/v1/heartbeat", self.base_url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

//! Shared test doubles for pipeline tests.

use async_trait::async_trait;
use ragchat_core::artifact::{Artifact, ArtifactKind, EmbeddingRecord};
use ragchat_core::embedding::{ArtifactEmbedding, Embedder};
use ragchat_core::error::{EmbeddingError, GenerationError, StoreError};
use ragchat_core::message::Message;
use ragchat_core::provider::{ChatProvider, ChatRequest, ChatResponse};
use ragchat_core::store::{Collection, QueryMatch, StoredRecord, VectorStore};
use ragchat_store::InMemoryStore;
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_VECTOR: [f32; 2] = [1.0, 0.0];

/// An embedder that records every call and answers from lookup tables.
///
/// Unknown inputs embed to a fixed default vector.
pub struct RecordingEmbedder {
    text_vectors: HashMap<String, Vec<f32>>,
    artifact_vectors: HashMap<Vec<u8>, Vec<f32>>,
    caption: Option<String>,
    fail_images: bool,
    text_calls: Mutex<Vec<String>>,
    artifact_calls: Mutex<usize>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self {
            text_vectors: HashMap::new(),
            artifact_vectors: HashMap::new(),
            caption: None,
            fail_images: false,
            text_calls: Mutex::new(Vec::new()),
            artifact_calls: Mutex::new(0),
        }
    }

    pub fn with_text_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.text_vectors.insert(text.to_string(), vector);
        self
    }

    pub fn with_artifact_vector(mut self, data: &[u8], vector: Vec<f32>) -> Self {
        self.artifact_vectors.insert(data.to_vec(), vector);
        self
    }

    /// Caption every image as the vision service would in caption mode.
    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.to_string());
        self
    }

    /// Make every image embedding fail with a 500.
    pub fn failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().unwrap().clone()
    }

    pub fn artifact_calls(&self) -> usize {
        *self.artifact_calls.lock().unwrap()
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn embed_artifact(&self, artifact: &Artifact) -> Result<ArtifactEmbedding, EmbeddingError> {
        *self.artifact_calls.lock().unwrap() += 1;

        if artifact.kind == ArtifactKind::Image && self.fail_images {
            return Err(EmbeddingError::ApiError {
                status_code: 500,
                message: "vision service down".into(),
            });
        }

        let vector = self
            .artifact_vectors
            .get(&artifact.data)
            .cloned()
            .unwrap_or_else(|| DEFAULT_VECTOR.to_vec());
        let caption = match artifact.kind {
            ArtifactKind::Image => self.caption.clone(),
            _ => None,
        };
        Ok(ArtifactEmbedding { vector, caption })
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.text_calls.lock().unwrap().push(text.to_string());
        Ok(self
            .text_vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| DEFAULT_VECTOR.to_vec()))
    }
}

/// An in-memory store that also records the size of each upsert batch.
pub struct CountingStore {
    inner: InMemoryStore,
    upserts: Mutex<Vec<usize>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            upserts: Mutex::new(Vec::new()),
        }
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().clone()
    }

    pub async fn record_count(&self, user_id: &str) -> usize {
        let collection = self.inner.ensure_collection(user_id).await.unwrap();
        self.inner.count(&collection).await.unwrap()
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    fn name(&self) -> &str {
        "counting_mock"
    }

    async fn ensure_collection(&self, user_id: &str) -> Result<Collection, StoreError> {
        self.inner.ensure_collection(user_id).await
    }

    async fn get_collection(&self, name: &str) -> Result<Collection, StoreError> {
        self.inner.get_collection(name).await
    }

    async fn upsert(&self, collection: &Collection, records: Vec<EmbeddingRecord>) -> Result<(), StoreError> {
        self.upserts.lock().unwrap().push(records.len());
        self.inner.upsert(collection, records).await
    }

    async fn query(&self, collection: &Collection, vector: &[f32], top_n: usize) -> Result<Vec<QueryMatch>, StoreError> {
        self.inner.query(collection, vector, top_n).await
    }

    async fn list(
        &self,
        collection: &Collection,
        kind: Option<ArtifactKind>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.list(collection, kind, limit).await
    }

    async fn count(&self, collection: &Collection) -> Result<usize, StoreError> {
        self.inner.count(collection).await
    }
}

/// A provider that answers every request the same way and keeps the requests.
pub struct ScriptedProvider {
    reply: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GenerationError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Some(text) => Ok(ChatResponse {
                message: Message::assistant(text.as_str()),
                model,
            }),
            None => Err(GenerationError::Network("connection refused".into())),
        }
    }
}

//! Vector store implementations for ragchat.
//!
//! All stores implement the `ragchat_core::VectorStore` trait.
//! [`build_from_config`] selects one based on configuration.

pub mod chroma;
pub mod in_memory;
pub mod vector;

pub use chroma::ChromaStore;
pub use in_memory::InMemoryStore;
pub use vector::{cosine_similarity, nearest};

use ragchat_config::StoreConfig;
use ragchat_core::store::VectorStore;
use std::sync::Arc;

/// Build the configured store. Validation has already rejected unknown
/// backends, so anything other than "memory" is Chroma.
pub fn build_from_config(config: &StoreConfig) -> Arc<dyn VectorStore> {
    match config.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(ChromaStore::new(config.url())),
    }
}

//! # ragchat core
//!
//! Domain types, traits, and error definitions for the ragchat
//! retrieval-augmented chat backend. This crate has **zero framework
//! dependencies** - it defines the domain model that all other crates
//! implement against.
//!
//! ## Seams
//!
//! Every external collaborator is a trait here:
//! - [`Embedder`] - vision and document embedding services
//! - [`VectorStore`] - per-user collections in a vector database
//! - [`ChatProvider`] - the language-model runtime
//!
//! Implementations live in their own crates and are injected at startup,
//! so tests can substitute any of them.

pub mod artifact;
pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use artifact::{Artifact, ArtifactKind, EmbeddingRecord, IdScheme, RecordMetadata};
pub use embedding::{ArtifactEmbedding, Embedder};
pub use error::{EmbeddingError, Error, GenerationError, Result, StoreError, TransportError};
pub use message::{Message, Role};
pub use provider::{ChatProvider, ChatRequest, ChatResponse};
pub use store::{Collection, QueryMatch, StoredRecord, VectorStore};

//! Error types for the ragchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator (embedding services, vector store, language
//! model runtime) has its own error enum; the transport has one for
//! malformed requests.

use thiserror::Error;

/// The top-level error type for all ragchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Embedding gateway ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Vector store ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Language model ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Inbound requests ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// An external embedding call failed.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding service returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Network error calling {service}: {reason}")]
    Network { service: String, reason: String },

    #[error("Malformed embedding response: {0}")]
    InvalidResponse(String),

    #[error("Nothing to embed: {0}")]
    EmptyInput(String),
}

/// A vector store operation failed.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Vector store returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Network error reaching vector store: {0}")]
    Network(String),

    #[error("Malformed vector store response: {0}")]
    InvalidResponse(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Records rejected: {0}")]
    InvalidRecords(String),
}

/// The language model call failed or returned unusable content.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Model runtime returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Network error reaching model runtime: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    InvalidResponse(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// An inbound request could not be understood.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

//! Language-model runtime clients for ragchat.
//!
//! All providers implement the `ragchat_core::ChatProvider` trait.

pub mod ollama;

pub use ollama::OllamaProvider;

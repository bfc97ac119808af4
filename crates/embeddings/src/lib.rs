//! Embedding gateway implementations for ragchat.
//!
//! All embedders implement the `ragchat_core::Embedder` trait.

pub mod http;

pub use http::HttpEmbedder;

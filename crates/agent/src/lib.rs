//! The ragchat request pipeline.
//!
//! Each chat message goes through two stages:
//!
//! 1. **Assemble** ([`ContextAssembler`]): embed and store uploads, embed
//!    the message, and join the nearest stored records into a context string
//! 2. **Generate** ([`ResponseGenerator`]): send system prompt, question,
//!    and context to the model runtime as one chat completion
//!
//! [`ChatService`] ties both together for the transport.

pub mod assembler;
pub mod generator;
pub mod service;

#[cfg(test)]
mod test_helpers;

pub use assembler::{AssembledContext, AssemblyStage, ContextAssembler, join_context};
pub use generator::{GENERATION_ERROR_MESSAGE, ResponseGenerator};
pub use service::{ChatService, EmbedSummary, StoredImage};

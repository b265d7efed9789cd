//! Unified LLM client boundary
//!
//! The codergen handler talks to language models exclusively through
//! this module: a small chat data model, a [`ProviderAdapter`] trait for
//! concrete backends, and a routing [`Client`]. The shipped backend is
//! the deterministic [`StubProvider`]; real providers plug in by
//! implementing the adapter trait.

pub mod client;
pub mod message;
pub mod provider;

pub use client::Client;
pub use message::{
    ChatMessage, CompletionChunk, CompletionRequest, CompletionResponse, Role, TokenUsage,
};
pub use provider::{CompletionStream, ProviderAdapter, StubProvider};

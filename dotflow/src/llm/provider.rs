//! Provider adapter contract
//!
//! [`ProviderAdapter`] is the seam between the engine and any concrete
//! completion backend. Adapters implement `complete`; `stream` has a
//! default single-chunk fallback for backends without native streaming.
//! [`StubProvider`] is the deterministic offline backend used by the
//! default registry and the test suite.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::message::{CompletionChunk, CompletionRequest, CompletionResponse, TokenUsage};
use crate::error::PipelineError;

/// Streaming response wrapper.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<CompletionChunk, PipelineError>> + Send>>,
}

impl CompletionStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<CompletionChunk, PipelineError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Wrap a finished response as a one-chunk stream.
    pub fn from_complete(response: CompletionResponse) -> Self {
        let chunk = CompletionChunk {
            content: response.content,
            is_final: true,
            usage: Some(response.usage),
        };
        Self::new(futures::stream::once(async move { Ok(chunk) }))
    }

    pub fn into_inner(
        self,
    ) -> Pin<Box<dyn Stream<Item = Result<CompletionChunk, PipelineError>> + Send>> {
        self.inner
    }
}

/// Contract every completion backend implements.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name used for routing and logging
    fn name(&self) -> &str;

    /// Produce one completion for the request
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, PipelineError>;

    /// Produce a streaming completion; defaults to wrapping `complete`
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, PipelineError> {
        let response = self.complete(request).await?;
        Ok(CompletionStream::from_complete(response))
    }
}

/// Deterministic stub backend for offline runs.
#[derive(Debug, Clone, Default)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }

    fn build_content(&self, request: &CompletionRequest) -> String {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.trim())
            .unwrap_or_default();
        format!("Stub provider response for prompt: {}", prompt)
    }
}

#[async_trait]
impl ProviderAdapter for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError> {
        let content = self.build_content(request);
        let usage = TokenUsage::new(0, content.len() as u32);
        Ok(CompletionResponse::new(content).with_usage(usage))
    }
}

//! Provider-routing client
//!
//! Routes completion requests to registered [`ProviderAdapter`]s by
//! name, falling back to a configurable default provider.

use std::collections::HashMap;
use std::sync::Arc;

use super::message::{CompletionRequest, CompletionResponse};
use super::provider::{CompletionStream, ProviderAdapter};
use crate::error::PipelineError;

/// Routes requests to the registered provider adapters.
#[derive(Clone, Default)]
pub struct Client {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
    default_provider: Option<String>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name.
    pub fn with_provider(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.insert(adapter.name().to_string(), adapter);
        self
    }

    /// Set the provider used when a request names none.
    pub fn with_default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    /// Registered provider names.
    pub fn providers(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError> {
        let adapter = self.resolve(request.provider.as_deref())?;
        adapter.complete(request).await
    }

    pub async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionStream, PipelineError> {
        let adapter = self.resolve(request.provider.as_deref())?;
        adapter.stream(request).await
    }

    fn resolve(&self, provider: Option<&str>) -> Result<&Arc<dyn ProviderAdapter>, PipelineError> {
        let name = provider
            .or(self.default_provider.as_deref())
            .ok_or_else(|| PipelineError::provider("no provider configured for the request"))?;
        self.providers
            .get(name)
            .ok_or_else(|| PipelineError::provider(format!("provider '{}' is not registered", name)))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("providers", &self.providers())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

//! Coding agent loop
//!
//! A deliberately thin loop: one prompt in, one completion out. The
//! codergen handler owns prompt templating; this type owns the chat
//! framing and provider selection.

use crate::error::PipelineError;
use crate::llm::{ChatMessage, Client, CompletionRequest};

const SYSTEM_PROMPT: &str = "You are an autonomous coding agent.";

/// Drives single completions against the routing client.
#[derive(Debug, Clone)]
pub struct AgentLoop {
    client: Client,
    provider: String,
    model: String,
}

impl AgentLoop {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            provider: "stub".to_string(),
            model: "stub-model".to_string(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Run one completion for the prompt and return the response text.
    pub async fn run(&self, prompt: &str) -> Result<String, PipelineError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let request =
            CompletionRequest::new(messages, self.model.clone()).with_provider(self.provider.clone());
        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }
}

//! Runner configuration
//!
//! Environment-driven settings for the CLI: which provider and model
//! the codergen handler talks to. Defaults target the offline stub
//! backend so a fresh checkout runs without any setup.

use std::env;

/// Configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider name the agent loop routes completions to
    pub provider: String,

    /// Model identifier passed through to the provider
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "stub".to_string(),
            model: "stub-model".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `DOTFLOW_PROVIDER` / `DOTFLOW_MODEL`,
    /// falling back to the stub defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: env::var("DOTFLOW_PROVIDER").unwrap_or(defaults.provider),
            model: env::var("DOTFLOW_MODEL").unwrap_or(defaults.model),
        }
    }
}

//! Shared run context
//!
//! [`Context`] is the mutable state one pipeline run threads through
//! every handler invocation: a JSON key-value store plus an append-only
//! log. All access goes through one mutex, so handlers that fan out
//! internal concurrency can share the context freely; `Clone` is a
//! shallow handle to the same store. [`Context::fork`] is the opposite:
//! an independent point-in-time copy carrying the same log history.

use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct ContextInner {
    values: Map<String, Value>,
    log: Vec<String>,
}

/// Run-scoped key-value store with an execution log.
#[derive(Debug, Clone, Default)]
pub struct Context {
    inner: Arc<Mutex<ContextInner>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-populated with values.
    pub fn with_values(initial: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContextInner {
                values: initial,
                log: Vec::new(),
            })),
        }
    }

    /// Build a context from `key=value` pairs (CLI seeding). Values stay
    /// strings; handlers and guards coerce as needed.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, crate::error::PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let context = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| crate::error::PipelineError::InvalidContextEntry(pair.to_string()))?;
            context.set(key.trim(), Value::String(value.trim().to_string()));
        }
        Ok(context)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ContextInner> {
        // a poisoned lock still holds consistent data; keep going
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a single key.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().values.insert(key.into(), value.into());
    }

    /// Read a single key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().values.get(key).cloned()
    }

    /// Merge a batch of entries atomically; later writes win per key.
    pub fn update(&self, entries: Map<String, Value>) {
        let mut inner = self.lock();
        for (key, value) in entries {
            inner.values.insert(key, value);
        }
    }

    /// Point-in-time copy of all values. Never observes a partially
    /// applied [`update`](Self::update).
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().values.clone()
    }

    /// Append one entry to the execution log.
    pub fn append_log(&self, entry: impl Into<String>) {
        self.lock().log.push(entry.into());
    }

    /// The execution log so far.
    pub fn logs(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    /// Independent deep copy with the same values and log history.
    pub fn fork(&self) -> Context {
        let inner = self.lock();
        Context {
            inner: Arc::new(Mutex::new(ContextInner {
                values: inner.values.clone(),
                log: inner.log.clone(),
            })),
        }
    }
}

//! Handler contract, registry, and built-in handlers
//!
//! Every node type resolves to one [`Handler`]. Handlers may read and
//! write the shared [`Context`] freely and append to its log, but never
//! mutate the graph. A handler error is absorbed by the engine into a
//! failed outcome, so only the engine decides what is fatal.

mod basic;
mod codergen;
mod tool;
mod wait_human;

pub use basic::{
    ConditionalHandler, ExitHandler, FanInHandler, ManagerLoopHandler, ParallelHandler,
    StartHandler,
};
pub use codergen::CodergenHandler;
pub use tool::ToolHandler;
pub use wait_human::HumanGateHandler;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::AgentLoop;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{Graph, NodeSpec};
use crate::outcome::Outcome;

/// Interface implemented by every node handler.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Run the node and return an outcome.
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        graph: &Graph,
    ) -> Result<Outcome, PipelineError>;
}

/// Lookup table for handlers by type name.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a type name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up the handler for a type name.
    pub fn handler_for(&self, name: &str) -> Result<&Arc<dyn Handler>, PipelineError> {
        self.handlers
            .get(name)
            .ok_or_else(|| PipelineError::MissingHandler(name.to_string()))
    }

    /// Registered type names.
    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Registry with every built-in handler under its reserved type name.
pub fn default_registry(agent: AgentLoop) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register("start", Arc::new(StartHandler));
    registry.register("exit", Arc::new(ExitHandler));
    registry.register("codergen", Arc::new(CodergenHandler::new(agent)));
    registry.register("wait.human", Arc::new(HumanGateHandler));
    registry.register("conditional", Arc::new(ConditionalHandler));
    registry.register("tool", Arc::new(ToolHandler));
    registry.register("parallel", Arc::new(ParallelHandler));
    registry.register("parallel.fan_in", Arc::new(FanInHandler));
    registry.register("stack.manager_loop", Arc::new(ManagerLoopHandler));
    registry
}

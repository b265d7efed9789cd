//! # dotflow
//!
//! A pipeline graph execution engine driven by DOT workflow definitions.
//!
//! A pipeline is a directed graph: nodes are steps with typed
//! attributes, edges carry guards, labels, and weights. The engine walks
//! the graph from its unique start node, dispatches every node to a
//! pluggable [`Handler`](handlers::Handler), and routes onward using the
//! outcome's suggestions, the node's fallback target, and guarded-edge
//! selection, tracking per-node retries and goal-gate satisfaction
//! until the exit node is reached.
//!
//! ```no_run
//! use dotflow::{AgentLoop, Client, Context, Graph, PipelineEngine, StubProvider};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), dotflow::PipelineError> {
//! let graph = Graph::parse(r#"
//!     digraph pipeline {
//!         goal="demo goal";
//!         start [shape=Mdiamond];
//!         work  [shape=box, prompt="Produce a summary"];
//!         exit  [shape=Msquare];
//!         start -> work;
//!         work -> exit;
//!     }
//! "#)?;
//!
//! let client = Client::new()
//!     .with_provider(Arc::new(StubProvider::new()))
//!     .with_default_provider("stub");
//! let registry = dotflow::handlers::default_registry(AgentLoop::new(client));
//!
//! let context = Context::new();
//! let engine = PipelineEngine::new(registry);
//! let result = engine.run(&graph, &context).await?;
//! assert_eq!(result.completed_nodes, vec!["start", "work", "exit"]);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod condition;
pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod llm;
pub mod outcome;

pub use agent::AgentLoop;
pub use condition::evaluate_condition;
pub use context::Context;
pub use engine::{PipelineEngine, RunEvent, RunResult};
pub use error::PipelineError;
pub use graph::{AttrValue, DurationUnit, DurationValue, EdgeSpec, Graph, NodeSpec};
pub use handlers::{default_registry, Handler, HandlerRegistry};
pub use llm::{Client, ProviderAdapter, StubProvider};
pub use outcome::{Outcome, StageStatus};

//! Error types for the pipeline engine
//!
//! One error enum covers the whole library. Variants split into two
//! families: structural and routing errors are fatal to a run, while
//! provider/tool/io errors surface from handlers and are subject to the
//! engine's retry and fallback routing.

use thiserror::Error;

/// Errors produced while parsing, validating, or executing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document contained no parseable graph at all
    #[error("no graph found in document")]
    EmptyDocument,

    /// The document declared an undirected graph
    #[error("only directed graphs are supported")]
    NotDirected,

    /// Malformed DOT input
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A node id that does not match the identifier grammar
    #[error("invalid node id '{0}'")]
    InvalidNodeId(String),

    /// Start/exit cardinality violation (exactly one of each is required)
    #[error("graph must have exactly one {role} node, found {count}")]
    RoleCount { role: &'static str, count: usize },

    /// Traversal reached a node id that is not declared in the graph
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// No handler registered for a node's resolved type name
    #[error("no handler registered for type '{0}'")]
    MissingHandler(String),

    /// Every outgoing edge was filtered out by its guard
    #[error("no eligible outgoing edge from '{0}'")]
    NoEligibleEdge(String),

    /// A `key=value` context seed entry that does not split on `=`
    #[error("invalid context entry '{0}', expected key=value")]
    InvalidContextEntry(String),

    /// Failure reported by an LLM provider adapter
    #[error("provider error: {0}")]
    Provider(String),

    /// Failure spawning or collecting a tool subprocess
    #[error("tool execution failed: {0}")]
    Tool(String),

    /// Underlying I/O failure (file reads, process plumbing)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a syntax error at a given source line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a tool execution error
    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool(message.into())
    }

    /// Whether the engine may absorb this error into a failed outcome
    ///
    /// Recoverable errors participate in per-node retry and fallback
    /// routing. Everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::Provider(_) | PipelineError::Tool(_) | PipelineError::Io(_)
        )
    }
}

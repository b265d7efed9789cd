//! Pipeline graph model
//!
//! [`Graph`] is the parsed, typed, immutable representation of a DOT
//! pipeline definition: a node map, an ordered edge list with a
//! per-source index, and graph-level attributes. Handler types derive
//! from an explicit `type` attribute or from the node's shape.
//!
//! Construction goes through [`Graph::parse`] / [`Graph::parse_file`],
//! which validate node identifiers and the one-start/one-exit invariant
//! before execution ever begins.

mod parser;
mod value;

pub use value::{AttrValue, DurationUnit, DurationValue};

use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;

/// Handler type names assigned to reserved shapes.
const SHAPE_TYPE_MAP: &[(&str, &str)] = &[
    ("Mdiamond", "start"),
    ("Msquare", "exit"),
    ("box", "codergen"),
    ("hexagon", "wait.human"),
    ("diamond", "conditional"),
    ("component", "parallel"),
    ("tripleoctagon", "parallel.fan_in"),
    ("parallelogram", "tool"),
    ("house", "stack.manager_loop"),
];

/// Fallback handler type when neither `type` nor a mapped shape is set.
const DEFAULT_HANDLER_TYPE: &str = "codergen";

/// A pipeline step with its decoded attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub attrs: HashMap<String, AttrValue>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute insertion, mostly for tests and
    /// programmatic graph construction.
    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Resolve the handler type: explicit `type` attribute first, then
    /// the shape table, then the codergen default.
    pub fn handler_type(&self) -> String {
        if let Some(explicit) = self.attrs.get("type") {
            if explicit.is_truthy() {
                return explicit.to_string();
            }
        }
        let shape = self
            .attrs
            .get("shape")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "box".to_string());
        SHAPE_TYPE_MAP
            .iter()
            .find(|(name, _)| *name == shape)
            .map(|(_, ty)| ty.to_string())
            .unwrap_or_else(|| DEFAULT_HANDLER_TYPE.to_string())
    }

    /// Attribute rendered as a string, when present and non-empty
    pub fn string_attr(&self, key: &str) -> Option<String> {
        self.attrs
            .get(key)
            .filter(|v| v.is_truthy())
            .map(|v| v.to_string())
    }

    /// Attribute coerced to an integer, when a numeric reading exists
    pub fn int_attr(&self, key: &str) -> Option<i64> {
        self.attrs.get(key).and_then(AttrValue::as_int)
    }

    /// Whether a flag-style attribute is present and truthy
    pub fn flag(&self, key: &str) -> bool {
        self.attrs.get(key).map(AttrValue::is_truthy).unwrap_or(false)
    }

    /// Declared retry budget (`max_retries`, default 0)
    pub fn max_retries(&self) -> i64 {
        self.int_attr("max_retries").unwrap_or(0)
    }

    /// Fallback routing target consulted on FAIL outcomes
    pub fn retry_target(&self) -> Option<String> {
        self.string_attr("retry_target")
            .or_else(|| self.string_attr("fallback_retry_target"))
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub attrs: HashMap<String, AttrValue>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Guard attribute, untouched; interpretation lives in the engine
    pub fn condition(&self) -> Option<&AttrValue> {
        self.attrs.get("condition")
    }

    /// Label matched against an outcome's preferred label
    pub fn label(&self) -> Option<String> {
        self.attrs.get("label").map(|v| v.to_string())
    }

    /// Routing weight, default 0
    pub fn weight(&self) -> i64 {
        self.attrs.get("weight").and_then(AttrValue::as_int).unwrap_or(0)
    }
}

/// Parsed, immutable representation of a pipeline definition.
#[derive(Debug, Clone)]
pub struct Graph {
    graph_attrs: HashMap<String, AttrValue>,
    nodes: HashMap<String, NodeSpec>,
    edges: Vec<EdgeSpec>,
    outgoing: HashMap<String, Vec<usize>>,
}

impl Graph {
    /// Assemble a graph from parts, enforcing the structural invariants
    /// (identifier syntax, exactly one start and one exit node).
    pub fn new(
        nodes: Vec<NodeSpec>,
        edges: Vec<EdgeSpec>,
        graph_attrs: HashMap<String, AttrValue>,
    ) -> Result<Self, PipelineError> {
        let mut node_map = HashMap::new();
        for node in nodes {
            if !is_valid_identifier(&node.id) {
                return Err(PipelineError::InvalidNodeId(node.id));
            }
            // a later declaration replaces an earlier one
            node_map.insert(node.id.clone(), node);
        }
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(index);
        }
        let graph = Self {
            graph_attrs,
            nodes: node_map,
            edges,
            outgoing,
        };
        graph.require_unique("start")?;
        graph.require_unique("exit")?;
        Ok(graph)
    }

    /// Parse a DOT document into a validated graph.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let doc = parser::parse_document(text)?;
        let graph_attrs = decode_attrs(doc.graph_attrs);
        let nodes = doc
            .nodes
            .into_iter()
            .map(|(id, attrs)| NodeSpec {
                id,
                attrs: decode_attrs(attrs),
            })
            .collect();
        let edges = doc
            .edges
            .into_iter()
            .map(|(source, target, attrs)| EdgeSpec {
                source,
                target,
                attrs: decode_attrs(attrs),
            })
            .collect();
        Self::new(nodes, edges, graph_attrs)
    }

    /// Parse a DOT file from disk.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Graph-level attributes
    pub fn graph_attrs(&self) -> &HashMap<String, AttrValue> {
        &self.graph_attrs
    }

    /// The run goal declared on the graph, empty string when absent
    pub fn goal(&self) -> String {
        self.graph_attrs
            .get("goal")
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    /// All declared nodes, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.values()
    }

    /// Outgoing edges of a node, in declaration order
    pub fn outgoing(&self, id: &str) -> Vec<&EdgeSpec> {
        self.outgoing
            .get(id)
            .map(|indices| indices.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    /// The unique start node
    pub fn start_node(&self) -> Result<&NodeSpec, PipelineError> {
        self.unique_node("start")
    }

    /// The unique exit node
    pub fn exit_node(&self) -> Result<&NodeSpec, PipelineError> {
        self.unique_node("exit")
    }

    fn unique_node(&self, role: &'static str) -> Result<&NodeSpec, PipelineError> {
        let matches: Vec<&NodeSpec> = self
            .nodes
            .values()
            .filter(|n| n.handler_type() == role)
            .collect();
        match matches.as_slice() {
            [node] => Ok(*node),
            _ => Err(PipelineError::RoleCount {
                role,
                count: matches.len(),
            }),
        }
    }

    fn require_unique(&self, role: &'static str) -> Result<(), PipelineError> {
        self.unique_node(role).map(|_| ())
    }
}

fn decode_attrs(raw: Vec<(String, String)>) -> HashMap<String, AttrValue> {
    raw.into_iter()
        .map(|(key, value)| (key, AttrValue::parse(&value)))
        .collect()
}

/// Identifier grammar: letters or underscore, then letters, digits, or
/// underscores.
fn is_valid_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Pipeline execution engine
//!
//! Owns the traversal loop: resolve the handler for the current node,
//! execute it, apply the outcome's bookkeeping, and select the next
//! node. Next-node selection is layered: explicit suggestions from the
//! outcome, the node's fail-time retry target, then guarded edges with
//! label preference and weight ordering. A node failure is recoverable
//! as long as some edge remains eligible; running out of edges is a
//! configuration defect and aborts the run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::condition::evaluate_condition;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{AttrValue, EdgeSpec, Graph, NodeSpec};
use crate::handlers::HandlerRegistry;
use crate::outcome::{Outcome, StageStatus};

/// One entry in the run's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub node: String,
    pub status: StageStatus,
    pub notes: String,
}

/// Aggregated result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub completed_nodes: Vec<String>,
    pub goal_gate_satisfied: bool,
    pub context: Map<String, Value>,
    pub events: Vec<RunEvent>,
}

/// Orchestrates handler execution and edge routing.
pub struct PipelineEngine {
    registry: HandlerRegistry,
}

impl PipelineEngine {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Walk the graph from its start node until the exit node is
    /// reached or routing fails.
    pub async fn run(&self, graph: &Graph, context: &Context) -> Result<RunResult, PipelineError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let start = graph.start_node()?.id.clone();
        let exit = graph.exit_node()?.id.clone();
        context.set("graph.goal", graph.goal());

        let gate_nodes: HashSet<String> = graph
            .nodes()
            .filter(|node| node.flag("goal_gate"))
            .map(|node| node.id.clone())
            .collect();
        let mut satisfied: HashSet<String> = HashSet::new();
        let mut retries: HashMap<String, i64> = HashMap::new();

        let mut result = RunResult {
            run_id: run_id.clone(),
            completed_nodes: Vec::new(),
            goal_gate_satisfied: false,
            context: Map::new(),
            events: Vec::new(),
        };

        info!(run_id = %run_id, start = %start, "pipeline run started");
        let mut current = start;
        loop {
            let node = graph
                .node(&current)
                .ok_or_else(|| PipelineError::UnknownNode(current.clone()))?;
            let handler_type = node.handler_type();
            let handler = self.registry.handler_for(&handler_type)?;

            let outcome = match handler.execute(node, context, graph).await {
                Ok(outcome) => outcome,
                // handler errors stay local: they become failed outcomes
                // and flow through retry and fallback routing
                Err(err) => {
                    warn!(node = %node.id, error = %err, "handler error absorbed as failure");
                    Outcome::fail(err.to_string())
                }
            };
            debug!(node = %node.id, status = %outcome.status, "node executed");

            result.events.push(RunEvent {
                node: node.id.clone(),
                status: outcome.status,
                notes: outcome.notes.clone(),
            });
            if !outcome.context_updates.is_empty() {
                context.update(outcome.context_updates.clone());
            }
            if node.flag("goal_gate") && outcome.status == StageStatus::Success {
                satisfied.insert(node.id.clone());
            }
            result.completed_nodes.push(node.id.clone());

            if outcome.status.is_failure() {
                let max_retries = node.max_retries();
                let count = retries.get(&node.id).copied().unwrap_or(0);
                if count < max_retries {
                    let next = count + 1;
                    retries.insert(node.id.clone(), next);
                    // read-only reflection of the engine's counter
                    context.set(format!("internal.retry_count.{}", node.id), next);
                    debug!(node = %node.id, attempt = next, max_retries, "retrying node");
                    continue;
                }
            }

            if node.id == exit {
                break;
            }

            match self.pick_next_node(node, graph, context, &outcome) {
                Some(next) => {
                    debug!(from = %node.id, to = %next, "routing");
                    current = next;
                }
                None => {
                    warn!(node = %node.id, "no eligible outgoing edge");
                    return Err(PipelineError::NoEligibleEdge(node.id.clone()));
                }
            }
        }

        result.goal_gate_satisfied = gate_nodes.iter().all(|gate| satisfied.contains(gate));
        result.context = context.snapshot();
        info!(
            run_id = %run_id,
            nodes = result.completed_nodes.len(),
            goal_gate_satisfied = result.goal_gate_satisfied,
            "pipeline run finished"
        );
        Ok(result)
    }

    /// Layered next-node selection; `None` means no eligible edge.
    fn pick_next_node(
        &self,
        node: &NodeSpec,
        graph: &Graph,
        context: &Context,
        outcome: &Outcome,
    ) -> Option<String> {
        for candidate in &outcome.suggested_next_ids {
            if graph.has_node(candidate) {
                return Some(candidate.clone());
            }
        }
        if outcome.status == StageStatus::Fail {
            if let Some(target) = node.retry_target() {
                if graph.has_node(&target) {
                    return Some(target);
                }
            }
        }

        let candidates: Vec<&EdgeSpec> = graph
            .outgoing(&node.id)
            .into_iter()
            .filter(|edge| edge_allowed(edge, context, graph))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        if let Some(preferred) = outcome.preferred_label.as_deref() {
            for edge in &candidates {
                if edge.label().as_deref() == Some(preferred) {
                    return Some(edge.target.clone());
                }
            }
        }
        // highest weight wins; ties go to the first-declared edge
        let mut best = candidates[0];
        for &edge in &candidates[1..] {
            if edge.weight() > best.weight() {
                best = edge;
            }
        }
        Some(best.target.clone())
    }
}

/// Edge guard interpretation: absent guards pass, boolean attributes
/// are taken literally, string guards go through the evaluator, and
/// anything else fails closed.
fn edge_allowed(edge: &EdgeSpec, context: &Context, graph: &Graph) -> bool {
    match edge.condition() {
        None => true,
        Some(AttrValue::Bool(b)) => *b,
        Some(AttrValue::Str(expr)) => evaluate_condition(Some(expr), context, graph.graph_attrs()),
        Some(_) => false,
    }
}

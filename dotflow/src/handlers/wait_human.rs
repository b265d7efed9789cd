//! Human gate handler

use async_trait::async_trait;

use super::Handler;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{Graph, NodeSpec};
use crate::outcome::Outcome;

/// Resolves a human decision point.
///
/// The answer is read from the `human.gate.answer` context key (seeded
/// by whoever drives the run); absent that, the first labeled outgoing
/// edge is taken as the answer, and "continue" as a last resort. The
/// answer becomes the outcome's preferred label so routing follows the
/// matching edge.
pub struct HumanGateHandler;

#[async_trait]
impl Handler for HumanGateHandler {
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        let answer = context
            .get("human.gate.answer")
            .filter(crate::condition::is_truthy)
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .or_else(|| {
                graph
                    .outgoing(&node.id)
                    .iter()
                    .find_map(|edge| edge.label())
            })
            .unwrap_or_else(|| "continue".to_string());
        context.append_log(format!("Human gate chose '{}'", answer));
        Ok(Outcome::success()
            .with_preferred_label(answer.clone())
            .with_update("human.gate.last_answer", answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gate_graph() -> Graph {
        Graph::parse(
            r#"
            digraph {
                start [shape=Mdiamond];
                gate [shape=hexagon];
                approved; rejected;
                exit [shape=Msquare];
                start -> gate;
                gate -> approved [label="approve"];
                gate -> rejected [label="reject"];
                approved -> exit; rejected -> exit;
            }
        "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_answer_from_context() {
        let graph = gate_graph();
        let context = Context::new();
        context.set("human.gate.answer", "reject");
        let node = graph.node("gate").unwrap();
        let outcome = HumanGateHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(outcome.preferred_label.as_deref(), Some("reject"));
        assert_eq!(
            outcome.context_updates.get("human.gate.last_answer"),
            Some(&json!("reject"))
        );
    }

    #[tokio::test]
    async fn test_answer_defaults_to_first_label() {
        let graph = gate_graph();
        let context = Context::new();
        let node = graph.node("gate").unwrap();
        let outcome = HumanGateHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(outcome.preferred_label.as_deref(), Some("approve"));
    }

    #[tokio::test]
    async fn test_answer_falls_back_to_continue() {
        let graph = Graph::parse(
            "digraph { start [shape=Mdiamond]; gate [shape=hexagon]; exit [shape=Msquare]; gate -> exit; start -> gate; }",
        )
        .unwrap();
        let context = Context::new();
        let node = graph.node("gate").unwrap();
        let outcome = HumanGateHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(outcome.preferred_label.as_deref(), Some("continue"));
    }
}

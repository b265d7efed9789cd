//! Structural and bookkeeping handlers
//!
//! Start, exit, conditional, and the parallel family. The parallel
//! handlers record branch metadata without scheduling concurrent work;
//! branch evaluation stays sequential.

use async_trait::async_trait;

use super::Handler;
use crate::condition::evaluate_condition;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{AttrValue, Graph, NodeSpec};
use crate::outcome::Outcome;

/// Marks the beginning of a run.
pub struct StartHandler;

#[async_trait]
impl Handler for StartHandler {
    async fn execute(
        &self,
        _node: &NodeSpec,
        context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        context.append_log("Pipeline started");
        Ok(Outcome::success().with_notes("Start node"))
    }
}

/// Marks the end of a run.
pub struct ExitHandler;

#[async_trait]
impl Handler for ExitHandler {
    async fn execute(
        &self,
        _node: &NodeSpec,
        context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        context.append_log("Pipeline completed");
        Ok(Outcome::success().with_notes("Exit node"))
    }
}

/// Evaluates the node's `condition` attribute and records the verdict.
pub struct ConditionalHandler;

#[async_trait]
impl Handler for ConditionalHandler {
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        let matches = match node.attrs.get("condition") {
            None => true,
            Some(AttrValue::Bool(b)) => *b,
            Some(AttrValue::Str(expr)) => {
                evaluate_condition(Some(expr), context, graph.graph_attrs())
            }
            Some(other) => evaluate_condition(Some(&other.to_string()), context, graph.graph_attrs()),
        };
        context.append_log(format!("Conditional {} evaluated to {}", node.id, matches));
        Ok(Outcome::success().with_update("last_condition", matches))
    }
}

/// Records branch targets; branches execute sequentially by design.
pub struct ParallelHandler;

#[async_trait]
impl Handler for ParallelHandler {
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        context.append_log("Parallel node executed (branches will be evaluated sequentially)");
        let branches = graph
            .outgoing(&node.id)
            .iter()
            .map(|edge| edge.target.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Ok(Outcome::success().with_update(format!("parallel.{}.branches", node.id), branches))
    }
}

/// Join point for a parallel fan-out.
pub struct FanInHandler;

#[async_trait]
impl Handler for FanInHandler {
    async fn execute(
        &self,
        _node: &NodeSpec,
        context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        context.append_log("Parallel fan-in node reached");
        Ok(Outcome::success().with_notes("Fan-in merged branches"))
    }
}

/// Placeholder step for manager-loop stacks.
pub struct ManagerLoopHandler;

#[async_trait]
impl Handler for ManagerLoopHandler {
    async fn execute(
        &self,
        _node: &NodeSpec,
        context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        context.append_log("Manager loop handler observed");
        Ok(Outcome::success().with_notes("Manager loop step"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::StageStatus;
    use serde_json::json;

    fn linear_graph() -> Graph {
        Graph::parse(
            r#"
            digraph {
                start [shape=Mdiamond];
                fork [shape=component];
                a; b;
                exit [shape=Msquare];
                fork -> a;
                fork -> b;
                start -> fork;
                a -> exit; b -> exit;
            }
        "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_and_exit_log() {
        let graph = linear_graph();
        let context = Context::new();
        let node = graph.node("start").unwrap();
        let outcome = StartHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(outcome.status, StageStatus::Success);

        let node = graph.node("exit").unwrap();
        ExitHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(context.logs(), vec!["Pipeline started", "Pipeline completed"]);
    }

    #[tokio::test]
    async fn test_conditional_expression() {
        let graph = linear_graph();
        let context = Context::new();
        context.set("approved", true);
        let node = NodeSpec::new("check")
            .with_attr("condition", AttrValue::Str("context.approved".into()));
        let outcome = ConditionalHandler
            .execute(&node, &context, &graph)
            .await
            .unwrap();
        assert_eq!(outcome.context_updates.get("last_condition"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_conditional_bool_attr_and_absent() {
        let graph = linear_graph();
        let context = Context::new();

        let node = NodeSpec::new("check").with_attr("condition", AttrValue::Bool(false));
        let outcome = ConditionalHandler
            .execute(&node, &context, &graph)
            .await
            .unwrap();
        assert_eq!(outcome.context_updates.get("last_condition"), Some(&json!(false)));

        let node = NodeSpec::new("check");
        let outcome = ConditionalHandler
            .execute(&node, &context, &graph)
            .await
            .unwrap();
        assert_eq!(outcome.context_updates.get("last_condition"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_parallel_records_branches() {
        let graph = linear_graph();
        let context = Context::new();
        let node = graph.node("fork").unwrap();
        let outcome = ParallelHandler.execute(node, &context, &graph).await.unwrap();
        assert_eq!(
            outcome.context_updates.get("parallel.fork.branches"),
            Some(&json!("a,b"))
        );
    }

    #[tokio::test]
    async fn test_fan_in_and_manager_loop() {
        let graph = linear_graph();
        let context = Context::new();
        let node = NodeSpec::new("join");
        assert_eq!(
            FanInHandler
                .execute(&node, &context, &graph)
                .await
                .unwrap()
                .status,
            StageStatus::Success
        );
        assert_eq!(
            ManagerLoopHandler
                .execute(&node, &context, &graph)
                .await
                .unwrap()
                .status,
            StageStatus::Success
        );
    }
}

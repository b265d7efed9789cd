//! End-to-end engine tests against the default handler registry
//!
//! These runs go through the full stack: DOT parsing, the stub-backed
//! codergen handler, guard evaluation, retries, and routing.

use std::sync::Arc;

use async_trait::async_trait;
use dotflow::handlers::{default_registry, Handler, HandlerRegistry};
use dotflow::{
    AgentLoop, Client, Context, Graph, Outcome, PipelineEngine, PipelineError, StageStatus,
    StubProvider,
};

fn stub_registry() -> HandlerRegistry {
    let client = Client::new()
        .with_provider(Arc::new(StubProvider::new()))
        .with_default_provider("stub");
    default_registry(AgentLoop::new(client))
}

struct AlwaysFailHandler;

#[async_trait]
impl Handler for AlwaysFailHandler {
    async fn execute(
        &self,
        _node: &dotflow::NodeSpec,
        _context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        Ok(Outcome::fail("synthetic failure"))
    }
}

#[tokio::test]
async fn full_run_with_default_registry() {
    let graph = Graph::parse(
        r#"
        digraph pipeline {
            goal="demo goal";
            start [shape=Mdiamond];
            work [shape=box, prompt="Summarize: $goal"];
            check [shape=diamond, condition="context.last_response != ''"];
            exit [shape=Msquare];
            start -> work;
            work -> check;
            check -> exit;
        }
    "#,
    )
    .unwrap();
    let engine = PipelineEngine::new(stub_registry());
    let context = Context::new();
    let result = engine.run(&graph, &context).await.unwrap();

    assert_eq!(result.completed_nodes, vec!["start", "work", "check", "exit"]);
    assert!(result.goal_gate_satisfied);
    assert_eq!(result.context.get("graph.goal").unwrap(), "demo goal");
    assert_eq!(
        result.context.get("last_response").unwrap(),
        "Stub provider response for prompt: Summarize: demo goal"
    );
    assert_eq!(result.context.get("last_condition").unwrap(), true);
    assert!(result
        .events
        .iter()
        .all(|event| event.status == StageStatus::Success));
    let logs = context.logs();
    assert_eq!(logs.first().map(String::as_str), Some("Pipeline started"));
    assert_eq!(logs.last().map(String::as_str), Some("Pipeline completed"));
}

#[tokio::test]
async fn failing_node_retries_once_then_run_completes() {
    // start -> a(max_retries=1, always FAIL) -> exit: the unconditional
    // edge is status-agnostic, so the run still reaches the exit
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            a [shape=box, type="flaky", max_retries=1];
            exit [shape=Msquare];
            start -> a;
            a -> exit;
        }
    "#,
    )
    .unwrap();
    let mut registry = stub_registry();
    registry.register("flaky", Arc::new(AlwaysFailHandler));
    let engine = PipelineEngine::new(registry);
    let context = Context::new();
    let result = engine.run(&graph, &context).await.unwrap();

    assert_eq!(result.completed_nodes, vec!["start", "a", "a", "exit"]);
    assert!(result.goal_gate_satisfied);
    assert_eq!(result.context.get("internal.retry_count.a").unwrap(), 1);
    let fail_events = result
        .events
        .iter()
        .filter(|event| event.status == StageStatus::Fail)
        .count();
    assert_eq!(fail_events, 2);
}

#[tokio::test]
async fn failed_goal_gate_reports_unsatisfied_run() {
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            gate [shape=box, type="flaky", goal_gate=true];
            exit [shape=Msquare];
            start -> gate;
            gate -> exit;
        }
    "#,
    )
    .unwrap();
    let mut registry = stub_registry();
    registry.register("flaky", Arc::new(AlwaysFailHandler));
    let engine = PipelineEngine::new(registry);
    let result = engine.run(&graph, &Context::new()).await.unwrap();

    assert_eq!(result.completed_nodes.last().map(String::as_str), Some("exit"));
    assert!(!result.goal_gate_satisfied);
}

#[tokio::test]
async fn human_gate_routes_by_seeded_answer() {
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            gate [shape=hexagon];
            approved [shape=box];
            rejected [shape=box];
            exit [shape=Msquare];
            start -> gate;
            gate -> approved [label="approve", weight=1];
            gate -> rejected [label="reject", weight=5];
            approved -> exit;
            rejected -> exit;
        }
    "#,
    )
    .unwrap();
    let engine = PipelineEngine::new(stub_registry());

    let context = Context::new();
    context.set("human.gate.answer", "approve");
    let result = engine.run(&graph, &context).await.unwrap();
    // the preferred label wins over the heavier "reject" edge
    assert!(result.completed_nodes.contains(&"approved".to_string()));
    assert!(!result.completed_nodes.contains(&"rejected".to_string()));
    assert_eq!(result.context.get("human.gate.last_answer").unwrap(), "approve");
}

#[tokio::test]
async fn tool_node_feeds_guards_downstream() {
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            probe [shape=parallelogram, tool_command="echo ready"];
            go [shape=box];
            stall [shape=box];
            exit [shape=Msquare];
            start -> probe;
            probe -> go [condition="context['tool.output'] == 'ready'"];
            probe -> stall [condition="context['tool.output'] != 'ready'"];
            go -> exit;
            stall -> exit;
        }
    "#,
    )
    .unwrap();
    let engine = PipelineEngine::new(stub_registry());
    let result = engine.run(&graph, &Context::new()).await.unwrap();
    assert!(result.completed_nodes.contains(&"go".to_string()));
    assert!(!result.completed_nodes.contains(&"stall".to_string()));
}

#[tokio::test]
async fn parallel_nodes_record_branches_sequentially() {
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            fork [shape=component];
            left [shape=box];
            join [shape=tripleoctagon];
            exit [shape=Msquare];
            start -> fork;
            fork -> left;
            left -> join;
            join -> exit;
        }
    "#,
    )
    .unwrap();
    let engine = PipelineEngine::new(stub_registry());
    let result = engine.run(&graph, &Context::new()).await.unwrap();
    assert_eq!(
        result.completed_nodes,
        vec!["start", "fork", "left", "join", "exit"]
    );
    assert_eq!(result.context.get("parallel.fork.branches").unwrap(), "left");
}

#[tokio::test]
async fn routing_dead_end_aborts_but_context_remains_inspectable() {
    let graph = Graph::parse(
        r#"
        digraph {
            start [shape=Mdiamond];
            work [shape=box];
            exit [shape=Msquare];
            start -> work;
            work -> exit [condition="context.blocked == false"];
        }
    "#,
    )
    .unwrap();
    let engine = PipelineEngine::new(stub_registry());
    let context = Context::new();
    context.set("blocked", true);
    let err = engine.run(&graph, &context).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoEligibleEdge(node) if node == "work"));
    // progress up to the dead end is still visible on the context
    assert!(context.get("last_response").is_some());
    assert!(!context.logs().is_empty());
}

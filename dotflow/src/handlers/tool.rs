//! Tool execution handler

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::Handler;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{AttrValue, Graph, NodeSpec};
use crate::outcome::Outcome;

const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Runs the node's `tool_command` in a shell, bounded by the node's
/// `timeout` attribute (duration literal or seconds, default 10s).
///
/// Stdout and stderr land in `tool.output` / `tool.stderr`. A nonzero
/// exit, spawn failure, or timeout yields a failed outcome; the
/// engine's retry and fallback policy decides what happens next.
pub struct ToolHandler;

fn timeout_seconds(node: &NodeSpec) -> f64 {
    match node.attrs.get("timeout") {
        Some(AttrValue::Duration(d)) => d.to_seconds(),
        Some(AttrValue::Int(i)) => *i as f64,
        Some(AttrValue::Float(f)) => *f,
        Some(AttrValue::Str(s)) => s.trim().parse().unwrap_or(DEFAULT_TIMEOUT_SECS),
        _ => DEFAULT_TIMEOUT_SECS,
    }
}

#[async_trait]
impl Handler for ToolHandler {
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        _graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        let Some(command) = node.string_attr("tool_command") else {
            return Ok(Outcome::fail("tool_command attribute is missing"));
        };
        context.append_log(format!("Executing tool command: {}", command));

        let timeout = Duration::from_secs_f64(timeout_seconds(node).max(0.0));
        let run = Command::new("sh").arg("-c").arg(&command).output();
        let output = match tokio::time::timeout(timeout, run).await {
            Err(_) => {
                return Ok(Outcome::fail(format!(
                    "command timed out after {:?}",
                    timeout
                )));
            }
            Ok(Err(err)) => return Ok(Outcome::fail(err.to_string())),
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout_len = stdout.len();
        let base = Outcome::success()
            .with_update("tool.output", stdout)
            .with_update("tool.stderr", stderr);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let mut failed = Outcome::fail(format!("Command exited {}", code));
            failed.context_updates = base.context_updates;
            return Ok(failed);
        }
        Ok(base.with_notes(format!("Command completed with {} bytes", stdout_len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::StageStatus;
    use serde_json::json;

    fn empty_graph() -> Graph {
        Graph::parse("digraph { start [shape=Mdiamond]; exit [shape=Msquare]; start -> exit; }")
            .unwrap()
    }

    #[tokio::test]
    async fn test_command_success_captures_output() {
        let graph = empty_graph();
        let context = Context::new();
        let node = NodeSpec::new("t")
            .with_attr("tool_command", AttrValue::Str("echo hello".into()));
        let outcome = ToolHandler.execute(&node, &context, &graph).await.unwrap();
        assert_eq!(outcome.status, StageStatus::Success);
        assert_eq!(outcome.context_updates.get("tool.output"), Some(&json!("hello")));
        assert_eq!(outcome.context_updates.get("tool.stderr"), Some(&json!("")));
        assert!(outcome.notes.contains("5 bytes"));
    }

    #[tokio::test]
    async fn test_missing_command_fails() {
        let graph = empty_graph();
        let context = Context::new();
        let node = NodeSpec::new("t");
        let outcome = ToolHandler.execute(&node, &context, &graph).await.unwrap();
        assert_eq!(outcome.status, StageStatus::Fail);
        assert_eq!(
            outcome.failure_reason.as_deref(),
            Some("tool_command attribute is missing")
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_with_output() {
        let graph = empty_graph();
        let context = Context::new();
        let node = NodeSpec::new("t")
            .with_attr("tool_command", AttrValue::Str("echo oops >&2; exit 3".into()));
        let outcome = ToolHandler.execute(&node, &context, &graph).await.unwrap();
        assert_eq!(outcome.status, StageStatus::Fail);
        assert_eq!(outcome.failure_reason.as_deref(), Some("Command exited 3"));
        assert_eq!(outcome.context_updates.get("tool.stderr"), Some(&json!("oops")));
    }

    #[tokio::test]
    async fn test_timeout_fails() {
        let graph = empty_graph();
        let context = Context::new();
        let node = NodeSpec::new("t")
            .with_attr("tool_command", AttrValue::Str("sleep 5".into()))
            .with_attr(
                "timeout",
                AttrValue::Duration(crate::graph::DurationValue::new(
                    100,
                    crate::graph::DurationUnit::Ms,
                )),
            );
        let outcome = ToolHandler.execute(&node, &context, &graph).await.unwrap();
        assert_eq!(outcome.status, StageStatus::Fail);
        assert!(outcome
            .failure_reason
            .as_deref()
            .unwrap_or_default()
            .contains("timed out"));
    }

    #[test]
    fn test_timeout_attribute_decoding() {
        let node = NodeSpec::new("t").with_attr("timeout", AttrValue::Int(30));
        assert_eq!(timeout_seconds(&node), 30.0);
        let node = NodeSpec::new("t").with_attr("timeout", AttrValue::Float(1.5));
        assert_eq!(timeout_seconds(&node), 1.5);
        let node = NodeSpec::new("t");
        assert_eq!(timeout_seconds(&node), DEFAULT_TIMEOUT_SECS);
    }
}

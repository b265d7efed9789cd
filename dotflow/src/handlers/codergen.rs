//! LLM generation handler

use async_trait::async_trait;

use super::Handler;
use crate::agent::AgentLoop;
use crate::context::Context;
use crate::error::PipelineError;
use crate::graph::{Graph, NodeSpec};
use crate::outcome::Outcome;

/// Runs one agent completion for the node's prompt.
///
/// The prompt comes from the `prompt` attribute, falling back to `label`
/// and finally the node id; `$goal` expands to the graph goal.
pub struct CodergenHandler {
    agent: AgentLoop,
}

impl CodergenHandler {
    pub fn new(agent: AgentLoop) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Handler for CodergenHandler {
    async fn execute(
        &self,
        node: &NodeSpec,
        context: &Context,
        graph: &Graph,
    ) -> Result<Outcome, PipelineError> {
        let template = node
            .string_attr("prompt")
            .or_else(|| node.string_attr("label"))
            .unwrap_or_else(|| node.id.clone());
        let prompt = template.replace("$goal", &graph.goal());
        let response = self.agent.run(&prompt).await?;
        context.append_log(format!("{}: {}", node.id, response));
        Ok(Outcome::success()
            .with_update("last_response", response)
            .with_notes("LLM generation completed"))
    }
}

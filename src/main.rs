//! Command-line runner for DOT-defined pipelines
//!
//! Loads a pipeline definition, seeds the run context from `key=value`
//! pairs, executes the graph with the default handler registry, and
//! prints a run report.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dotflow::{
    default_registry, AgentLoop, Client, Context, Graph, PipelineEngine, RunResult, StubProvider,
};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "dotflow",
    version,
    about = "Run a DOT-defined pipeline graph to completion"
)]
struct Args {
    /// Path to the pipeline DOT file
    #[arg(value_name = "DOT_FILE")]
    dot: PathBuf,

    /// Extra context entries (format key=value), repeatable
    #[arg(short = 'C', long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// Skip printing the final report (useful for automation)
    #[arg(long)]
    skip_report: bool,

    /// Enable verbose/debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn report(result: &RunResult, context: &Context) -> Result<()> {
    println!("Completed nodes: {}", result.completed_nodes.join(", "));
    println!("Goal gates satisfied: {}", result.goal_gate_satisfied);
    println!("Events:");
    for event in &result.events {
        println!("  - {} [{}] {}", event.node, event.status, event.notes);
    }
    println!("Final context snapshot:");
    println!(
        "{}",
        serde_json::to_string_pretty(&context.snapshot()).context("serializing context")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    if !args.dot.exists() {
        bail!("DOT file {} does not exist", args.dot.display());
    }
    let graph = Graph::parse_file(&args.dot)
        .with_context(|| format!("parsing {}", args.dot.display()))?;
    let context = Context::from_pairs(&args.context)?;

    let settings = Config::from_env();
    info!(provider = %settings.provider, model = %settings.model, "configured agent backend");
    let client = Client::new()
        .with_provider(Arc::new(StubProvider::new()))
        .with_default_provider("stub");
    let agent = AgentLoop::new(client)
        .with_provider(settings.provider)
        .with_model(settings.model);

    let engine = PipelineEngine::new(default_registry(agent));
    let result = engine.run(&graph, &context).await?;

    if !args.skip_report {
        report(&result, &context)?;
    }
    Ok(())
}

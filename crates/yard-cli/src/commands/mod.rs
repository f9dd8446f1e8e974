//! CLI command implementations.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use yard_config::{EvalContext, EvalContextBuilder};
use yard_core::{Config, DependencyGraph, Status};

/// Build the evaluation context, preferring an explicit state directory.
pub fn eval_context(state_dir: Option<PathBuf>) -> EvalContext {
    let builder = EvalContextBuilder::from_process();
    match state_dir {
        Some(dir) => builder.with_state_dir(dir).build(),
        None => builder.build(),
    }
}

fn load(folder: &Path, ctx: &EvalContext) -> Result<Config> {
    debug!(folder = %folder.display(), state_dir = %ctx.state_dir().display(), "loading blueprint");
    let config = yard_config::load(folder, ctx)
        .with_context(|| format!("invalid blueprint in {}", folder.display()))?;
    debug!(resources = config.resource_count(), "blueprint loaded");
    Ok(config)
}

pub fn validate(folder: &Path, ctx: &EvalContext) -> Result<()> {
    let config = load(folder, ctx)?;
    if let Some(blueprint) = config.blueprint() {
        println!("Blueprint: {}", blueprint.title);
    }
    println!(
        "Configuration is valid ({} resources)",
        config.resource_count()
    );
    Ok(())
}

/// One step of an apply plan.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub address: String,
    pub status: Status,
    pub depends_on: Vec<String>,
}

/// Resources in apply order with their resolved dependencies.
pub fn plan_entries(config: &Config) -> Result<Vec<PlanEntry>> {
    let graph = DependencyGraph::build(config)?;

    let entries = graph
        .topological_order()
        .iter()
        .filter_map(|&index| {
            let resource = config.get(index)?;
            let depends_on = graph
                .dependencies_of(index)
                .iter()
                .filter_map(|&dep| graph.address(dep))
                .map(ToString::to_string)
                .collect();
            Some(PlanEntry {
                address: resource.address().to_string(),
                status: resource.status(),
                depends_on,
            })
        })
        .collect();

    Ok(entries)
}

pub fn plan(folder: &Path, ctx: &EvalContext, json: bool) -> Result<()> {
    let config = load(folder, ctx)?;
    let entries = plan_entries(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, entry.address, entry.status);
        if !entry.depends_on.is_empty() {
            println!("       depends on: {}", entry.depends_on.join(", "));
        }
    }
    Ok(())
}

pub fn graph(folder: &Path, ctx: &EvalContext) -> Result<()> {
    let config = load(folder, ctx)?;
    let graph = DependencyGraph::build(&config)?;
    print!("{}", graph.to_dot());
    Ok(())
}

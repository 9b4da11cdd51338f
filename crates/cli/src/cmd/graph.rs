//! Implementation of the `specbuild graph` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use specbuild_lib::pipeline::BuildPlan;

use crate::output::{OutputFormat, print_json, symbols};

/// Print every node with its dependencies, then the execution waves.
pub fn cmd_graph(root: &Path, output: OutputFormat) -> Result<()> {
  let plan = BuildPlan::load(root).context("Failed to load project")?;
  let graph = &plan.graph;
  let waves = graph.execution_waves().context("Failed to schedule build graph")?;

  if output.is_json() {
    let nodes: Vec<_> = graph.nodes().collect();
    return print_json(&serde_json::json!({
      "nodes": nodes,
      "waves": waves,
    }));
  }

  for node in graph.nodes() {
    println!(
      "{} {}",
      node.id.if_supports_color(Stream::Stdout, |s| s.cyan()),
      format!("({})", node.kind).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    for dep in &node.depends_on {
      println!("    {} {}", symbols::ARROW, dep);
    }
  }

  println!();
  for (i, wave) in waves.iter().enumerate() {
    let ids: Vec<&str> = wave.iter().map(|id| id.as_str()).collect();
    println!("Wave {}: {}", i + 1, ids.join(", "));
  }

  Ok(())
}

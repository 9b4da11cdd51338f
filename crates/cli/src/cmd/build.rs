//! Implementation of the `specbuild build` command.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use specbuild_lib::execute::{ExecuteError, GraphResult};
use specbuild_lib::pipeline::BuildPlan;
use specbuild_lib::toolchain::ToolError;

use super::{execute_config, runtime};
use crate::output::{
  OutputFormat, format_duration, print_error, print_json, print_skipped, print_stat, print_success, print_tool_output,
};

/// Run the whole graph and summarize what happened.
///
/// Returns an error (and so a non-zero exit) unless every task completed.
pub fn cmd_build(root: &Path, fail_fast: bool, jobs: Option<usize>, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let plan = BuildPlan::load(root).context("Failed to load project")?;
  let toolchain = Arc::new(plan.toolchain());
  let config = execute_config(fail_fast, jobs);

  let rt = runtime()?;
  let result = rt.block_on(plan.build(toolchain, &config)).context("Build failed")?;

  if output.is_json() {
    print_json(&build_json(&result))?;
  } else {
    print_build_summary(&result);
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if !result.is_success() {
    bail!("build failed: {} task(s) failed", result.failed.len());
  }
  Ok(())
}

/// Print failures, skipped tasks and totals of a build.
pub(super) fn print_build_summary(result: &GraphResult) {
  for err in result.failed.values() {
    print_error(&err.to_string());
    if let ExecuteError::Tool {
      source: ToolError::Failed { stderr, .. },
      ..
    } = err
    {
      print_tool_output(stderr);
    }
  }
  for (task, dependency) in &result.skipped {
    print_skipped(&format!("{} skipped: dependency {} did not complete", task, dependency));
  }
  for task in &result.cancelled {
    print_skipped(&format!("{} cancelled", task));
  }

  if result.is_success() {
    print_success(&format!("Build complete: {} task(s)", result.completed.len()));
  } else {
    println!("Build finished with failures");
  }
  print_stat("Completed", &result.completed.len().to_string());
  print_stat("Failed", &result.failed.len().to_string());
  print_stat("Skipped", &result.skipped.len().to_string());
  if !result.cancelled.is_empty() {
    print_stat("Cancelled", &result.cancelled.len().to_string());
  }
}

pub(super) fn build_json(result: &GraphResult) -> Value {
  let completed: Vec<Value> = result
    .completed
    .iter()
    .map(|(task, elapsed)| json!({ "task": task, "duration_ms": elapsed.as_millis() as u64 }))
    .collect();
  let failed: Vec<Value> = result
    .failed
    .iter()
    .map(|(task, err)| json!({ "task": task, "error": err.to_string() }))
    .collect();
  let skipped: Vec<Value> = result
    .skipped
    .iter()
    .map(|(task, dependency)| json!({ "task": task, "dependency": dependency.0 }))
    .collect();

  json!({
    "success": result.is_success(),
    "completed": completed,
    "failed": failed,
    "skipped": skipped,
    "cancelled": result.cancelled,
  })
}

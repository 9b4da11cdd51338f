//! Types for graph execution.
//!
//! This module defines the error types, result types, and configuration
//! for running a [`BuildGraph`](crate::graph::BuildGraph).

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use thiserror::Error;

use crate::graph::{GraphError, TaskId};
use crate::toolchain::ToolError;

/// The failed node that caused a task to be skipped.
///
/// This is the direct dependency of the skipped task, which may itself have
/// been skipped; following the chain leads to the node that actually failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDependency(pub TaskId);

impl std::fmt::Display for FailedDependency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Errors that can occur during graph execution.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The graph could not be scheduled.
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// The toolchain failed while running a task.
  #[error("task {task} failed: {source}")]
  Tool {
    task: TaskId,
    #[source]
    source: ToolError,
  },

  /// The task panicked.
  #[error("task {0} panicked")]
  TaskPanicked(TaskId),

  /// The task could not acquire an execution slot.
  #[error("task {0} was cancelled")]
  Cancelled(TaskId),
}

/// Outcome of running a whole graph.
#[derive(Debug, Default)]
pub struct GraphResult {
  /// Tasks that succeeded, with their wall-clock duration.
  pub completed: BTreeMap<TaskId, Duration>,

  /// Tasks that failed.
  pub failed: BTreeMap<TaskId, ExecuteError>,

  /// Tasks skipped because a dependency failed or was skipped.
  pub skipped: BTreeMap<TaskId, FailedDependency>,

  /// Tasks never attempted because execution stopped early (`fail_fast`).
  pub cancelled: BTreeSet<TaskId>,
}

impl GraphResult {
  /// Returns true if every task completed.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty() && self.cancelled.is_empty()
  }

  /// Returns true if the task completed in this run.
  pub fn is_completed(&self, id: &TaskId) -> bool {
    self.completed.contains_key(id)
  }

  /// Total number of tasks accounted for.
  pub fn total(&self) -> usize {
    self.completed.len() + self.failed.len() + self.skipped.len() + self.cancelled.len()
  }
}

/// Configuration for graph execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of tasks to run in parallel.
  pub parallelism: usize,

  /// Stop scheduling new waves after the first failure.
  pub fail_fast: bool,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      fail_fast: false,
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn result_success_when_empty() {
    let result = GraphResult::default();
    assert!(result.is_success());
    assert_eq!(result.total(), 0);
  }

  #[test]
  fn result_success_with_completed_task() {
    let mut result = GraphResult::default();
    result.completed.insert(TaskId::from("build"), Duration::ZERO);
    assert!(result.is_success());
    assert!(result.is_completed(&TaskId::from("build")));
    assert!(!result.is_completed(&TaskId::from("jar-Orders")));
    assert_eq!(result.total(), 1);
  }

  #[test]
  fn result_failure_with_failed_task() {
    let mut result = GraphResult::default();
    result.failed.insert(
      TaskId::from("generate-Orders"),
      ExecuteError::Tool {
        task: TaskId::from("generate-Orders"),
        source: ToolError::Failed {
          command: "openapi-generator-cli generate".to_string(),
          code: Some(1),
          stderr: String::new(),
        },
      },
    );
    assert!(!result.is_success());
    assert_eq!(result.total(), 1);
  }

  #[test]
  fn result_failure_with_skipped_or_cancelled() {
    let mut result = GraphResult::default();
    result.skipped.insert(
      TaskId::from("jar-Orders"),
      FailedDependency(TaskId::from("compileOrdersJava")),
    );
    assert!(!result.is_success());

    let mut result = GraphResult::default();
    result.cancelled.insert(TaskId::from("jar-Orders"));
    assert!(!result.is_success());
    assert_eq!(result.total(), 1);
  }

  #[test]
  fn failed_dependency_display() {
    let dep = FailedDependency(TaskId::from("generate-Orders"));
    assert_eq!(format!("{}", dep), "generate-Orders");
  }

  #[test]
  fn execute_config_default() {
    let config = ExecuteConfig::default();
    assert!(config.parallelism >= 1);
    assert!(!config.fail_fast);
  }
}

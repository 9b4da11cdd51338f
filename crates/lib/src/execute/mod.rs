//! Graph execution.
//!
//! Runs a [`BuildGraph`] wave by wave:
//! - nodes of one wave run concurrently, bounded by a semaphore
//! - a node whose dependency failed or was skipped is skipped itself
//! - nodes outside a failure's cone keep running unless `fail_fast` is set

pub mod types;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::graph::{BuildGraph, TaskAction, TaskId, TaskKind, TaskNode};
use crate::toolchain::{Toolchain, run_action};

pub use types::{ExecuteConfig, ExecuteError, FailedDependency, GraphResult};

/// Execute every node of a graph.
///
/// Returns `Err` only when the graph cannot be scheduled. Task failures are
/// reported in the returned [`GraphResult`].
pub async fn execute_graph<T: Toolchain>(
  graph: &BuildGraph,
  toolchain: Arc<T>,
  config: &ExecuteConfig,
) -> Result<GraphResult, ExecuteError> {
  let waves = graph.execution_waves()?;

  info!(nodes = graph.len(), wave_count = waves.len(), "starting graph execution");

  let mut result = GraphResult::default();
  // Failed or skipped; anything depending on these is skipped
  let mut blocked: HashSet<TaskId> = HashSet::new();
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));

  for (wave_idx, wave) in waves.iter().enumerate() {
    let halted = config.fail_fast && !result.failed.is_empty();
    debug!(wave = wave_idx, nodes = wave.len(), halted, "executing wave");

    let mut ready: Vec<TaskNode> = Vec::new();

    for id in wave {
      let failed_dep = graph.dependencies(id).into_iter().find(|dep| blocked.contains(dep));

      if let Some(dep) = failed_dep {
        warn!(task = %id, failed_dep = %dep, "skipping task due to failed dependency");
        result.skipped.insert(id.clone(), FailedDependency(dep));
        blocked.insert(id.clone());
      } else if halted {
        result.cancelled.insert(id.clone());
      } else if let Some(node) = graph.node(id) {
        announce(node);
        ready.push(node.clone());
      }
    }

    if ready.is_empty() {
      continue;
    }

    for (id, outcome) in execute_wave(ready, toolchain.clone(), semaphore.clone()).await {
      match outcome {
        Ok(elapsed) => {
          info!(task = %id, "task succeeded");
          if graph.node(&id).is_some_and(|node| node.kind == TaskKind::Aggregate) {
            info!("{}: all specifications have been generated", id);
          }
          result.completed.insert(id, elapsed);
        }
        Err(e) => {
          error!(task = %id, error = %e, "task failed");
          blocked.insert(id.clone());
          result.failed.insert(id, e);
        }
      }
    }
  }

  info!(
    completed = result.completed.len(),
    failed = result.failed.len(),
    skipped = result.skipped.len(),
    cancelled = result.cancelled.len(),
    "graph execution complete"
  );

  Ok(result)
}

/// Log the lifecycle line for a node about to be scheduled.
fn announce(node: &TaskNode) {
  match &node.action {
    TaskAction::Generate(action) => {
      info!("{}: starting generation from {}", node.id, action.input.display());
    }
    TaskAction::Package(action) => {
      let name = node.spec.as_deref().unwrap_or(node.id.as_str());
      info!("Building JAR for {} -> {}", name, action.output_file.display());
    }
    TaskAction::Compile(_) | TaskAction::None => {}
  }
}

/// Run the nodes of one wave concurrently.
async fn execute_wave<T: Toolchain>(
  nodes: Vec<TaskNode>,
  toolchain: Arc<T>,
  semaphore: Arc<Semaphore>,
) -> Vec<(TaskId, Result<Duration, ExecuteError>)> {
  let mut join_set = JoinSet::new();
  let mut spawned: HashMap<tokio::task::Id, TaskId> = HashMap::new();

  for node in nodes {
    let id = node.id.clone();
    let toolchain = toolchain.clone();
    let semaphore = semaphore.clone();

    let handle = join_set.spawn(async move {
      // Acquire semaphore permit inside the task
      let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|_| ExecuteError::Cancelled(node.id.clone()))?;

      let started = Instant::now();
      run_action(toolchain.as_ref(), &node.action)
        .await
        .map_err(|source| ExecuteError::Tool {
          task: node.id.clone(),
          source,
        })?;

      Ok::<_, ExecuteError>(started.elapsed())
    });
    spawned.insert(handle.id(), id);
  }

  let mut results = Vec::with_capacity(spawned.len());

  while let Some(joined) = join_set.join_next_with_id().await {
    match joined {
      Ok((task_id, outcome)) => {
        if let Some(id) = spawned.remove(&task_id) {
          results.push((id, outcome));
        }
      }
      Err(e) => {
        if let Some(id) = spawned.remove(&e.id()) {
          error!(task = %id, error = %e, "task panicked");
          results.push((id.clone(), Err(ExecuteError::TaskPanicked(id))));
        }
      }
    }
  }

  results
}

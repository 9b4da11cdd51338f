mod build;
mod discover;
mod graph;
mod publish;

use anyhow::{Context, Result};
use specbuild_lib::execute::ExecuteConfig;

pub use build::cmd_build;
pub use discover::cmd_discover;
pub use graph::cmd_graph;
pub use publish::{PublishArgs, cmd_publish};

/// Execution settings from the `--fail-fast` and `--jobs` flags.
fn execute_config(fail_fast: bool, jobs: Option<usize>) -> ExecuteConfig {
  let defaults = ExecuteConfig::default();
  ExecuteConfig {
    parallelism: jobs.filter(|&n| n > 0).unwrap_or(defaults.parallelism),
    fail_fast,
  }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}

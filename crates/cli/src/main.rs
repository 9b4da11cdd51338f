mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// specbuild - Build and publish Java libraries from OpenAPI specifications
#[derive(Parser)]
#[command(name = "specbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v for debug, -vv for trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Project directory
  #[arg(short = 'C', long = "directory", global = true, default_value = ".")]
  directory: PathBuf,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List the specifications found in the project
  Discover,

  /// Show the build graph and its execution waves
  Graph,

  /// Generate, compile and package every specification
  Build {
    /// Stop scheduling new tasks after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Maximum number of tasks to run at once (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
  },

  /// Build, then upload every produced artifact to the repository
  Publish {
    /// Publish artifacts already in the build directory without building
    #[arg(long)]
    no_build: bool,

    /// Show what would be published without uploading
    #[arg(long)]
    dry_run: bool,

    /// Stop scheduling new tasks after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Maximum number of tasks to run at once (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Time limit for each upload request (e.g., "30s", "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
  },
}

fn default_filter(verbose: u8) -> &'static str {
  match verbose {
    0 => "specbuild_lib=info,specbuild=info",
    1 => "specbuild_lib=debug,specbuild=debug",
    _ => "trace",
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let root = dunce::canonicalize(&cli.directory)
    .with_context(|| format!("Project directory not found: {}", cli.directory.display()))?;

  match cli.command {
    Commands::Discover => cmd::cmd_discover(&root, cli.output),
    Commands::Graph => cmd::cmd_graph(&root, cli.output),
    Commands::Build { fail_fast, jobs } => cmd::cmd_build(&root, fail_fast, jobs, cli.output),
    Commands::Publish {
      no_build,
      dry_run,
      fail_fast,
      jobs,
      timeout,
    } => cmd::cmd_publish(
      &root,
      cmd::PublishArgs {
        no_build,
        dry_run,
        fail_fast,
        jobs,
        timeout,
      },
      cli.output,
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }

  #[test]
  fn verbosity_raises_log_level() {
    assert!(default_filter(0).contains("=info"));
    assert!(default_filter(1).contains("=debug"));
    assert_eq!(default_filter(3), "trace");
  }

  #[test]
  fn publish_timeout_parses_humantime() {
    let cli = Cli::try_parse_from(["specbuild", "publish", "--timeout", "90s"]).unwrap();
    match cli.command {
      Commands::Publish { timeout, .. } => assert_eq!(timeout, Some(Duration::from_secs(90))),
      _ => panic!("expected publish"),
    }
  }
}

//! Implementation of the `specbuild publish` command.
//!
//! Credentials are resolved before the build starts, so a missing setting
//! fails the command without running anything. A dry run needs no
//! credentials and uploads nothing.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::debug;

use specbuild_lib::pipeline::{BuildPlan, PublishOptions, publish};
use specbuild_lib::publish::{DEFAULT_UPLOAD_TIMEOUT, MavenRepository};

use super::build::{build_json, print_build_summary};
use super::{execute_config, runtime};
use crate::output::{
  OutputFormat, coordinates, format_bytes, format_duration, print_error, print_info, print_json, print_stat,
  print_success, print_warning, symbols, truncate_hash,
};

/// Flags of the publish command.
#[derive(Debug, Clone)]
pub struct PublishArgs {
  pub no_build: bool,
  pub dry_run: bool,
  pub fail_fast: bool,
  pub jobs: Option<usize>,
  pub timeout: Option<Duration>,
}

pub fn cmd_publish(root: &Path, args: PublishArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let plan = BuildPlan::load(root).context("Failed to load project")?;

  let repository = if args.dry_run {
    None
  } else {
    let credentials = plan
      .resolve_credentials()
      .context("Failed to resolve repository credentials")?;
    let timeout = args.timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT);
    debug!(url = %credentials.url, timeout = ?timeout, "repository configured");
    Some(MavenRepository::with_timeout(credentials, timeout).context("Failed to set up repository client")?)
  };

  let options = PublishOptions {
    skip_build: args.no_build,
    dry_run: args.dry_run,
    execute: execute_config(args.fail_fast, args.jobs),
  };

  let rt = runtime()?;
  let outcome = rt
    .block_on(publish(&plan, Arc::new(plan.toolchain()), repository.as_ref(), &options))
    .context("Publish failed")?;

  if output.is_json() {
    let published = outcome.report.as_ref().map(|report| &report.published);
    let failed: Vec<String> = outcome
      .report
      .iter()
      .flat_map(|report| report.failed.iter().map(ToString::to_string))
      .collect();
    print_json(&json!({
      "success": outcome.is_success(),
      "dry_run": args.dry_run,
      "build": outcome.build.as_ref().map(build_json),
      "descriptors": outcome.descriptors,
      "published": published,
      "failed": failed,
    }))?;
  } else {
    if let Some(build) = &outcome.build {
      print_build_summary(build);
      println!();
    }

    if outcome.descriptors.is_empty() {
      print_warning("No artifacts to publish");
    }

    match &outcome.report {
      None => {
        println!("Dry run - nothing uploaded");
        for descriptor in &outcome.descriptors {
          let size = std::fs::metadata(&descriptor.file).map(|m| m.len()).unwrap_or(0);
          print_info(&format!(
            "{} {} {} ({})",
            descriptor.file.display(),
            symbols::ARROW,
            coordinates(descriptor),
            format_bytes(size)
          ));
        }
      }
      Some(report) => {
        for receipt in &report.published {
          print_success(&format!(
            "{} {} {} (sha256 {})",
            receipt.artifact_id,
            symbols::ARROW,
            receipt.url,
            truncate_hash(&receipt.sha256.0)
          ));
        }
        for failure in &report.failed {
          print_error(&failure.to_string());
        }
        print_stat("Published", &report.published.len().to_string());
        print_stat("Failed", &report.failed.len().to_string());
      }
    }
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if !outcome.is_success() {
    bail!("publish did not complete successfully");
  }
  Ok(())
}

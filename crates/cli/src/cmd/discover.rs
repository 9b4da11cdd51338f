//! Implementation of the `specbuild discover` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use specbuild_lib::naming::NamedSpec;
use specbuild_lib::pipeline::BuildPlan;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Serialize)]
struct DiscoveredSpec<'a> {
  file: String,
  base_name: &'a str,
  package_name: &'a str,
  generate_task: &'a str,
  compile_task: &'a str,
  jar_task: &'a str,
}

/// List every specification, sorted by name, with the names derived from it.
///
/// Fails on naming collisions, like every other command.
pub fn cmd_discover(root: &Path, output: OutputFormat) -> Result<()> {
  let plan = BuildPlan::load(root).context("Failed to load project")?;
  let mut specs: Vec<&NamedSpec> = plan.specs.iter().collect();
  specs.sort_by(|a, b| a.spec.base_name.cmp(&b.spec.base_name));

  if output.is_json() {
    let specs: Vec<DiscoveredSpec> = specs
      .iter()
      .map(|named| DiscoveredSpec {
        file: named.spec.file_name(),
        base_name: &named.spec.base_name,
        package_name: &named.names.package_name,
        generate_task: &named.names.generate_task_id,
        compile_task: &named.names.compile_task_id,
        jar_task: &named.names.jar_task_id,
      })
      .collect();
    return print_json(&specs);
  }

  if specs.is_empty() {
    println!("No specifications found in {}", plan.layout.spec_dir.display());
    return Ok(());
  }

  for named in &specs {
    print_info(&named.spec.file_name());
    print_stat("package", &format!("{}.{}", plan.layout.base_package, named.names.package_name));
    print_stat(
      "tasks",
      &format!(
        "{}, {}, {}",
        named.names.generate_task_id, named.names.compile_task_id, named.names.jar_task_id
      ),
    );
  }
  println!();
  println!("{} specification(s) in {}", specs.len(), plan.layout.spec_dir.display());

  Ok(())
}

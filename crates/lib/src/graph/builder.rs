//! Graph construction from discovered specifications.
//!
//! [`build_graph`] is a pure function: it touches neither the filesystem nor
//! any toolchain, so the whole pipeline shape can be tested without running
//! a generator or compiler.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::dag::BuildGraph;
use super::types::{
  BuildLayout, CompileAction, GenerateAction, GraphError, PackageAction, TaskAction, TaskId, TaskKind, TaskNode,
};
use crate::consts::{AGGREGATE_TASK, ROOT_BUILD_TASK, ROOT_COMPILE_TASK};
use crate::naming::NamedSpec;

/// Generator options for one spec.
///
/// Produces Feign clients and models under
/// `<base_package>.<package_name>.{api,dto,config}`.
pub fn generator_options(base_package: &str, package_name: &str) -> BTreeMap<String, String> {
  let base = format!("{}.{}", base_package, package_name);

  let mut options = BTreeMap::new();
  options.insert("library".to_string(), "spring-cloud".to_string());
  options.insert("skipDefaultInterface".to_string(), "true".to_string());
  options.insert("useBeanValidation".to_string(), "true".to_string());
  options.insert("openApiNullable".to_string(), "false".to_string());
  options.insert("useFeignClientUrl".to_string(), "true".to_string());
  options.insert("useTags".to_string(), "true".to_string());
  options.insert("apiPackage".to_string(), format!("{}.api", base));
  options.insert("modelPackage".to_string(), format!("{}.dto", base));
  options.insert("configPackage".to_string(), format!("{}.config", base));
  options
}

/// Build the generate → compile → package chain for every spec, plus the
/// aggregator and root nodes.
///
/// Specs must already have passed the collision check; a duplicate id that
/// slips through is still rejected as [`GraphError::DuplicateNode`].
pub fn build_graph(specs: &[NamedSpec], layout: &BuildLayout) -> Result<BuildGraph, GraphError> {
  let mut nodes = Vec::with_capacity(specs.len() * 3 + 3);
  let mut generate_ids = Vec::with_capacity(specs.len());
  let mut package_ids = Vec::with_capacity(specs.len());

  for NamedSpec { spec, names } in specs {
    let name = spec.base_name.as_str();
    let generate_id = TaskId::new(&names.generate_task_id);
    let compile_id = TaskId::new(&names.compile_task_id);
    let jar_id = TaskId::new(&names.jar_task_id);

    let generate = GenerateAction {
      input: spec.path.clone(),
      output_dir: layout.generated_dir(name),
      generator: layout.generator.clone(),
      options: generator_options(&layout.base_package, &names.package_name),
    };
    let sources = generate.sources_dir();

    info!("register task {} from {}", generate_id, generate.output_dir.display());

    let mut classpath = layout.classpath.clone();
    classpath.push(sources.clone());
    let classes = layout.classes_dir(&names.source_unit_name);

    nodes.push(TaskNode {
      id: generate_id.clone(),
      kind: TaskKind::Generate,
      spec: Some(name.to_string()),
      depends_on: Default::default(),
      action: TaskAction::Generate(generate),
    });

    nodes.push(TaskNode {
      id: compile_id.clone(),
      kind: TaskKind::Compile,
      spec: Some(name.to_string()),
      depends_on: [generate_id.clone()].into(),
      action: TaskAction::Compile(CompileAction {
        source_dirs: vec![sources],
        classpath,
        destination: classes.clone(),
      }),
    });

    nodes.push(TaskNode {
      id: jar_id.clone(),
      kind: TaskKind::Package,
      spec: Some(name.to_string()),
      depends_on: [compile_id].into(),
      action: TaskAction::Package(PackageAction {
        input_dir: classes,
        output_file: layout.artifact_path(name),
      }),
    });

    generate_ids.push(generate_id);
    package_ids.push(jar_id);
  }

  nodes.push(TaskNode::barrier(AGGREGATE_TASK, TaskKind::Aggregate, generate_ids));
  nodes.push(TaskNode::barrier(
    ROOT_COMPILE_TASK,
    TaskKind::Root,
    [TaskId::from(AGGREGATE_TASK)],
  ));
  nodes.push(TaskNode::barrier(ROOT_BUILD_TASK, TaskKind::Root, package_ids));

  let graph = BuildGraph::from_nodes(nodes)?;
  debug!(nodes = graph.len(), specs = specs.len(), "build graph constructed");

  Ok(graph)
}

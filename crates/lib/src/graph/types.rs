//! Types for the build graph.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Identifier of a task node (e.g. `generate-PersonApi`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub String);

impl TaskId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for TaskId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for TaskId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

/// The role a node plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
  Generate,
  Compile,
  Package,
  Aggregate,
  Root,
}

impl std::fmt::Display for TaskKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      TaskKind::Generate => "generate",
      TaskKind::Compile => "compile",
      TaskKind::Package => "package",
      TaskKind::Aggregate => "aggregate",
      TaskKind::Root => "root",
    };
    write!(f, "{}", name)
  }
}

/// Inputs of a code generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateAction {
  /// Specification file to generate from.
  pub input: PathBuf,
  /// Isolated output tree for this spec.
  pub output_dir: PathBuf,
  /// Generator name (e.g. `spring`).
  pub generator: String,
  /// Generator options, fixed per spec.
  pub options: BTreeMap<String, String>,
}

impl GenerateAction {
  /// Directory the generator writes Java sources into.
  pub fn sources_dir(&self) -> PathBuf {
    java_sources(&self.output_dir)
  }
}

/// Inputs of an isolated compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileAction {
  /// Source roots; only this spec's generated sources.
  pub source_dirs: Vec<PathBuf>,
  /// Shared classpath plus this spec's generated sources.
  pub classpath: Vec<PathBuf>,
  pub destination: PathBuf,
}

/// Inputs of a packaging step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageAction {
  pub input_dir: PathBuf,
  /// The single archive this spec produces.
  pub output_file: PathBuf,
}

/// Work performed by a node when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskAction {
  Generate(GenerateAction),
  Compile(CompileAction),
  Package(PackageAction),
  /// Fan-in and root nodes have no effect of their own.
  None,
}

/// A node of the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNode {
  pub id: TaskId,
  pub kind: TaskKind,
  /// Base name of the spec this node belongs to, if any.
  pub spec: Option<String>,
  pub depends_on: BTreeSet<TaskId>,
  pub action: TaskAction,
}

impl TaskNode {
  /// A node without an action, used for fan-in and root nodes.
  pub fn barrier(id: impl Into<String>, kind: TaskKind, depends_on: impl IntoIterator<Item = TaskId>) -> Self {
    Self {
      id: TaskId::new(id),
      kind,
      spec: None,
      depends_on: depends_on.into_iter().collect(),
      action: TaskAction::None,
    }
  }
}

/// Directory layout of a project, resolved against its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
  pub spec_dir: PathBuf,
  pub build_dir: PathBuf,
  pub base_package: String,
  pub generator: String,
  /// Shared classpath entries.
  pub classpath: Vec<PathBuf>,
}

impl BuildLayout {
  /// Generator output tree for a spec.
  pub fn generated_dir(&self, name: &str) -> PathBuf {
    self.build_dir.join("generated-sources").join("openapi").join(name)
  }

  /// Compiled classes for a spec.
  pub fn classes_dir(&self, name: &str) -> PathBuf {
    self.build_dir.join("classes").join(name)
  }

  /// Shared artifact output directory.
  pub fn libs_dir(&self) -> PathBuf {
    self.build_dir.join("libs")
  }

  /// The archive a spec's package node writes.
  pub fn artifact_path(&self, name: &str) -> PathBuf {
    self
      .libs_dir()
      .join(format!("{}.{}", name, crate::consts::ARTIFACT_EXTENSION))
  }
}

pub(crate) fn java_sources(output_dir: &std::path::Path) -> PathBuf {
  output_dir.join("src").join("main").join("java")
}

/// Errors from graph construction and traversal.
#[derive(Debug, Error)]
pub enum GraphError {
  /// Two nodes share an id.
  #[error("duplicate task id: {0}")]
  DuplicateNode(TaskId),

  /// A node depends on an id that is not in the graph.
  #[error("task {task} depends on unknown task {dependency}")]
  UnknownDependency { task: TaskId, dependency: TaskId },

  /// Cycle detected in the dependency graph.
  #[error("dependency cycle detected")]
  CycleDetected,
}

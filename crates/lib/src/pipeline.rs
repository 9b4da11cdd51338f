//! End-to-end runs.
//!
//! A run has three phases:
//! - configuration: load the project file, discover specs, check names and
//!   build the graph (plus resolve credentials when publishing)
//! - execution: run the graph against a toolchain
//! - publishing: resolve artifacts and upload them
//!
//! The configuration phase completes before any task executes, so a bad
//! project file, a naming collision or missing credentials abort the run
//! without side effects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, ProjectConfig};
use crate::discovery::discover_specs;
use crate::execute::{ExecuteConfig, ExecuteError, GraphResult, execute_graph};
use crate::graph::{BuildGraph, BuildLayout, GraphError, build_graph};
use crate::naming::{NamedSpec, NamingError, check_collisions};
use crate::publish::{
  CredentialsError, PropertyStore, PublishDescriptor, PublishReport, Repository, RepositoryCredentials,
  build_descriptors, existing_artifacts, publish_all, resolve_artifacts,
};
use crate::toolchain::{CommandToolchain, Toolchain};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Naming(#[from] NamingError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Credentials(#[from] CredentialsError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

/// The immutable result of the configuration phase.
#[derive(Debug, Clone)]
pub struct BuildPlan {
  pub root: PathBuf,
  pub config: ProjectConfig,
  pub layout: BuildLayout,
  pub specs: Vec<NamedSpec>,
  pub graph: BuildGraph,
}

impl BuildPlan {
  /// Plan a project, reading `specbuild.toml` from `root` if present.
  pub fn load(root: &Path) -> Result<Self, PipelineError> {
    let config = ProjectConfig::load(root)?;
    Self::with_config(root, config)
  }

  /// Plan a project with explicit settings.
  pub fn with_config(root: &Path, config: ProjectConfig) -> Result<Self, PipelineError> {
    let layout = config.layout(root);
    let discovered = discover_specs(&layout.spec_dir);
    let specs = check_collisions(&discovered)?;
    let graph = build_graph(&specs, &layout)?;

    info!(specs = specs.len(), nodes = graph.len(), "configuration complete");

    Ok(Self {
      root: root.to_path_buf(),
      config,
      layout,
      specs,
      graph,
    })
  }

  /// The toolchain described by the project settings.
  pub fn toolchain(&self) -> CommandToolchain {
    CommandToolchain::new(self.config.toolchain.clone(), &self.root)
  }

  /// Resolve repository credentials from the environment and the credentials file.
  pub fn resolve_credentials(&self) -> Result<RepositoryCredentials, PipelineError> {
    let store = PropertyStore::load(&self.config.credentials_path(&self.root))?;
    Ok(RepositoryCredentials::resolve(&store)?)
  }

  /// Run the graph.
  pub async fn build<T: Toolchain>(&self, toolchain: Arc<T>, config: &ExecuteConfig) -> Result<GraphResult, PipelineError> {
    Ok(execute_graph(&self.graph, toolchain, config).await?)
  }

  /// Descriptors for everything publishable.
  ///
  /// With a build result, only artifacts produced by that run qualify.
  /// Without one, any file at a package node's declared path qualifies.
  pub fn descriptors(&self, build: Option<&GraphResult>) -> Vec<PublishDescriptor> {
    let records = match build {
      Some(result) => resolve_artifacts(&self.graph, result),
      None => existing_artifacts(&self.graph),
    };
    build_descriptors(&records, &self.config.publication)
  }
}

/// Options for [`publish`].
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
  /// Publish whatever is in the artifacts directory instead of building first.
  pub skip_build: bool,
  /// Resolve descriptors but upload nothing.
  pub dry_run: bool,
  pub execute: ExecuteConfig,
}

/// What a publishing run did.
#[derive(Debug, Default)]
pub struct PublishOutcome {
  /// The build, unless skipped.
  pub build: Option<GraphResult>,
  pub descriptors: Vec<PublishDescriptor>,
  /// Upload results, absent for a dry run.
  pub report: Option<PublishReport>,
}

impl PublishOutcome {
  pub fn is_success(&self) -> bool {
    self.build.as_ref().is_none_or(GraphResult::is_success) && self.report.as_ref().is_none_or(PublishReport::is_success)
  }
}

/// Build (unless skipped), then publish every artifact the build produced.
///
/// The repository must already be configured; resolve credentials during
/// configuration so a missing setting fails before anything runs.
pub async fn publish<T: Toolchain, R: Repository>(
  plan: &BuildPlan,
  toolchain: Arc<T>,
  repository: Option<&R>,
  options: &PublishOptions,
) -> Result<PublishOutcome, PipelineError> {
  let build = if options.skip_build {
    None
  } else {
    let result = plan.build(toolchain, &options.execute).await?;
    if !result.is_success() {
      warn!(failed = result.failed.len(), "build failed, publishing completed artifacts only");
    }
    Some(result)
  };

  let descriptors = plan.descriptors(build.as_ref());

  let report = match repository {
    Some(repository) if !options.dry_run => Some(publish_all(repository, &descriptors).await),
    _ => None,
  };

  Ok(PublishOutcome {
    build,
    descriptors,
    report,
  })
}

//! External tools that perform the per-spec work.
//!
//! The executor only sees the [`Toolchain`] trait; [`CommandToolchain`] is the
//! production implementation that shells out to a code generator, a Java
//! compiler and an archiver.

mod command;
pub mod template;

use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{CompileAction, GenerateAction, PackageAction, TaskAction};

pub use command::CommandToolchain;
pub use template::TemplateError;

/// Errors raised by a toolchain while running an action.
#[derive(Debug, Error)]
pub enum ToolError {
  /// No program configured for a tool.
  #[error("no command configured for {0}")]
  EmptyCommand(&'static str),

  /// An argument template could not be expanded.
  #[error("invalid {tool} command: {source}")]
  Template {
    tool: &'static str,
    #[source]
    source: TemplateError,
  },

  /// A classpath entry cannot be joined with the platform separator.
  #[error("invalid classpath: {0}")]
  Classpath(#[from] std::env::JoinPathsError),

  /// The program could not be started.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The program exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {command}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// Filesystem error while preparing inputs or outputs.
  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The work behind generate, compile and package nodes.
///
/// Implementations must be safe to call concurrently for different specs:
/// the executor runs every ready node of a wave at the same time.
pub trait Toolchain: Send + Sync + 'static {
  /// Generate client sources for one specification.
  fn generate(&self, action: &GenerateAction) -> impl Future<Output = Result<(), ToolError>> + Send;

  /// Compile one spec's generated sources.
  fn compile(&self, action: &CompileAction) -> impl Future<Output = Result<(), ToolError>> + Send;

  /// Archive one spec's compiled classes.
  fn package(&self, action: &PackageAction) -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// Dispatch a node's action to the toolchain. Barrier nodes do nothing.
pub async fn run_action<T: Toolchain>(toolchain: &T, action: &TaskAction) -> Result<(), ToolError> {
  match action {
    TaskAction::Generate(action) => toolchain.generate(action).await,
    TaskAction::Compile(action) => toolchain.compile(action).await,
    TaskAction::Package(action) => toolchain.package(action).await,
    TaskAction::None => Ok(()),
  }
}

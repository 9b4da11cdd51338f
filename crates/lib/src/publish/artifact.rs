//! Artifact resolution.
//!
//! After a build, each spec's artifact is the file its package node declared
//! as output. It is only eligible when that node completed in the same run,
//! so a file left behind by an earlier build is never picked up.
//!
//! Without a build run, [`existing_artifacts`] accepts whatever file sits at
//! each package node's declared path.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::execute::GraphResult;
use crate::graph::BuildGraph;

/// The artifact resolved for one spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
  /// Base name of the spec.
  pub spec_name: String,
  /// Candidate file, if one is known.
  pub resolved_path: Option<PathBuf>,
  /// Whether the candidate is eligible for publishing.
  pub exists: bool,
}

impl ArtifactRecord {
  /// The file to publish, if any.
  pub fn file(&self) -> Option<&Path> {
    self.resolved_path.as_deref().filter(|_| self.exists)
  }
}

/// Resolve artifacts through the package nodes of a graph that was just run.
pub fn resolve_artifacts(graph: &BuildGraph, result: &GraphResult) -> Vec<ArtifactRecord> {
  graph
    .package_outputs()
    .into_iter()
    .filter_map(|(node, path)| {
      let spec_name = node.spec.clone()?;
      let completed = result.is_completed(&node.id);
      let on_disk = path.is_file();

      if on_disk && !completed {
        debug!(task = %node.id, path = %path.display(), "ignoring artifact not produced by this run");
      }

      Some(ArtifactRecord {
        spec_name,
        resolved_path: Some(path.to_path_buf()),
        exists: completed && on_disk,
      })
    })
    .collect()
}

/// Resolve artifacts through the package nodes of a graph without running it.
///
/// Each spec only ever gets the file its own package node declares, so a
/// spec whose name prefixes another's never picks up the other's archive.
pub fn existing_artifacts(graph: &BuildGraph) -> Vec<ArtifactRecord> {
  graph
    .package_outputs()
    .into_iter()
    .filter_map(|(node, path)| {
      let spec_name = node.spec.clone()?;
      let exists = path.is_file();
      if !exists {
        debug!(task = %node.id, path = %path.display(), "declared artifact not on disk");
      }

      Some(ArtifactRecord {
        spec_name,
        resolved_path: Some(path.to_path_buf()),
        exists,
      })
    })
    .collect()
}

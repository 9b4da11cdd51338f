//! Specification discovery.
//!
//! Scans a single directory (non-recursively) for OpenAPI documents and turns
//! each one into a [`SpecDescriptor`]. Discovery never fails: a missing or
//! unreadable directory simply yields no specifications, which in turn yields
//! a valid no-op build graph.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::consts::SPEC_EXTENSIONS;

/// A discovered specification file.
///
/// Created once at discovery and never modified afterwards. `base_name` is the
/// file name without its final extension and identifies the spec for the rest
/// of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpecDescriptor {
  /// Path to the specification file.
  pub path: PathBuf,
  /// File name without extension (e.g. `person-api` for `person-api.yaml`).
  pub base_name: String,
}

impl SpecDescriptor {
  /// Create a descriptor from a file path.
  ///
  /// Returns `None` when the path has no usable UTF-8 file stem.
  pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
    let path = path.into();
    let base_name = path.file_stem()?.to_str()?.to_string();
    if base_name.is_empty() {
      return None;
    }
    Some(Self { path, base_name })
  }

  /// The file name as displayed in logs.
  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.base_name.clone())
  }
}

/// Returns true if the path carries one of the specification extensions.
pub fn is_spec_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| SPEC_EXTENSIONS.contains(&ext))
}

/// Discover specification files in `dir`.
///
/// The result is in filesystem iteration order, which is not stable across
/// platforms. Nothing downstream relies on the order for correctness.
pub fn discover_specs(dir: &Path) -> Vec<SpecDescriptor> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(e) => {
      debug!(dir = %dir.display(), error = %e, "specification directory not readable");
      info!("found 0 specifications");
      return Vec::new();
    }
  };

  let specs: Vec<SpecDescriptor> = entries
    .filter_map(Result::ok)
    .map(|entry| entry.path())
    .filter(|path| path.is_file() && is_spec_file(path))
    .filter_map(SpecDescriptor::from_path)
    .collect();

  let names: Vec<String> = specs.iter().map(SpecDescriptor::file_name).collect();
  info!("found {} specifications: {}", specs.len(), names.join(", "));

  specs
}

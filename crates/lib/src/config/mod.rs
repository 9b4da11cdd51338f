//! Project configuration.
//!
//! Settings are read from an optional `specbuild.toml` in the project root.
//! Every field has a default, so the file is only needed to override them:
//!
//! ```toml
//! spec_dir = "openapi"
//! build_dir = "build"
//! base_package = "org.rockend"
//! credentials_file = ".env"
//! classpath = ["lib/spring-web.jar"]
//!
//! [publication]
//! group_id = "org.rockend"
//! version = "1.0.0-SNAPSHOT"
//!
//! [toolchain]
//! generate = ["openapi-generator-cli", "generate", "-g", "{generator}", "-i", "{input}", "-o", "{output}"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::PROJECT_FILENAME;
use crate::graph::BuildLayout;

/// Errors that can occur when loading the project file.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the project file.
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the project file.
  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// Top-level project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
  /// Directory holding the specifications, relative to the project root.
  pub spec_dir: PathBuf,
  /// Build output directory, relative to the project root.
  pub build_dir: PathBuf,
  /// Java package prefix; each spec gets `<base_package>.<package name>`.
  pub base_package: String,
  /// Generator name passed to the code generator.
  pub generator: String,
  /// Optional `key=value` file seeding repository credentials.
  pub credentials_file: PathBuf,
  /// Shared classpath entries every isolated compilation sees.
  pub classpath: Vec<PathBuf>,
  pub publication: PublicationConfig,
  pub toolchain: ToolchainConfig,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      spec_dir: PathBuf::from("openapi"),
      build_dir: PathBuf::from("build"),
      base_package: "org.rockend".to_string(),
      generator: "spring".to_string(),
      credentials_file: PathBuf::from(".env"),
      classpath: Vec::new(),
      publication: PublicationConfig::default(),
      toolchain: ToolchainConfig::default(),
    }
  }
}

/// Coordinates shared by every published artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublicationConfig {
  pub group_id: String,
  pub version: String,
}

impl Default for PublicationConfig {
  fn default() -> Self {
    Self {
      group_id: "org.rockend".to_string(),
      version: "1.0.0-SNAPSHOT".to_string(),
    }
  }
}

/// Argument templates for the external generator, compiler and packager.
///
/// See [`crate::toolchain::template`] for the placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
  pub generate: Vec<String>,
  pub compile: Vec<String>,
  pub package: Vec<String>,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      generate: args(&[
        "openapi-generator-cli",
        "generate",
        "-g",
        "{generator}",
        "-i",
        "{input}",
        "-o",
        "{output}",
        "--additional-properties={options}",
      ]),
      compile: args(&["javac", "-d", "{destination}", "-cp", "{classpath}", "{sources}"]),
      package: args(&["jar", "cf", "{output}", "-C", "{input}", "."]),
    }
  }
}

fn args(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

impl ProjectConfig {
  /// Load `specbuild.toml` from `root`, falling back to defaults when absent.
  pub fn load(root: &Path) -> Result<Self, ConfigError> {
    let path = root.join(PROJECT_FILENAME);
    if !path.exists() {
      debug!(path = %path.display(), "no project file, using defaults");
      return Ok(Self::default());
    }
    Self::from_file(&path)
  }

  /// Parse a project file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Resolve the configured directories against the project root.
  pub fn layout(&self, root: &Path) -> BuildLayout {
    BuildLayout {
      spec_dir: root.join(&self.spec_dir),
      build_dir: root.join(&self.build_dir),
      base_package: self.base_package.clone(),
      generator: self.generator.clone(),
      classpath: self.classpath.iter().map(|p| root.join(p)).collect(),
    }
  }

  /// Path of the credentials file, resolved against the project root.
  pub fn credentials_path(&self, root: &Path) -> PathBuf {
    root.join(&self.credentials_file)
  }
}

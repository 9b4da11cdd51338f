//! Publish descriptors and their POM.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::artifact::ArtifactRecord;
use crate::config::PublicationConfig;
use crate::consts::ARTIFACT_EXTENSION;
use crate::naming::capitalize;

/// POM metadata shown by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PomMetadata {
  pub name: String,
  pub description: String,
}

/// Everything needed to upload one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishDescriptor {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  pub metadata: PomMetadata,
  /// The artifact file uploaded as payload.
  pub file: PathBuf,
}

impl PublishDescriptor {
  /// Describe a spec's artifact with the shared coordinates.
  pub fn new(spec_name: &str, file: impl Into<PathBuf>, publication: &PublicationConfig) -> Self {
    Self {
      group_id: publication.group_id.clone(),
      artifact_id: spec_name.to_string(),
      version: publication.version.clone(),
      metadata: PomMetadata {
        name: format!("Generated API {}", spec_name),
        description: format!("OpenAPI generated code for {}", spec_name),
      },
      file: file.into(),
    }
  }

  /// Publication name, e.g. `publishOrdersJar`.
  pub fn publication_name(&self) -> String {
    format!("publish{}Jar", capitalize(&self.artifact_id))
  }

  /// Extension of the payload file, `jar` when it has none.
  pub fn extension(&self) -> &str {
    self
      .file
      .extension()
      .and_then(|ext| ext.to_str())
      .unwrap_or(ARTIFACT_EXTENSION)
  }

  /// Directory of this version in a Maven layout, e.g. `org/rockend/orders/1.0.0-SNAPSHOT`.
  pub fn repository_dir(&self) -> String {
    format!(
      "{}/{}/{}",
      self.group_id.replace('.', "/"),
      self.artifact_id,
      self.version
    )
  }

  /// Remote file name for a given extension, e.g. `orders-1.0.0-SNAPSHOT.pom`.
  pub fn remote_file_name(&self, extension: &str) -> String {
    format!("{}-{}.{}", self.artifact_id, self.version, extension)
  }

  /// Render the POM for this artifact.
  pub fn to_pom(&self) -> String {
    format!(
      r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>{}</packaging>
  <name>{}</name>
  <description>{}</description>
</project>
"#,
      escape_xml(&self.group_id),
      escape_xml(&self.artifact_id),
      escape_xml(&self.version),
      escape_xml(self.extension()),
      escape_xml(&self.metadata.name),
      escape_xml(&self.metadata.description),
    )
  }
}

fn escape_xml(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      c => out.push(c),
    }
  }
  out
}

/// Build a descriptor for every record with an eligible artifact.
///
/// Records without one are skipped; that is not an error.
pub fn build_descriptors(records: &[ArtifactRecord], publication: &PublicationConfig) -> Vec<PublishDescriptor> {
  records
    .iter()
    .filter_map(|record| match record.file() {
      Some(file) => {
        info!("publishing: {}", display_name(file));
        Some(PublishDescriptor::new(&record.spec_name, file, publication))
      }
      None => {
        debug!(spec = %record.spec_name, "no artifact found, skipping publication");
        None
      }
    })
    .collect()
}

fn display_name(file: &Path) -> String {
  file
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| file.display().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tracing_test::traced_test;

  fn record(name: &str, path: Option<&str>, exists: bool) -> ArtifactRecord {
    ArtifactRecord {
      spec_name: name.to_string(),
      resolved_path: path.map(PathBuf::from),
      exists,
    }
  }

  #[test]
  fn descriptor_uses_shared_coordinates() {
    let descriptor = PublishDescriptor::new("orders", "/p/build/libs/orders.jar", &PublicationConfig::default());

    assert_eq!(descriptor.group_id, "org.rockend");
    assert_eq!(descriptor.artifact_id, "orders");
    assert_eq!(descriptor.version, "1.0.0-SNAPSHOT");
    assert_eq!(descriptor.metadata.name, "Generated API orders");
    assert_eq!(descriptor.metadata.description, "OpenAPI generated code for orders");
    assert_eq!(descriptor.publication_name(), "publishOrdersJar");
  }

  #[test]
  fn maven_layout() {
    let descriptor = PublishDescriptor::new("person-api", "/p/libs/person-api.zip", &PublicationConfig::default());

    assert_eq!(descriptor.repository_dir(), "org/rockend/person-api/1.0.0-SNAPSHOT");
    assert_eq!(descriptor.extension(), "zip");
    assert_eq!(descriptor.remote_file_name("pom"), "person-api-1.0.0-SNAPSHOT.pom");
  }

  #[test]
  fn pom_contains_coordinates_and_metadata() {
    let descriptor = PublishDescriptor::new("a&b", "/p/libs/a&b.jar", &PublicationConfig::default());
    let pom = descriptor.to_pom();

    assert!(pom.contains("<groupId>org.rockend</groupId>"));
    assert!(pom.contains("<artifactId>a&amp;b</artifactId>"));
    assert!(pom.contains("<version>1.0.0-SNAPSHOT</version>"));
    assert!(pom.contains("<packaging>jar</packaging>"));
    assert!(pom.contains("<name>Generated API a&amp;b</name>"));
  }

  #[test]
  #[traced_test]
  fn descriptors_only_for_found_artifacts() {
    let records = vec![
      record("orders", Some("/p/build/libs/orders.jar"), true),
      record("person-api", Some("/p/build/libs/person-api.jar"), false),
      record("billing", None, false),
    ];

    let descriptors = build_descriptors(&records, &PublicationConfig::default());
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].artifact_id, "orders");
    assert_eq!(descriptors[0].file, PathBuf::from("/p/build/libs/orders.jar"));

    assert!(logs_contain("publishing: orders.jar"));
    assert!(logs_contain("no artifact found, skipping publication"));
  }
}

//! Artifact publishing.
//!
//! Publishing runs after the build:
//! 1. Resolve each spec's artifact ([`resolve_artifacts`] or [`existing_artifacts`])
//! 2. Turn every found artifact into a [`PublishDescriptor`]
//! 3. Upload the descriptors through a [`Repository`]
//!
//! Specs without an artifact are skipped silently. Credentials are resolved
//! separately (see [`credentials`]) so they can be checked before any work
//! starts.

mod artifact;
pub mod credentials;
mod descriptor;
mod repository;

use thiserror::Error;
use tracing::{error, info};

pub use artifact::{ArtifactRecord, existing_artifacts, resolve_artifacts};
pub use credentials::{CredentialsError, PropertyStore, RepositoryCredentials};
pub use descriptor::{PomMetadata, PublishDescriptor, build_descriptors};
pub use repository::{DEFAULT_UPLOAD_TIMEOUT, MavenRepository, Repository, UploadError, UploadReceipt};

/// Errors from publishing.
#[derive(Debug, Error)]
pub enum PublishError {
  /// One artifact could not be uploaded.
  #[error("failed to publish {artifact_id}: {source}")]
  Upload {
    artifact_id: String,
    #[source]
    source: UploadError,
  },
}

/// Outcome of publishing a set of descriptors.
#[derive(Debug, Default)]
pub struct PublishReport {
  pub published: Vec<UploadReceipt>,
  pub failed: Vec<PublishError>,
}

impl PublishReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Upload every descriptor, continuing past failures.
pub async fn publish_all<R: Repository>(repository: &R, descriptors: &[PublishDescriptor]) -> PublishReport {
  let mut report = PublishReport::default();

  for descriptor in descriptors {
    match repository.upload(descriptor).await {
      Ok(receipt) => report.published.push(receipt),
      Err(source) => {
        error!(artifact = %descriptor.artifact_id, error = %source, "upload failed");
        report.failed.push(PublishError::Upload {
          artifact_id: descriptor.artifact_id.clone(),
          source,
        });
      }
    }
  }

  info!(
    published = report.published.len(),
    failed = report.failed.len(),
    "publishing complete"
  );

  report
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::config::PublicationConfig;
  use crate::util::hash::hash_bytes;

  /// Accepts everything except the listed artifact ids.
  #[derive(Default)]
  struct RecordingRepository {
    reject: Vec<String>,
    uploaded: Mutex<Vec<String>>,
  }

  impl Repository for RecordingRepository {
    async fn upload(&self, descriptor: &PublishDescriptor) -> Result<UploadReceipt, UploadError> {
      if self.reject.contains(&descriptor.artifact_id) {
        return Err(UploadError::Status {
          url: format!("http://nexus/{}", descriptor.artifact_id),
          status: 500,
        });
      }
      self.uploaded.lock().unwrap().push(descriptor.artifact_id.clone());
      Ok(UploadReceipt {
        artifact_id: descriptor.artifact_id.clone(),
        url: format!("http://nexus/{}", descriptor.artifact_id),
        sha256: hash_bytes(descriptor.artifact_id.as_bytes()),
      })
    }
  }

  fn descriptors(names: &[&str]) -> Vec<PublishDescriptor> {
    names
      .iter()
      .map(|name| PublishDescriptor::new(name, format!("/libs/{}.jar", name), &PublicationConfig::default()))
      .collect()
  }

  #[tokio::test]
  async fn publishes_everything() {
    let repository = RecordingRepository::default();
    let report = publish_all(&repository, &descriptors(&["orders", "person-api"])).await;

    assert!(report.is_success());
    assert_eq!(report.published.len(), 2);
    assert_eq!(*repository.uploaded.lock().unwrap(), vec!["orders", "person-api"]);
  }

  #[tokio::test]
  async fn failure_does_not_stop_remaining_uploads() {
    let repository = RecordingRepository {
      reject: vec!["orders".to_string()],
      ..Default::default()
    };
    let report = publish_all(&repository, &descriptors(&["orders", "person-api"])).await;

    assert!(!report.is_success());
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].artifact_id, "person-api");
    assert!(matches!(
      &report.failed[0],
      PublishError::Upload { artifact_id, source: UploadError::Status { status: 500, .. } } if artifact_id == "orders"
    ));
  }

  #[tokio::test]
  async fn nothing_to_publish() {
    let report = publish_all(&RecordingRepository::default(), &[]).await;
    assert!(report.is_success());
    assert!(report.published.is_empty());
  }
}

//! Remote repositories.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::credentials::RepositoryCredentials;
use super::descriptor::PublishDescriptor;
use crate::util::hash::{ContentHash, hash_bytes};

/// Errors from a single upload.
#[derive(Debug, Error)]
pub enum UploadError {
  /// The payload could not be read.
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The HTTP client could not be built.
  #[error("failed to build HTTP client: {0}")]
  ClientBuild(#[source] reqwest::Error),

  /// The request did not complete.
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The repository rejected the upload.
  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
  pub artifact_id: String,
  /// URL of the uploaded artifact.
  pub url: String,
  /// Checksum of the uploaded artifact.
  pub sha256: ContentHash,
}

/// Accepts artifacts with their coordinates and metadata.
pub trait Repository: Send + Sync {
  fn upload(&self, descriptor: &PublishDescriptor) -> impl Future<Output = Result<UploadReceipt, UploadError>> + Send;
}

/// A Maven repository reached over HTTP(S) with basic auth.
///
/// Each artifact is stored as
/// `<url>/<group path>/<artifactId>/<version>/<artifactId>-<version>.<ext>`
/// next to its POM, with a `.sha256` file for both.
#[derive(Debug, Clone)]
pub struct MavenRepository {
  client: Client,
  credentials: RepositoryCredentials,
}

/// Default time limit for a single request.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

impl MavenRepository {
  pub fn new(credentials: RepositoryCredentials) -> Result<Self, UploadError> {
    Self::with_timeout(credentials, DEFAULT_UPLOAD_TIMEOUT)
  }

  /// Create a repository whose requests give up after `timeout`.
  pub fn with_timeout(credentials: RepositoryCredentials, timeout: Duration) -> Result<Self, UploadError> {
    let client = Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .timeout(timeout)
      .user_agent(format!("specbuild/{}", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(UploadError::ClientBuild)?;

    Ok(Self { client, credentials })
  }

  fn url_for(&self, descriptor: &PublishDescriptor, extension: &str) -> String {
    format!(
      "{}/{}/{}",
      self.credentials.url.trim_end_matches('/'),
      descriptor.repository_dir(),
      descriptor.remote_file_name(extension)
    )
  }

  async fn put(&self, url: &str, body: Vec<u8>) -> Result<(), UploadError> {
    debug!(url = %url, size = body.len(), "uploading");

    let response = self
      .client
      .put(url)
      .basic_auth(&self.credentials.username, Some(self.credentials.password()))
      .body(body)
      .send()
      .await
      .map_err(|source| UploadError::Request {
        url: url.to_string(),
        source,
      })?;

    if !response.status().is_success() {
      return Err(UploadError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    Ok(())
  }

  /// Upload a file and its checksum.
  async fn put_with_checksum(&self, url: &str, body: Vec<u8>) -> Result<ContentHash, UploadError> {
    let sha256 = hash_bytes(&body);
    self.put(url, body).await?;
    self
      .put(&format!("{}.sha256", url), sha256.0.clone().into_bytes())
      .await?;
    Ok(sha256)
  }
}

impl Repository for MavenRepository {
  async fn upload(&self, descriptor: &PublishDescriptor) -> Result<UploadReceipt, UploadError> {
    let payload = tokio::fs::read(&descriptor.file).await.map_err(|source| UploadError::Read {
      path: descriptor.file.clone(),
      source,
    })?;

    let artifact_url = self.url_for(descriptor, descriptor.extension());
    let sha256 = self.put_with_checksum(&artifact_url, payload).await?;

    let pom_url = self.url_for(descriptor, "pom");
    self.put_with_checksum(&pom_url, descriptor.to_pom().into_bytes()).await?;

    info!(artifact = %descriptor.artifact_id, url = %artifact_url, "uploaded artifact");

    Ok(UploadReceipt {
      artifact_id: descriptor.artifact_id.clone(),
      url: artifact_url,
      sha256,
    })
  }
}

//! Repository credentials.
//!
//! `NEXUS_URL`, `NEXUS_USERNAME` and `NEXUS_PASSWORD` are looked up in the
//! process environment first. A variable that is not set falls back to the
//! property store, which is seeded from an optional `.env` file of
//! `key=value` lines.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{ENV_REPOSITORY_PASSWORD, ENV_REPOSITORY_URL, ENV_REPOSITORY_USERNAME, REQUIRED_SETTINGS};

/// Errors from credential resolution.
#[derive(Debug, Error)]
pub enum CredentialsError {
  /// The credentials file exists but could not be read.
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// One or more required settings are unset or blank.
  #[error(
    "repository details are not set (missing: {}). Set {} in the environment or a .env file",
    .missing.join(", "),
    REQUIRED_SETTINGS.join(", ")
  )]
  Missing { missing: Vec<&'static str> },
}

/// Properties loaded from a `key=value` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
  values: BTreeMap<String, String>,
}

impl PropertyStore {
  /// Parse `key=value` lines.
  ///
  /// Each line is split on its first `=` and both sides are trimmed. Blank
  /// lines, `#` comments and lines without `=` are ignored.
  pub fn parse(content: &str) -> Self {
    let values = content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .filter_map(|line| line.split_once('='))
      .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
      .collect();
    Self { values }
  }

  /// Load a property file. A missing file gives an empty store.
  pub fn load(path: &Path) -> Result<Self, CredentialsError> {
    match fs::read_to_string(path) {
      Ok(content) => {
        let store = Self::parse(&content);
        // Keys only; values may be secrets
        debug!(path = %path.display(), keys = ?store.values.keys().collect::<Vec<_>>(), "loaded properties");
        Ok(store)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no properties file");
        Ok(Self::default())
      }
      Err(source) => Err(CredentialsError::Read {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.values.get(key).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Connection details for the remote repository.
///
/// The password is never printed; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryCredentials {
  pub url: String,
  pub username: String,
  password: String,
}

impl std::fmt::Debug for RepositoryCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RepositoryCredentials")
      .field("url", &self.url)
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

impl RepositoryCredentials {
  pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      username: username.into(),
      password: password.into(),
    }
  }

  pub fn password(&self) -> &str {
    &self.password
  }

  /// Resolve from the process environment, falling back to `store`.
  pub fn resolve(store: &PropertyStore) -> Result<Self, CredentialsError> {
    Self::resolve_with(|key| std::env::var(key).ok(), store)
  }

  /// Resolve with a custom environment lookup.
  ///
  /// A variable present in the environment wins even when blank. Every
  /// setting that ends up blank is reported in one error.
  pub fn resolve_with(
    env: impl Fn(&str) -> Option<String>,
    store: &PropertyStore,
  ) -> Result<Self, CredentialsError> {
    let lookup = |key: &str| {
      env(key)
        .or_else(|| store.get(key).map(str::to_string))
        .filter(|value| !value.trim().is_empty())
    };

    let url = lookup(ENV_REPOSITORY_URL);
    let username = lookup(ENV_REPOSITORY_USERNAME);
    let password = lookup(ENV_REPOSITORY_PASSWORD);

    match (url, username, password) {
      (Some(url), Some(username), Some(password)) => {
        debug!(url = %url, username = %username, "resolved repository credentials");
        Ok(Self::new(url, username, password))
      }
      (url, username, password) => {
        let missing = [
          (ENV_REPOSITORY_URL, url.is_none()),
          (ENV_REPOSITORY_USERNAME, username.is_none()),
          (ENV_REPOSITORY_PASSWORD, password.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(key, _)| key)
        .collect();
        Err(CredentialsError::Missing { missing })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn parse_splits_on_first_equals_and_trims() {
    let store = PropertyStore::parse("NEXUS_URL = http://nexus:8081/repo?a=b \n  NEXUS_USERNAME=ci\n");
    assert_eq!(store.get("NEXUS_URL"), Some("http://nexus:8081/repo?a=b"));
    assert_eq!(store.get("NEXUS_USERNAME"), Some("ci"));
  }

  #[test]
  fn parse_ignores_blank_comment_and_malformed_lines() {
    let store = PropertyStore::parse("\n# NEXUS_URL=commented\nnot a pair\n\nKEY=\n");
    assert_eq!(store.get("NEXUS_URL"), None);
    assert_eq!(store.get("KEY"), Some(""));
    assert_eq!(store.values.len(), 1);
  }

  #[test]
  fn load_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = PropertyStore::load(&temp.path().join(".env")).unwrap();
    assert!(store.is_empty());
  }

  #[test]
  fn load_reads_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".env");
    fs::write(&path, "NEXUS_PASSWORD=s3cr=t\n").unwrap();
    assert_eq!(PropertyStore::load(&path).unwrap().get("NEXUS_PASSWORD"), Some("s3cr=t"));
  }

  #[test]
  fn resolve_from_store() {
    let store = PropertyStore::parse("NEXUS_URL=http://nexus\nNEXUS_USERNAME=ci\nNEXUS_PASSWORD=pw\n");
    let creds = RepositoryCredentials::resolve_with(no_env, &store).unwrap();
    assert_eq!(creds, RepositoryCredentials::new("http://nexus", "ci", "pw"));
  }

  #[test]
  fn environment_overrides_store() {
    let store = PropertyStore::parse("NEXUS_URL=http://file\nNEXUS_USERNAME=file-user\nNEXUS_PASSWORD=file-pw\n");
    let env = |key: &str| (key == "NEXUS_USERNAME").then(|| "env-user".to_string());

    let creds = RepositoryCredentials::resolve_with(env, &store).unwrap();
    assert_eq!(creds.url, "http://file");
    assert_eq!(creds.username, "env-user");
    assert_eq!(creds.password(), "file-pw");
  }

  #[test]
  fn blank_password_names_all_settings() {
    let store = PropertyStore::parse("NEXUS_URL=http://nexus\nNEXUS_USERNAME=ci\nNEXUS_PASSWORD=   \n");
    let err = RepositoryCredentials::resolve_with(no_env, &store).unwrap_err();

    assert!(matches!(&err, CredentialsError::Missing { missing } if missing == &vec!["NEXUS_PASSWORD"]));
    let message = err.to_string();
    assert!(message.contains("NEXUS_URL, NEXUS_USERNAME, NEXUS_PASSWORD"));
  }

  #[test]
  fn blank_environment_value_is_not_replaced_by_store() {
    let store = PropertyStore::parse("NEXUS_URL=http://nexus\nNEXUS_USERNAME=ci\nNEXUS_PASSWORD=pw\n");
    let env = |key: &str| (key == "NEXUS_URL").then(String::new);

    let err = RepositoryCredentials::resolve_with(env, &store).unwrap_err();
    assert!(matches!(err, CredentialsError::Missing { missing } if missing == vec!["NEXUS_URL"]));
  }

  #[test]
  fn nothing_set_reports_everything() {
    let err = RepositoryCredentials::resolve_with(no_env, &PropertyStore::default()).unwrap_err();
    assert!(matches!(err, CredentialsError::Missing { ref missing } if missing.len() == 3));
  }

  #[test]
  fn debug_redacts_password() {
    let creds = RepositoryCredentials::new("http://nexus", "ci", "hunter2");
    let debug = format!("{:?}", creds);
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("hunter2"));
  }

  #[test]
  #[serial]
  fn resolve_reads_process_environment() {
    temp_env::with_vars(
      [
        ("NEXUS_URL", Some("http://from-env")),
        ("NEXUS_USERNAME", Some("env-user")),
        ("NEXUS_PASSWORD", Some("env-pw")),
      ],
      || {
        let store = PropertyStore::parse("NEXUS_URL=http://from-file\n");
        let creds = RepositoryCredentials::resolve(&store).unwrap();
        assert_eq!(creds.url, "http://from-env");
        assert_eq!(creds.password(), "env-pw");
      },
    );
  }

  #[test]
  #[serial]
  fn resolve_falls_back_when_unset() {
    temp_env::with_vars_unset(["NEXUS_URL", "NEXUS_USERNAME", "NEXUS_PASSWORD"], || {
      let store = PropertyStore::parse("NEXUS_URL=http://nexus\nNEXUS_USERNAME=ci\nNEXUS_PASSWORD=\n");
      let err = RepositoryCredentials::resolve(&store).unwrap_err();
      assert!(matches!(err, CredentialsError::Missing { missing } if missing == vec!["NEXUS_PASSWORD"]));
    });
  }
}

//! SHA-256 checksums for published files.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash an in-memory payload, such as an artifact read for upload.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(data)))
}

#[cfg(test)]
mod tests {
  use super::*;

  const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

  #[test]
  fn hash_bytes_known_value() {
    assert_eq!(hash_bytes(b"hello").0, HELLO_SHA256);
    assert_eq!(hash_bytes(b"").0.len(), 64);
  }
}

//! Shared utilities.
//!
//! Checksums for published files and test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;

//! Test helpers shared across modules.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ToolchainConfig;

/// Write a minimal specification file per name into `dir`.
pub fn write_specs(dir: &Path, files: &[&str]) -> Vec<PathBuf> {
  fs::create_dir_all(dir).unwrap();
  files
    .iter()
    .map(|file| {
      let path = dir.join(file);
      fs::write(&path, "openapi: 3.0.0\ninfo:\n  title: test\n  version: 1.0.0\npaths: {}\n").unwrap();
      path
    })
    .collect()
}

/// A command template running `script` through `/bin/sh`, with `args` as `$0`, `$1`, ...
pub fn sh(script: &str, args: &[&str]) -> Vec<String> {
  let mut template = vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()];
  template.extend(args.iter().map(|a| a.to_string()));
  template
}

/// A toolchain that fakes each step with shell commands.
///
/// Generation writes one Java file, compilation copies it to the destination
/// and packaging writes the file list into the artifact. Generation fails for
/// any spec whose file name contains `broken`.
pub fn fake_toolchain() -> ToolchainConfig {
  ToolchainConfig {
    generate: sh(
      "case \"$0\" in *broken*) echo 'invalid spec' >&2; exit 1;; esac; \
       mkdir -p \"$1/src/main/java\" && echo 'class Api {{}}' > \"$1/src/main/java/Api.java\"",
      &["{input}", "{output}"],
    ),
    compile: sh("cp \"$1\" \"$0/\"", &["{destination}", "{sources}"]),
    package: sh("ls \"$1\" > \"$0\"", &["{output}", "{input}"]),
  }
}

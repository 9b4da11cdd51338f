//! Fixed names and defaults shared across the crate.

/// Project configuration file name, looked up in the project root.
pub const PROJECT_FILENAME: &str = "specbuild.toml";

/// Extensions recognized as specification files.
pub const SPEC_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Extension of the archives produced by package nodes.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// Fan-in node that depends on every generate node.
pub const AGGREGATE_TASK: &str = "generateAllOpenApi";

/// Primary (non-spec-specific) compilation node.
pub const ROOT_COMPILE_TASK: &str = "compileJava";

/// Root build/assemble node that depends on every package node.
pub const ROOT_BUILD_TASK: &str = "build";

/// Task ids no derived name may take.
pub const RESERVED_TASKS: &[&str] = &[AGGREGATE_TASK, ROOT_COMPILE_TASK, ROOT_BUILD_TASK];

/// Environment variable holding the repository URL.
pub const ENV_REPOSITORY_URL: &str = "NEXUS_URL";

/// Environment variable holding the repository user name.
pub const ENV_REPOSITORY_USERNAME: &str = "NEXUS_USERNAME";

/// Environment variable holding the repository password.
pub const ENV_REPOSITORY_PASSWORD: &str = "NEXUS_PASSWORD";

/// All settings required to publish, in the order they are reported.
pub const REQUIRED_SETTINGS: &[&str] = &[ENV_REPOSITORY_URL, ENV_REPOSITORY_USERNAME, ENV_REPOSITORY_PASSWORD];

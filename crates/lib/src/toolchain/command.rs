//! Toolchain backed by external commands.

use std::io;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::template::{Bindings, expand};
use super::{ToolError, Toolchain};
use crate::config::ToolchainConfig;
use crate::graph::{CompileAction, GenerateAction, PackageAction};

/// Runs the configured generator, compiler and archiver commands.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
  config: ToolchainConfig,
  working_dir: PathBuf,
}

impl CommandToolchain {
  /// Create a toolchain whose commands run in `working_dir`.
  pub fn new(config: ToolchainConfig, working_dir: impl Into<PathBuf>) -> Self {
    Self {
      config,
      working_dir: working_dir.into(),
    }
  }

  async fn run(&self, tool: &'static str, template: &[String], bindings: &Bindings) -> Result<(), ToolError> {
    let args = expand(template, bindings).map_err(|source| ToolError::Template { tool, source })?;
    let Some((program, rest)) = args.split_first() else {
      return Err(ToolError::EmptyCommand(tool));
    };
    let command_line = args.join(" ");

    info!(tool, cmd = %command_line, "executing command");

    let output = Command::new(program)
      .args(rest)
      .current_dir(&self.working_dir)
      .output()
      .await
      .map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
      })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "command stdout");
      }
      return Err(ToolError::Failed {
        command: command_line,
        code: output.status.code(),
        stderr: stderr.trim().to_string(),
      });
    }

    if !stdout.is_empty() {
      debug!(stdout = %stdout.trim(), "command output");
    }
    if !stderr.is_empty() {
      debug!(stderr = %stderr.trim(), "command stderr");
    }

    Ok(())
  }
}

impl Toolchain for CommandToolchain {
  async fn generate(&self, action: &GenerateAction) -> Result<(), ToolError> {
    create_dir(&action.output_dir).await?;

    let options = action
      .options
      .iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect::<Vec<_>>()
      .join(",");

    let mut bindings = Bindings::default();
    bindings
      .set("input", action.input.to_string_lossy())
      .set("output", action.output_dir.to_string_lossy())
      .set("generator", action.generator.as_str())
      .set("options", options);

    self.run("generate", &self.config.generate, &bindings).await
  }

  async fn compile(&self, action: &CompileAction) -> Result<(), ToolError> {
    let sources = java_sources(&action.source_dirs);
    if sources.is_empty() {
      debug!(destination = %action.destination.display(), "no sources, skipping compile");
      return Ok(());
    }

    create_dir(&action.destination).await?;
    let classpath = std::env::join_paths(&action.classpath)?;

    let mut bindings = Bindings::default();
    bindings
      .set("destination", action.destination.to_string_lossy())
      .set("classpath", classpath.to_string_lossy())
      .set_many(
        "sources",
        sources.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
      );

    self.run("compile", &self.config.compile, &bindings).await
  }

  async fn package(&self, action: &PackageAction) -> Result<(), ToolError> {
    // Classes may be missing when the spec produced no sources
    create_dir(&action.input_dir).await?;
    if let Some(parent) = action.output_file.parent() {
      create_dir(parent).await?;
    }
    match tokio::fs::remove_file(&action.output_file).await {
      Ok(()) => debug!(path = %action.output_file.display(), "removed previous artifact"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => {
        return Err(ToolError::Io {
          path: action.output_file.clone(),
          source,
        });
      }
    }

    let mut bindings = Bindings::default();
    bindings
      .set("input", action.input_dir.to_string_lossy())
      .set("output", action.output_file.to_string_lossy());

    self.run("package", &self.config.package, &bindings).await
  }
}

async fn create_dir(path: &Path) -> Result<(), ToolError> {
  tokio::fs::create_dir_all(path).await.map_err(|source| ToolError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// All `.java` files under the given roots, sorted. Missing roots are skipped.
fn java_sources(roots: &[PathBuf]) -> Vec<PathBuf> {
  let mut sources: Vec<PathBuf> = roots
    .iter()
    .filter(|root| root.is_dir())
    .flat_map(|root| WalkDir::new(root).into_iter().filter_map(Result::ok))
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| entry.into_path())
    .filter(|path| path.extension().is_some_and(|ext| ext == "java"))
    .collect();
  sources.sort();
  sources
}

#[cfg(all(test, unix))]
mod tests {
  use std::collections::BTreeMap;
  use std::fs;

  use tempfile::TempDir;
  use tracing_test::traced_test;

  use super::*;

  fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn toolchain(dir: &Path, generate: &[&str], compile: &[&str], package: &[&str]) -> CommandToolchain {
    CommandToolchain::new(
      ToolchainConfig {
        generate: args(generate),
        compile: args(compile),
        package: args(package),
      },
      dir,
    )
  }

  fn generate_action(dir: &Path) -> GenerateAction {
    let mut options = BTreeMap::new();
    options.insert("library".to_string(), "spring-cloud".to_string());
    options.insert("useTags".to_string(), "true".to_string());
    GenerateAction {
      input: dir.join("orders.yaml"),
      output_dir: dir.join("out/orders"),
      generator: "spring".to_string(),
      options,
    }
  }

  #[tokio::test]
  async fn generate_passes_placeholders() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(
      temp.path(),
      &["sh", "-c", "echo \"$1 $2\" > \"$0/args.txt\"", "{output}", "{generator}", "{options}"],
      &["true"],
      &["true"],
    );

    let action = generate_action(temp.path());
    tools.generate(&action).await.unwrap();

    let recorded = fs::read_to_string(action.output_dir.join("args.txt")).unwrap();
    assert_eq!(recorded.trim(), "spring library=spring-cloud,useTags=true");
  }

  #[tokio::test]
  async fn failing_command_reports_exit_code() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(temp.path(), &["sh", "-c", "echo broken >&2; exit 3"], &["true"], &["true"]);

    let err = tools.generate(&generate_action(temp.path())).await.unwrap_err();
    match err {
      ToolError::Failed { code, stderr, .. } => {
        assert_eq!(code, Some(3));
        assert_eq!(stderr, "broken");
      }
      other => panic!("expected Failed, got {:?}", other),
    }
  }

  #[tokio::test]
  #[traced_test]
  async fn command_line_is_logged_and_reported() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(temp.path(), &["sh", "-c", "exit 2", "{generator}"], &["true"], &["true"]);

    let err = tools.generate(&generate_action(temp.path())).await.unwrap_err();
    match err {
      ToolError::Failed { command, code, .. } => {
        assert_eq!(command, "sh -c exit 2 spring");
        assert_eq!(code, Some(2));
      }
      other => panic!("expected Failed, got {:?}", other),
    }
    assert!(logs_contain("executing command"));
    assert!(logs_contain("cmd=sh -c exit 2 spring"));
  }

  #[tokio::test]
  async fn missing_program_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(temp.path(), &["specbuild-no-such-program"], &["true"], &["true"]);

    let err = tools.generate(&generate_action(temp.path())).await.unwrap_err();
    assert!(matches!(err, ToolError::Spawn { ref program, .. } if program == "specbuild-no-such-program"));
  }

  #[tokio::test]
  async fn empty_command_rejected() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(temp.path(), &[], &["true"], &["true"]);

    let err = tools.generate(&generate_action(temp.path())).await.unwrap_err();
    assert!(matches!(err, ToolError::EmptyCommand("generate")));
  }

  #[tokio::test]
  async fn compile_without_sources_is_skipped() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(temp.path(), &["true"], &["false"], &["true"]);

    let action = CompileAction {
      source_dirs: vec![temp.path().join("missing")],
      classpath: vec![],
      destination: temp.path().join("classes"),
    };
    tools.compile(&action).await.unwrap();
    assert!(!action.destination.exists());
  }

  #[tokio::test]
  async fn compile_expands_sources_per_file() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src/org/rockend");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("B.java"), "class B {}").unwrap();
    fs::write(src.join("A.java"), "class A {}").unwrap();
    fs::write(src.join("README.md"), "ignored").unwrap();

    let tools = toolchain(
      temp.path(),
      &["true"],
      &["sh", "-c", "echo $# > \"$0/count.txt\"", "{destination}", "{sources}"],
      &["true"],
    );

    let action = CompileAction {
      source_dirs: vec![temp.path().join("src")],
      classpath: vec![temp.path().join("lib/a.jar")],
      destination: temp.path().join("classes"),
    };
    tools.compile(&action).await.unwrap();

    let count = fs::read_to_string(action.destination.join("count.txt")).unwrap();
    assert_eq!(count.trim(), "2");
  }

  #[test]
  fn java_sources_are_sorted_and_filtered() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("b")).unwrap();
    fs::write(temp.path().join("b/Z.java"), "").unwrap();
    fs::write(temp.path().join("A.java"), "").unwrap();
    fs::write(temp.path().join("notes.txt"), "").unwrap();

    let found = java_sources(&[temp.path().to_path_buf()]);
    assert_eq!(found, vec![temp.path().join("A.java"), temp.path().join("b/Z.java")]);
  }

  #[tokio::test]
  async fn package_replaces_previous_artifact() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("build/libs/orders.jar");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "stale").unwrap();

    let tools = toolchain(temp.path(), &["true"], &["true"], &["sh", "-c", "test ! -e \"$0\" && touch \"$0\"", "{output}"]);

    let action = PackageAction {
      input_dir: temp.path().join("build/classes/orders"),
      output_file: output.clone(),
    };
    tools.package(&action).await.unwrap();

    assert!(action.input_dir.is_dir());
    assert_eq!(fs::read_to_string(&output).unwrap(), "");
  }
}

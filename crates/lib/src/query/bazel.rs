//! Running the build tool's query subcommand.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use super::parse::parse_query_output;
use super::types::Target;

/// Errors from invoking or decoding the dependency query.
#[derive(Debug, Error)]
pub enum QueryError {
  /// The build tool could not be started.
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The build tool exited unsuccessfully.
  #[error("'{command}' failed with exit code {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The query output could not be decoded.
  #[error("failed to decode query output: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Source of dependency query results for a target universe.
pub trait QueryTool {
  /// Every target transitively reachable from the `universe` patterns.
  fn query_deps(&self, universe: &[String]) -> Result<Vec<Target>, QueryError>;
}

/// [`QueryTool`] backed by `bazel cquery`.
#[derive(Debug, Clone)]
pub struct BazelQuery {
  program: String,
  workspace_root: PathBuf,
}

impl BazelQuery {
  /// Query with `program` (usually `bazel`), running inside `workspace_root`.
  pub fn new(program: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      workspace_root: workspace_root.into(),
    }
  }

  /// Ask the build tool for its execution root.
  pub fn execution_root(&self) -> Result<PathBuf, QueryError> {
    let out = self.run(&["info", "execution_root"])?;
    Ok(PathBuf::from(out.trim()))
  }

  fn run(&self, args: &[&str]) -> Result<String, QueryError> {
    let command_line = format!("{} {}", self.program, args.join(" "));
    debug!(command = %command_line, cwd = %self.workspace_root.display(), "running build tool");

    let output = Command::new(&self.program)
      .args(args)
      .current_dir(&self.workspace_root)
      .output()
      .map_err(|source| QueryError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Err(QueryError::Failed {
        command: command_line,
        code: output.status.code(),
        stderr,
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

/// The query expression selecting `universe` and everything it depends on.
pub fn deps_expression(universe: &[String]) -> String {
  format!("deps({})", universe.join(" + "))
}

impl QueryTool for BazelQuery {
  fn query_deps(&self, universe: &[String]) -> Result<Vec<Target>, QueryError> {
    let expression = deps_expression(universe);
    info!(query = %expression, "querying dependency graph");

    let output = self.run(&["cquery", &expression, "--output=jsonproto"])?;
    let targets = parse_query_output(&output)?;

    debug!(count = targets.len(), "query returned targets");
    Ok(targets)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;
  use tempfile::TempDir;

  #[test]
  fn deps_expression_unions_patterns() {
    assert_eq!(deps_expression(&["//...".to_string()]), "deps(//...)");
    assert_eq!(
      deps_expression(&["//a/...".to_string(), "//b:c".to_string()]),
      "deps(//a/... + //b:c)"
    );
  }

  #[test]
  fn missing_program_is_a_spawn_error() {
    let temp = TempDir::new().unwrap();
    let query = BazelQuery::new("targetdiff-no-such-binary", temp.path());

    let err = query.query_deps(&["//...".to_string()]).unwrap_err();
    assert!(matches!(err, QueryError::Spawn { .. }));
  }

  /// Write an executable shell script standing in for the build tool.
  #[cfg(unix)]
  fn fake_bazel(dir: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("bazel");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  #[test]
  #[cfg(unix)]
  fn runs_cquery_in_workspace() {
    let temp = TempDir::new().unwrap();
    let bazel = fake_bazel(
      temp.path(),
      r#"[ "$1" = "cquery" ] && [ "$3" = "--output=jsonproto" ] || exit 2
echo '{"results": [{"target": {"type": "SOURCE_FILE", "sourceFile": {"name": "//a:x"}}}]}'"#,
    );

    let query = BazelQuery::new(bazel.to_str().unwrap(), temp.path());
    let targets = query.query_deps(&["//...".to_string()]).unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].name(), "//a:x");
  }

  #[test]
  #[cfg(unix)]
  fn reports_failed_query() {
    let temp = TempDir::new().unwrap();
    let bazel = fake_bazel(temp.path(), "echo 'ERROR: no such package' >&2; exit 7");

    let query = BazelQuery::new(bazel.to_str().unwrap(), temp.path());
    let err = query.query_deps(&["//nope/...".to_string()]).unwrap_err();

    match err {
      QueryError::Failed { code, stderr, .. } => {
        assert_eq!(code, Some(7));
        assert!(stderr.contains("no such package"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  #[cfg(unix)]
  fn execution_root_is_trimmed() {
    let temp = TempDir::new().unwrap();
    let bazel = fake_bazel(temp.path(), r#"[ "$1" = "info" ] && echo "/cache/execroot/_main""#);

    let query = BazelQuery::new(bazel.to_str().unwrap(), temp.path());
    assert_eq!(query.execution_root().unwrap(), PathBuf::from("/cache/execroot/_main"));
  }
}

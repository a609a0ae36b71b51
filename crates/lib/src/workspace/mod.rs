//! Workspace path configuration and label resolution.
//!
//! [`WorkspacePaths`] is built once at process start and passed by reference
//! to everything that needs to turn a label into a file on disk. Nothing below
//! this module reads the process environment.
//!
//! # Label Mapping
//!
//! | Label                    | Source file                          | Generated file                     |
//! |--------------------------|--------------------------------------|------------------------------------|
//! | `//pkg:file.c`           | `<workspace>/pkg/file.c`             | `<output>/pkg/file.c`              |
//! | `@repo//pkg:file.c`      | `<exec>/external/repo/pkg/file.c`    | `<output>/external/repo/pkg/file.c`|

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{EXTERNAL_DIR, OUTPUT_ROOT_LINK, WORKSPACE_DIR_ENV};

/// Errors that can occur while locating the workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  /// The current directory could not be determined.
  #[error("failed to determine current directory: {0}")]
  CurrentDir(#[source] std::io::Error),

  /// The workspace root does not exist or cannot be resolved.
  #[error("failed to resolve workspace root '{path}': {source}")]
  Canonicalize {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// The three roots a label can resolve under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
  /// Absolute path of the source workspace.
  pub workspace_root: PathBuf,
  /// The build tool's execution root; external repositories live below it.
  pub execution_root: PathBuf,
  /// The build output tree holding generated files.
  pub output_root: PathBuf,
}

impl WorkspacePaths {
  /// Create a path configuration. `output_root` defaults to the `bazel-bin`
  /// symlink inside the workspace.
  pub fn new(workspace_root: PathBuf, execution_root: PathBuf, output_root: Option<PathBuf>) -> Self {
    let output_root = output_root.unwrap_or_else(|| workspace_root.join(OUTPUT_ROOT_LINK));
    Self {
      workspace_root,
      execution_root,
      output_root,
    }
  }

  /// Locate the workspace root.
  ///
  /// Precedence: the explicit argument, then `$BUILD_WORKSPACE_DIRECTORY`
  /// (set by `bazel run`), then the current directory. The result is
  /// canonicalized.
  pub fn find_workspace_root(explicit: Option<&Path>) -> Result<PathBuf, WorkspaceError> {
    let candidate = match explicit {
      Some(path) => path.to_path_buf(),
      None => match std::env::var(WORKSPACE_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::current_dir().map_err(WorkspaceError::CurrentDir)?,
      },
    };

    let root = dunce::canonicalize(&candidate).map_err(|source| WorkspaceError::Canonicalize {
      path: candidate.clone(),
      source,
    })?;
    debug!(root = %root.display(), "resolved workspace root");
    Ok(root)
  }

  /// Absolute path of a source file label.
  pub fn source_path(&self, label: &str) -> PathBuf {
    resolve_label(label, &self.workspace_root, &self.execution_root.join(EXTERNAL_DIR))
  }

  /// Absolute path of a generated file label.
  pub fn generated_path(&self, label: &str) -> PathBuf {
    resolve_label(label, &self.output_root, &self.output_root.join(EXTERNAL_DIR))
  }
}

/// Map a label onto a filesystem path.
///
/// Labels rooted at an external repository (`@repo//...`, `@@repo//...`) go
/// under `external_root/repo`; everything else goes under `main_root`. Package
/// and target separators both become path separators.
fn resolve_label(label: &str, main_root: &Path, external_root: &Path) -> PathBuf {
  let (mut path, rest) = match label.strip_prefix('@') {
    Some(external) => {
      let external = external.trim_start_matches('@');
      let (repo, rest) = external.split_once("//").unwrap_or((external, ""));
      // `@//` and `@@//` name the main repository
      if repo.is_empty() {
        (main_root.to_path_buf(), rest)
      } else {
        (external_root.join(repo), rest)
      }
    }
    None => (main_root.to_path_buf(), label.strip_prefix("//").unwrap_or(label)),
  };

  for segment in rest.split(['/', ':']).filter(|s| !s.is_empty()) {
    path.push(segment);
  }
  path
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn paths() -> WorkspacePaths {
    WorkspacePaths::new(PathBuf::from("/ws"), PathBuf::from("/exec"), None)
  }

  #[test]
  fn output_root_defaults_to_bazel_bin() {
    assert_eq!(paths().output_root, PathBuf::from("/ws/bazel-bin"));

    let custom = WorkspacePaths::new(PathBuf::from("/ws"), PathBuf::from("/exec"), Some(PathBuf::from("/out")));
    assert_eq!(custom.output_root, PathBuf::from("/out"));
  }

  #[test]
  fn source_label_in_workspace() {
    assert_eq!(
      paths().source_path("//foo/bar:baz.cc"),
      PathBuf::from("/ws/foo/bar/baz.cc")
    );
  }

  #[test]
  fn source_label_at_workspace_root() {
    assert_eq!(paths().source_path("//:BUILD"), PathBuf::from("/ws/BUILD"));
  }

  #[test]
  fn source_label_with_nested_target_path() {
    assert_eq!(
      paths().source_path("//pkg:data/input.txt"),
      PathBuf::from("/ws/pkg/data/input.txt")
    );
  }

  #[test]
  fn source_label_in_external_repo() {
    assert_eq!(
      paths().source_path("@zlib//:zlib.h"),
      PathBuf::from("/exec/external/zlib/zlib.h")
    );
    assert_eq!(
      paths().source_path("@@rules_cc~//cc:defs.bzl"),
      PathBuf::from("/exec/external/rules_cc~/cc/defs.bzl")
    );
  }

  #[test]
  fn main_repo_labels_stay_in_workspace() {
    assert_eq!(paths().source_path("@//pkg:x.cc"), PathBuf::from("/ws/pkg/x.cc"));
    assert_eq!(paths().source_path("@@//pkg:x.cc"), PathBuf::from("/ws/pkg/x.cc"));
    assert_eq!(paths().generated_path("@//pkg:gen.h"), PathBuf::from("/ws/bazel-bin/pkg/gen.h"));
  }

  #[test]
  fn generated_label_paths() {
    assert_eq!(
      paths().generated_path("//foo:gen.h"),
      PathBuf::from("/ws/bazel-bin/foo/gen.h")
    );
    assert_eq!(
      paths().generated_path("@zlib//:config.h"),
      PathBuf::from("/ws/bazel-bin/external/zlib/config.h")
    );
  }

  #[test]
  #[serial]
  fn explicit_workspace_root_wins() {
    let temp = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();

    temp_env::with_var(WORKSPACE_DIR_ENV, Some(other.path().to_str().unwrap()), || {
      let root = WorkspacePaths::find_workspace_root(Some(temp.path())).unwrap();
      assert_eq!(root, dunce::canonicalize(temp.path()).unwrap());
    });
  }

  #[test]
  #[serial]
  fn workspace_root_from_env() {
    let temp = TempDir::new().unwrap();

    temp_env::with_var(WORKSPACE_DIR_ENV, Some(temp.path().to_str().unwrap()), || {
      let root = WorkspacePaths::find_workspace_root(None).unwrap();
      assert_eq!(root, dunce::canonicalize(temp.path()).unwrap());
    });
  }

  #[test]
  #[serial]
  fn missing_workspace_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("does-not-exist");

    let err = WorkspacePaths::find_workspace_root(Some(&missing)).unwrap_err();
    assert!(matches!(err, WorkspaceError::Canonicalize { .. }));
  }
}

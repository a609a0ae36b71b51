//! Git-backed [`Vcs`].
//!
//! Read-only queries (current checkout, revision resolution) go through
//! `gix`. Working-tree mutations (checkout, stash) run the `git` binary, which
//! owns the index and stash formats.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::{Vcs, VcsError};

const STASH_REF: &str = "refs/stash";

/// [`Vcs`] over the git repository containing `workdir`.
#[derive(Debug, Clone)]
pub struct GitCli {
  workdir: PathBuf,
}

impl GitCli {
  pub fn new(workdir: impl Into<PathBuf>) -> Self {
    Self { workdir: workdir.into() }
  }

  fn open(&self) -> Result<gix::Repository, VcsError> {
    gix::discover(&self.workdir).map_err(|e| VcsError::Open {
      path: self.workdir.clone(),
      source: Box::new(e),
    })
  }

  fn command(&self, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(&self.workdir);
    cmd
  }

  /// Run git, failing on a non-zero exit. Returns trimmed stdout.
  fn run(&self, args: &[&str]) -> Result<String, VcsError> {
    let command_line = format!("git {}", args.join(" "));
    debug!(command = %command_line, "running git");

    let output = self.command(args).output().map_err(VcsError::Spawn)?;
    if !output.status.success() {
      return Err(VcsError::Failed {
        command: command_line,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Commit at the top of the stash, if any.
  fn stash_top(&self) -> Result<Option<String>, VcsError> {
    let output = self
      .command(&["rev-parse", "--quiet", "--verify", STASH_REF])
      .output()
      .map_err(VcsError::Spawn)?;

    if output.status.success() {
      Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
      Ok(None)
    }
  }
}

impl Vcs for GitCli {
  fn current_checkout(&self) -> Result<String, VcsError> {
    let repo = self.open()?;
    let head = repo.head().map_err(|e| VcsError::ResolveHead(e.to_string()))?;

    if let Some(name) = head.referent_name() {
      return Ok(name.shorten().to_string());
    }

    head
      .id()
      .map(|id| id.to_string())
      .ok_or_else(|| VcsError::ResolveHead("HEAD does not point to a commit".to_string()))
  }

  fn resolve(&self, commitish: &str) -> Result<String, VcsError> {
    let repo = self.open()?;
    let id = repo.rev_parse_single(commitish).map_err(|e| VcsError::Resolve {
      commitish: commitish.to_string(),
      message: e.to_string(),
    })?;
    Ok(id.to_string())
  }

  fn checkout(&self, commitish: &str) -> Result<(), VcsError> {
    self.run(&["checkout", "--quiet", commitish])?;
    Ok(())
  }

  fn stash(&self) -> Result<bool, VcsError> {
    let before = self.stash_top()?;
    self.run(&["stash", "push", "--include-untracked"])?;
    let after = self.stash_top()?;
    Ok(before != after)
  }

  fn unstash(&self) -> Result<(), VcsError> {
    self.run(&["stash", "pop", "--quiet"])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::path::Path;
  use tempfile::TempDir;

  /// Run git in `dir` with a fixed identity, panicking on failure.
  fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
      .args(["-c", "user.name=test", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false"])
      .args(args)
      .current_dir(dir)
      .output()
      .unwrap();
    assert!(
      output.status.success(),
      "git {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
  }

  /// A repository on branch `main` with two commits touching `file.txt`.
  fn repo_with_history() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    git(dir, &["init", "--quiet", "--initial-branch=main"]);
    fs::write(dir.join("file.txt"), "one").unwrap();
    git(dir, &["add", "file.txt"]);
    git(dir, &["commit", "--quiet", "-m", "first"]);
    fs::write(dir.join("file.txt"), "two").unwrap();
    git(dir, &["commit", "--quiet", "-am", "second"]);
    temp
  }

  #[test]
  fn current_checkout_is_branch_name() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());

    assert_eq!(vcs.current_checkout().unwrap(), "main");
  }

  #[test]
  fn detached_head_reports_commit() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());
    let parent = git(temp.path(), &["rev-parse", "HEAD~1"]);

    vcs.checkout(&parent).unwrap();
    assert_eq!(vcs.current_checkout().unwrap(), parent);
  }

  #[test]
  fn resolves_relative_commitish() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());

    assert_eq!(vcs.resolve("HEAD~1").unwrap(), git(temp.path(), &["rev-parse", "HEAD~1"]));
    assert!(matches!(vcs.resolve("no-such-ref"), Err(VcsError::Resolve { .. })));
  }

  #[test]
  fn checkout_changes_working_tree() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());

    vcs.checkout("HEAD~1").unwrap();
    assert_eq!(fs::read_to_string(temp.path().join("file.txt")).unwrap(), "one");

    vcs.checkout("main").unwrap();
    assert_eq!(fs::read_to_string(temp.path().join("file.txt")).unwrap(), "two");
  }

  #[test]
  fn stash_round_trip() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());
    fs::write(temp.path().join("file.txt"), "dirty").unwrap();
    fs::write(temp.path().join("new.txt"), "untracked").unwrap();

    assert!(vcs.stash().unwrap());
    assert_eq!(fs::read_to_string(temp.path().join("file.txt")).unwrap(), "two");
    assert!(!temp.path().join("new.txt").exists());

    vcs.unstash().unwrap();
    assert_eq!(fs::read_to_string(temp.path().join("file.txt")).unwrap(), "dirty");
    assert!(temp.path().join("new.txt").exists());
  }

  #[test]
  fn stash_of_clean_tree_stashes_nothing() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());

    assert!(!vcs.stash().unwrap());
  }

  #[test]
  fn failed_checkout_reports_stderr() {
    let temp = repo_with_history();
    let vcs = GitCli::new(temp.path());

    match vcs.checkout("no-such-branch") {
      Err(VcsError::Failed { command, stderr, .. }) => {
        assert!(command.contains("checkout"));
        assert!(!stderr.is_empty());
      }
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn outside_a_repository_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let vcs = GitCli::new(temp.path().join("missing"));

    assert!(matches!(vcs.current_checkout(), Err(VcsError::Open { .. })));
  }
}

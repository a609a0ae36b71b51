//! Version-control collaborator and scoped working-tree changes.
//!
//! The working tree is shared between the two snapshot computations, so every
//! state change is held by a guard that puts it back exactly once:
//! - [`CheckoutGuard`]: checks out another commit, restores the original checkout
//! - [`StashGuard`]: sets uncommitted changes aside, restores them
//!
//! Call `restore()` to observe a restore failure. A guard dropped without
//! `restore()` (early return, `?`, panic) restores in `Drop` and logs failures.

pub mod git;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

pub use git::GitCli;

/// Errors from the version-control tool.
#[derive(Debug, Error)]
pub enum VcsError {
  /// The repository could not be opened.
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::discover::Error>,
  },

  /// HEAD could not be read.
  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),

  /// A commit-ish did not resolve to a single object.
  #[error("can't resolve commitish '{commitish}': {message}")]
  Resolve { commitish: String, message: String },

  /// The version-control binary could not be started.
  #[error("failed to run git: {0}")]
  Spawn(#[source] std::io::Error),

  /// The version-control binary exited unsuccessfully.
  #[error("'{command}' failed with exit code {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Operations the change detector needs from version control.
pub trait Vcs {
  /// The current checkout: a branch name, or a commit hash when detached.
  fn current_checkout(&self) -> Result<String, VcsError>;

  /// Resolve a commit-ish (e.g. `HEAD~1`) to an absolute commit id.
  fn resolve(&self, commitish: &str) -> Result<String, VcsError>;

  /// Check out a commit-ish.
  fn checkout(&self, commitish: &str) -> Result<(), VcsError>;

  /// Set uncommitted changes aside. Returns false if there was nothing to set aside.
  fn stash(&self) -> Result<bool, VcsError>;

  /// Restore the most recently stashed changes.
  fn unstash(&self) -> Result<(), VcsError>;
}

/// A checkout of another commit, reverted when the guard is restored or dropped.
#[must_use = "dropping the guard immediately restores the original checkout"]
pub struct CheckoutGuard<'a, V: Vcs + ?Sized> {
  vcs: &'a V,
  original: String,
  restored: bool,
}

impl<'a, V: Vcs + ?Sized> CheckoutGuard<'a, V> {
  /// Record the current checkout, then check out `commitish`.
  pub fn enter(vcs: &'a V, commitish: &str) -> Result<Self, VcsError> {
    let original = vcs.current_checkout()?;
    vcs.checkout(commitish)?;
    info!(from = %original, to = %commitish, "checked out");

    Ok(Self {
      vcs,
      original,
      restored: false,
    })
  }

  /// The checkout that will be restored.
  pub fn original(&self) -> &str {
    &self.original
  }

  /// Check the original checkout back out.
  pub fn restore(mut self) -> Result<(), VcsError> {
    self.restored = true;
    self.vcs.checkout(&self.original)?;
    info!(to = %self.original, "restored checkout");
    Ok(())
  }
}

impl<V: Vcs + ?Sized> Drop for CheckoutGuard<'_, V> {
  fn drop(&mut self) {
    if self.restored {
      return;
    }
    self.restored = true;
    if let Err(err) = self.vcs.checkout(&self.original) {
      error!(to = %self.original, error = %err, "failed to restore checkout");
    }
  }
}

/// Uncommitted changes set aside, brought back when the guard is restored or dropped.
#[must_use = "dropping the guard immediately restores the stashed changes"]
pub struct StashGuard<'a, V: Vcs + ?Sized> {
  vcs: &'a V,
  stashed: bool,
  restored: bool,
}

impl<'a, V: Vcs + ?Sized> StashGuard<'a, V> {
  /// Stash uncommitted changes.
  pub fn enter(vcs: &'a V) -> Result<Self, VcsError> {
    let stashed = vcs.stash()?;
    if stashed {
      info!("stashed uncommitted changes");
    } else {
      info!("no uncommitted changes to stash");
    }

    Ok(Self {
      vcs,
      stashed,
      restored: false,
    })
  }

  /// Whether anything was stashed.
  pub fn stashed(&self) -> bool {
    self.stashed
  }

  /// Bring the stashed changes back.
  pub fn restore(mut self) -> Result<(), VcsError> {
    self.restored = true;
    if self.stashed {
      self.vcs.unstash()?;
      info!("restored uncommitted changes");
    }
    Ok(())
  }
}

impl<V: Vcs + ?Sized> Drop for StashGuard<'_, V> {
  fn drop(&mut self) {
    if self.restored {
      return;
    }
    self.restored = true;
    if self.stashed
      && let Err(err) = self.vcs.unstash()
    {
      error!(error = %err, "failed to restore stashed changes");
    }
  }
}

#[cfg(test)]
pub(crate) mod testutil {
  use std::cell::RefCell;

  use super::{Vcs, VcsError};

  /// In-memory [`Vcs`] that records every call.
  #[derive(Debug, Default)]
  pub struct FakeVcs {
    pub head: RefCell<String>,
    pub calls: RefCell<Vec<String>>,
    pub dirty: bool,
    pub fail_checkout_of: Option<String>,
  }

  impl FakeVcs {
    pub fn on_branch(branch: &str) -> Self {
      Self {
        head: RefCell::new(branch.to_string()),
        ..Self::default()
      }
    }

    pub fn calls(&self) -> Vec<String> {
      self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
      self.calls.borrow_mut().push(call);
    }
  }

  impl Vcs for FakeVcs {
    fn current_checkout(&self) -> Result<String, VcsError> {
      Ok(self.head.borrow().clone())
    }

    fn resolve(&self, commitish: &str) -> Result<String, VcsError> {
      self.record(format!("resolve {}", commitish));
      Ok(format!("sha-of-{}", commitish))
    }

    fn checkout(&self, commitish: &str) -> Result<(), VcsError> {
      self.record(format!("checkout {}", commitish));
      if self.fail_checkout_of.as_deref() == Some(commitish) {
        return Err(VcsError::Failed {
          command: format!("git checkout {}", commitish),
          code: Some(1),
          stderr: "error: pathspec did not match".to_string(),
        });
      }
      *self.head.borrow_mut() = commitish.to_string();
      Ok(())
    }

    fn stash(&self) -> Result<bool, VcsError> {
      self.record("stash".to_string());
      Ok(self.dirty)
    }

    fn unstash(&self) -> Result<(), VcsError> {
      self.record("unstash".to_string());
      Ok(())
    }
  }
}

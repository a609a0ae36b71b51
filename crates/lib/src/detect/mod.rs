//! Before/after change detection.
//!
//! Both comparison modes have the same shape:
//!
//! ```text
//! enter alternate state -> snapshot "before" -> restore -> snapshot "after" -> diff
//! ```
//!
//! - working tree: the alternate state is the tree with uncommitted changes stashed
//! - commit pair: the alternate state is a checkout of the base commit
//!
//! The alternate state is held by a guard from [`crate::vcs`], so the restore
//! runs exactly once whether or not the "before" snapshot succeeds.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::graph::TargetGraph;
use crate::hash::{HashError, compute_hashes};
use crate::query::{QueryError, QueryTool};
use crate::snapshot::{ChangeReport, HashSnapshot};
use crate::vcs::{CheckoutGuard, StashGuard, Vcs, VcsError};
use crate::workspace::WorkspacePaths;

/// Errors that abort a change detection run.
#[derive(Debug, Error)]
pub enum DetectError {
  #[error(transparent)]
  Query(#[from] QueryError),

  #[error(transparent)]
  Hash(#[from] HashError),

  #[error(transparent)]
  Vcs(#[from] VcsError),
}

/// Query `universe`, build its graph, and hash every target.
pub fn compute_snapshot<Q: QueryTool + ?Sized>(
  query: &Q,
  paths: &WorkspacePaths,
  universe: &[String],
) -> Result<HashSnapshot, DetectError> {
  analyze(query, paths, universe).map(|(_, snapshot)| snapshot)
}

fn analyze<Q: QueryTool + ?Sized>(
  query: &Q,
  paths: &WorkspacePaths,
  universe: &[String],
) -> Result<(TargetGraph, HashSnapshot), DetectError> {
  let targets = query.query_deps(universe)?;
  let graph = TargetGraph::from_targets(targets);
  let snapshot = compute_hashes(&graph, paths)?;
  info!(targets = snapshot.len(), "computed target hashes");
  Ok((graph, snapshot))
}

/// Both snapshots of a comparison and the report derived from them.
#[derive(Debug, Serialize)]
pub struct Comparison {
  pub before: HashSnapshot,
  pub after: HashSnapshot,
  #[serde(flatten)]
  pub report: ChangeReport,
  /// Graph of the "after" state.
  #[serde(skip)]
  pub graph: TargetGraph,
}

impl Comparison {
  fn new(before: HashSnapshot, after: HashSnapshot, graph: TargetGraph) -> Self {
    let report = ChangeReport::between(&before, &after);
    info!(
      before = report.before_count,
      after = report.after_count,
      changed = report.changed.len(),
      "compared snapshots"
    );
    Self {
      before,
      after,
      report,
      graph,
    }
  }

  /// Short description of a target in the "after" graph (rule class or file kind).
  pub fn kind_of(&self, name: &str) -> Option<&str> {
    self.graph.get(name).map(|idx| self.graph.node(idx).target.kind())
  }

  /// Direct dependencies of `name` that changed too, in hashing order.
  ///
  /// Empty for a target whose own content changed (a file, or a rule whose
  /// attributes were edited).
  pub fn changed_dependencies(&self, name: &str) -> Vec<&str> {
    self
      .graph
      .dependencies(name)
      .into_iter()
      .filter(|dep| self.report.changed.contains(dep))
      .collect()
  }
}

/// Compares target hashes across two states of a repository.
pub struct ChangeDetector<'a, Q: QueryTool + ?Sized, V: Vcs + ?Sized> {
  query: &'a Q,
  vcs: &'a V,
  paths: &'a WorkspacePaths,
  universe: Vec<String>,
}

impl<'a, Q: QueryTool + ?Sized, V: Vcs + ?Sized> ChangeDetector<'a, Q, V> {
  pub fn new(query: &'a Q, vcs: &'a V, paths: &'a WorkspacePaths, universe: Vec<String>) -> Self {
    Self {
      query,
      vcs,
      paths,
      universe,
    }
  }

  /// Hash the universe in the repository's current state.
  pub fn snapshot(&self) -> Result<HashSnapshot, DetectError> {
    compute_snapshot(self.query, self.paths, &self.universe)
  }

  /// Targets affected by the uncommitted changes in the working tree.
  pub fn working_tree_changes(&self) -> Result<Comparison, DetectError> {
    let guard = StashGuard::enter(self.vcs)?;
    let before = self.snapshot();
    guard.restore()?;
    let before = before?;

    let (graph, after) = analyze(self.query, self.paths, &self.universe)?;
    Ok(Comparison::new(before, after, graph))
  }

  /// Targets affected between `base` and the current checkout.
  ///
  /// `base` is resolved to a commit id before anything is checked out, so
  /// relative names like `HEAD~1` refer to the starting checkout.
  pub fn commit_changes(&self, base: &str) -> Result<Comparison, DetectError> {
    let base_id = self.vcs.resolve(base)?;
    info!(base = %base, commit = %base_id, "comparing against base commit");

    let guard = CheckoutGuard::enter(self.vcs, &base_id)?;
    let before = self.snapshot();
    guard.restore()?;
    let before = before?;

    let (graph, after) = analyze(self.query, self.paths, &self.universe)?;
    Ok(Comparison::new(before, after, graph))
  }
}

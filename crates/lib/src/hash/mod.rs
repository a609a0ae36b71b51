//! Content hashing of the target graph.
//!
//! This module provides:
//! - `Fnv32`: the 32-bit running checksum every hash is built from
//! - `canonicalize()`: the deterministic string form of a rule attribute
//! - `ContentHasher`: memoized, cycle-checked hashing of graph nodes
//! - `compute_hashes()`: a full [`HashSnapshot`](crate::snapshot::HashSnapshot) for a graph

pub mod canonical;
pub mod engine;
pub mod fnv;

use thiserror::Error;

pub use canonical::{UnsupportedAttribute, canonicalize};
pub use engine::{ContentHasher, compute_hashes};
pub use fnv::Fnv32;

/// Errors that abort hashing.
///
/// Unreadable files and unresolved dependencies are not errors; they are
/// logged and hashing continues.
#[derive(Debug, Error)]
pub enum HashError {
  /// A rule carries an attribute with no canonical form.
  #[error("cannot hash target {target}: {source}")]
  UnsupportedAttribute {
    target: String,
    #[source]
    source: UnsupportedAttribute,
  },

  /// The dependency graph is not acyclic.
  #[error("dependency cycle detected at target {target}")]
  CycleDetected { target: String },
}

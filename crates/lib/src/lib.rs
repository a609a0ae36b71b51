//! targetdiff-lib: Core types and logic for targetdiff
//!
//! This crate computes which build targets are affected by a set of source
//! changes, without building anything:
//! - `query`: targets and attributes as reported by the build tool's query
//! - `graph`: the dependency graph assembled from a query universe
//! - `hash`: content hashing of every node in the graph
//! - `snapshot`: name → hash maps and the diff between two of them
//! - `vcs`: scoped version-control state changes (stash, checkout)
//! - `detect`: before/after orchestration producing a change report

pub mod consts;
pub mod detect;
pub mod graph;
pub mod hash;
pub mod query;
pub mod snapshot;
pub mod vcs;
pub mod workspace;

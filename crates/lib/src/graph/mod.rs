//! Target dependency graph.
//!
//! The graph is assembled once per query universe and is read-only afterwards:
//! 1. Every queried [`Target`] becomes a node keyed by its name
//! 2. Each rule's declared dependency names are resolved to nodes
//! 3. Each node's dependency list is sorted by dependency name
//!
//! The sort in step 3 is what makes hashing deterministic: dependency hashes
//! are folded in exactly this order, independent of query output order.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::query::Target;

/// A target plus its resolved, name-sorted dependencies.
#[derive(Debug, Clone)]
pub struct TargetNode {
  pub target: Target,
  /// Direct dependencies present in the universe, sorted by name.
  pub deps: Vec<NodeIndex>,
}

/// Dependency graph over one query universe.
///
/// Edges point from a target to each of its dependencies.
#[derive(Debug, Default)]
pub struct TargetGraph {
  graph: DiGraph<TargetNode, ()>,
  /// Map from target name to node index.
  nodes: BTreeMap<String, NodeIndex>,
}

impl TargetGraph {
  /// Build a graph from query results.
  ///
  /// When two targets share a name, the later one replaces the earlier.
  /// Dependency names with no matching target (external or elided by the
  /// universe) are logged and skipped.
  pub fn from_targets(targets: impl IntoIterator<Item = Target>) -> Self {
    let mut graph: DiGraph<TargetNode, ()> = DiGraph::new();
    let mut nodes: BTreeMap<String, NodeIndex> = BTreeMap::new();

    // First pass: one node per unique name
    for target in targets {
      let name = target.name().to_string();
      match nodes.get(&name) {
        Some(&idx) => {
          debug!(label = %name, "replacing duplicate target");
          graph[idx].target = target;
        }
        None => {
          let idx = graph.add_node(TargetNode { target, deps: Vec::new() });
          nodes.insert(name, idx);
        }
      }
    }

    // Second pass: resolve declared dependencies
    let indices: Vec<NodeIndex> = graph.node_indices().collect();
    for idx in indices {
      let mut deps = Vec::new();
      for dep_name in graph[idx].target.declared_deps() {
        match nodes.get(dep_name) {
          Some(&dep_idx) => deps.push(dep_idx),
          None => warn!(label = %graph[idx].target.name(), dep = %dep_name, "dependency not found in universe"),
        }
      }

      deps.sort_by(|a, b| graph[*a].target.name().cmp(graph[*b].target.name()));

      for &dep_idx in &deps {
        graph.add_edge(idx, dep_idx, ());
      }
      graph[idx].deps = deps;
    }

    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "built target graph");
    Self { graph, nodes }
  }

  /// Node index of the named target.
  pub fn get(&self, name: &str) -> Option<NodeIndex> {
    self.nodes.get(name).copied()
  }

  pub fn node(&self, idx: NodeIndex) -> &TargetNode {
    &self.graph[idx]
  }

  /// All targets in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, NodeIndex)> {
    self.nodes.iter().map(|(name, &idx)| (name.as_str(), idx))
  }

  /// Names of the direct dependencies of a target, in hashing order.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    let Some(idx) = self.get(name) else {
      return Vec::new();
    };

    self.graph[idx]
      .deps
      .iter()
      .map(|&dep| self.graph[dep].target.name())
      .collect()
  }

  /// Names of the targets that directly depend on a target, sorted.
  pub fn dependents(&self, name: &str) -> Vec<&str> {
    let Some(idx) = self.get(name) else {
      return Vec::new();
    };

    let mut dependents: Vec<&str> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|parent| self.graph[parent].target.name())
      .collect();
    dependents.sort_unstable();
    dependents.dedup();
    dependents
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

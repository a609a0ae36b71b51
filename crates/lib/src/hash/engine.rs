//! Content hashing of graph nodes.
//!
//! A node's hash is a running [`Fnv32`] checksum over, in order:
//! 1. the decimal text of each dependency's hash, in the graph's sorted order
//! 2. for rules, `name=value` for every canonicalized attribute, sorted by name
//! 3. for source and generated files, the raw bytes of the file
//!
//! Because step 1 folds in dependency hashes, a change to any file or
//! attribute reaches every target that transitively depends on it. Hashes are memoized per node, so a
//! diamond-shaped graph is walked once.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;

use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use super::HashError;
use super::canonical::canonicalize;
use super::fnv::Fnv32;
use crate::graph::TargetGraph;
use crate::query::{Rule, Target};
use crate::snapshot::HashSnapshot;
use crate::workspace::WorkspacePaths;

/// Memoizing hasher over one [`TargetGraph`].
///
/// The memo table lives here rather than on the nodes, so the graph itself
/// stays immutable.
pub struct ContentHasher<'g> {
  graph: &'g TargetGraph,
  paths: &'g WorkspacePaths,
  memo: HashMap<NodeIndex, u32>,
  /// Nodes on the current traversal path.
  visiting: HashSet<NodeIndex>,
}

impl<'g> ContentHasher<'g> {
  pub fn new(graph: &'g TargetGraph, paths: &'g WorkspacePaths) -> Self {
    Self {
      graph,
      paths,
      memo: HashMap::with_capacity(graph.len()),
      visiting: HashSet::new(),
    }
  }

  /// Hash of the named target, or `None` if it is not in the graph.
  pub fn hash_target(&mut self, name: &str) -> Result<Option<u32>, HashError> {
    match self.graph.get(name) {
      Some(idx) => self.hash(idx).map(Some),
      None => Ok(None),
    }
  }

  /// Hash of a node, computing and memoizing it and its dependencies as needed.
  ///
  /// The walk is an iterative post-order traversal, so dependency depth is
  /// not limited by the call stack.
  ///
  /// # Errors
  ///
  /// - `UnsupportedAttribute` if a rule in the node's closure has an
  ///   attribute without a canonical form
  /// - `CycleDetected` if the node's closure is not acyclic
  pub fn hash(&mut self, idx: NodeIndex) -> Result<u32, HashError> {
    if let Some(&hash) = self.memo.get(&idx) {
      return Ok(hash);
    }

    let result = self.walk(idx);
    // Nothing is in progress between calls, whatever the outcome
    self.visiting.clear();
    result
  }

  fn walk(&mut self, root: NodeIndex) -> Result<u32, HashError> {
    let graph = self.graph;

    // (node, position of the next dependency to visit)
    let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];
    self.visiting.insert(root);
    let mut last = 0;

    while let Some(frame) = stack.last_mut() {
      let (idx, next) = *frame;
      let node = graph.node(idx);

      if let Some(&dep) = node.deps.get(next) {
        frame.1 += 1;
        if self.memo.contains_key(&dep) {
          continue;
        }
        if !self.visiting.insert(dep) {
          return Err(HashError::CycleDetected {
            target: graph.node(dep).target.name().to_string(),
          });
        }
        stack.push((dep, 0));
        continue;
      }

      let hash = self.fold_node(idx)?;
      self.visiting.remove(&idx);
      self.memo.insert(idx, hash);
      stack.pop();

      debug!(label = %node.target.name(), hash, "hashed target");
      last = hash;
    }

    Ok(last)
  }

  /// Hash one node whose dependencies are all memoized.
  fn fold_node(&self, idx: NodeIndex) -> Result<u32, HashError> {
    let node = self.graph.node(idx);
    let mut hasher = Fnv32::new();

    // Deps are sorted at graph construction
    for dep in &node.deps {
      let dep_hash = self.memo[dep];
      hasher.update(dep_hash.to_string().as_bytes());
    }

    match &node.target {
      Target::Rule(rule) => fold_rule(&mut hasher, rule)?,
      Target::SourceFile { name } => fold_file(&mut hasher, &self.paths.source_path(name)),
      Target::GeneratedFile { name } => fold_file(&mut hasher, &self.paths.generated_path(name)),
    }

    Ok(hasher.sum32())
  }

  /// Hash every target in the graph.
  pub fn hash_all(mut self) -> Result<HashSnapshot, HashError> {
    let mut snapshot = HashSnapshot::new();
    for (name, idx) in self.graph.iter() {
      let hash = self.hash(idx)?;
      snapshot.insert(name.to_string(), hash);
    }
    Ok(snapshot)
  }
}

/// Hash every target of `graph`, resolving file labels through `paths`.
pub fn compute_hashes(graph: &TargetGraph, paths: &WorkspacePaths) -> Result<HashSnapshot, HashError> {
  ContentHasher::new(graph, paths).hash_all()
}

fn fold_rule(hasher: &mut Fnv32, rule: &Rule) -> Result<(), HashError> {
  let mut attrs = Vec::with_capacity(rule.attributes.len());
  for attr in &rule.attributes {
    let value = canonicalize(attr).map_err(|source| HashError::UnsupportedAttribute {
      target: rule.name.clone(),
      source,
    })?;
    attrs.push((attr.name.as_str(), value));
  }

  attrs.sort_by(|a, b| a.0.cmp(b.0));

  for (name, value) in attrs {
    hasher.update(name.as_bytes());
    hasher.update(b"=");
    hasher.update(value.as_bytes());
  }
  Ok(())
}

/// Stream a file's bytes into the hash. Unreadable files contribute nothing.
fn fold_file(hasher: &mut Fnv32, path: &Path) {
  let result = File::open(path).and_then(|mut file| io::copy(&mut file, hasher));
  if let Err(err) = result {
    warn!(path = %path.display(), error = %err, "can't read file for hashing");
  }
}

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Target name → content hash for one repository state.
///
/// Backed by a [`BTreeMap`] so iteration and serialization are in name order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashSnapshot(BTreeMap<String, u32>);

impl HashSnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: String, hash: u32) -> Option<u32> {
    self.0.insert(name, hash)
  }

  pub fn get(&self, name: &str) -> Option<u32> {
    self.0.get(name).copied()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Entries in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
    self.0.iter().map(|(name, &hash)| (name.as_str(), hash))
  }
}

impl FromIterator<(String, u32)> for HashSnapshot {
  fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl IntoIterator for HashSnapshot {
  type Item = (String, u32);
  type IntoIter = btree_map::IntoIter<String, u32>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

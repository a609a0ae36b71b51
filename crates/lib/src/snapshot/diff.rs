//! Diff computation between two hash snapshots.
//!
//! The diff answers "what might need rebuilding now": targets that are new or
//! whose hash changed. Targets that disappeared are deliberately not reported.

use serde::Serialize;

use super::types::HashSnapshot;

/// Targets whose content changed between two snapshots.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
  /// Changed or new targets, with their hash in the later snapshot.
  pub changed: HashSnapshot,

  /// Number of targets in the earlier snapshot.
  pub before_count: usize,

  /// Number of targets in the later snapshot.
  pub after_count: usize,
}

impl ChangeReport {
  /// Compare `before` against `after`.
  pub fn between(before: &HashSnapshot, after: &HashSnapshot) -> Self {
    Self {
      changed: diff(before, after),
      before_count: before.len(),
      after_count: after.len(),
    }
  }

  /// Returns true if no target changed.
  pub fn is_empty(&self) -> bool {
    self.changed.is_empty()
  }
}

/// Entries of `current` that are absent from `previous` or hash differently.
///
/// Entries only present in `previous` are ignored.
pub fn diff(previous: &HashSnapshot, current: &HashSnapshot) -> HashSnapshot {
  current
    .iter()
    .filter(|&(name, hash)| previous.get(name) != Some(hash))
    .map(|(name, hash)| (name.to_string(), hash))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot(entries: &[(&str, u32)]) -> HashSnapshot {
    entries.iter().map(|&(name, hash)| (name.to_string(), hash)).collect()
  }

  #[test]
  fn diff_empty_snapshots() {
    let report = ChangeReport::between(&HashSnapshot::new(), &HashSnapshot::new());
    assert!(report.is_empty());
    assert_eq!(report.before_count, 0);
    assert_eq!(report.after_count, 0);
  }

  #[test]
  fn diff_reports_new_and_changed_but_not_removed() {
    let previous = snapshot(&[("A", 1), ("B", 2)]);
    let current = snapshot(&[("A", 1), ("C", 3)]);

    assert_eq!(diff(&previous, &current), snapshot(&[("C", 3)]));
  }

  #[test]
  fn diff_reports_changed_hash_with_new_value() {
    let previous = snapshot(&[("A", 1), ("B", 2)]);
    let current = snapshot(&[("A", 10), ("B", 2)]);

    assert_eq!(diff(&previous, &current), snapshot(&[("A", 10)]));
  }

  #[test]
  fn identical_snapshots_have_no_changes() {
    let previous = snapshot(&[("A", 1), ("B", 2)]);
    let report = ChangeReport::between(&previous, &previous.clone());

    assert!(report.is_empty());
    assert_eq!(report.before_count, 2);
    assert_eq!(report.after_count, 2);
  }

  #[test]
  fn first_snapshot_reports_everything() {
    let current = snapshot(&[("A", 1), ("B", 2)]);
    assert_eq!(diff(&HashSnapshot::new(), &current), current);
  }

  #[test]
  fn report_serializes_changed_as_object() {
    let report = ChangeReport::between(&snapshot(&[("A", 1)]), &snapshot(&[("A", 2), ("B", 3)]));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(
      json,
      serde_json::json!({ "changed": { "A": 2, "B": 3 }, "before_count": 1, "after_count": 2 })
    );
  }
}

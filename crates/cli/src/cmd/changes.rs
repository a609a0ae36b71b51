//! Changes command implementation.
//!
//! Hashes the universe in two repository states and prints the targets whose
//! hash differs, as `name=hash` lines.

use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use targetdiff_lib::detect::{ChangeDetector, Comparison};
use targetdiff_lib::vcs::GitCli;

use super::{GlobalArgs, Session, universe_or_default};
use crate::output::{OutputFormat, format_duration, print_json, print_summary, symbols};

pub fn cmd_changes(
  global: &GlobalArgs,
  universe: Vec<String>,
  base: &str,
  working_tree: bool,
  verbose: bool,
  format: OutputFormat,
) -> Result<()> {
  let session = Session::open(global)?;
  let vcs = GitCli::new(session.paths.workspace_root.clone());
  let detector = ChangeDetector::new(&session.query, &vcs, &session.paths, universe_or_default(universe));

  let start = Instant::now();
  let comparison = if working_tree {
    detector
      .working_tree_changes()
      .context("Failed to compare uncommitted changes")?
  } else {
    detector
      .commit_changes(base)
      .with_context(|| format!("Failed to compare against {}", base))?
  };

  if format.is_json() {
    return print_json(&comparison);
  }

  print_changes(&comparison, verbose);

  if verbose {
    print_summary(&format!(
      "{} of {} targets changed ({} before) in {}",
      comparison.report.changed.len(),
      comparison.report.after_count,
      comparison.report.before_count,
      format_duration(start.elapsed())
    ));
  }

  Ok(())
}

fn print_changes(comparison: &Comparison, verbose: bool) {
  if comparison.report.is_empty() {
    println!("No changes detected.");
    return;
  }

  for (name, hash) in comparison.report.changed.iter() {
    println!("{}={}", name, hash);

    if !verbose {
      continue;
    }

    let kind = comparison.kind_of(name).unwrap_or("target");
    let causes = comparison.changed_dependencies(name);
    if !comparison.before.contains(name) {
      eprintln!(
        "  {} {}",
        symbols::ADD.if_supports_color(Stream::Stderr, |s| s.green()),
        format!("new {}", kind).if_supports_color(Stream::Stderr, |s| s.dimmed())
      );
    } else if causes.is_empty() {
      eprintln!(
        "  {} {}",
        symbols::MODIFY.if_supports_color(Stream::Stderr, |s| s.yellow()),
        format!("{} content changed", kind).if_supports_color(Stream::Stderr, |s| s.dimmed())
      );
    }
    for dep in causes {
      eprintln!(
        "  {} {}",
        symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.dimmed()),
        dep
      );
    }
  }
}

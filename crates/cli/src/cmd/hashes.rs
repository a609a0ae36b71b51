use anyhow::{Context, Result};

use targetdiff_lib::detect::compute_snapshot;

use super::{GlobalArgs, Session, universe_or_default};
use crate::output::{OutputFormat, print_json};

pub fn cmd_hashes(global: &GlobalArgs, universe: Vec<String>, format: OutputFormat) -> Result<()> {
  let session = Session::open(global)?;
  let universe = universe_or_default(universe);

  let snapshot =
    compute_snapshot(&session.query, &session.paths, &universe).context("Failed to compute target hashes")?;

  if format.is_json() {
    return print_json(&snapshot);
  }

  for (name, hash) in snapshot.iter() {
    println!("{}={}", name, hash);
  }

  Ok(())
}

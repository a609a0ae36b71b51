mod changes;
mod hashes;
mod info;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use targetdiff_lib::consts::{BAZEL_BIN_ENV, DEFAULT_BAZEL_BIN, DEFAULT_UNIVERSE};
use targetdiff_lib::query::BazelQuery;
use targetdiff_lib::workspace::WorkspacePaths;

pub use changes::cmd_changes;
pub use hashes::cmd_hashes;
pub use info::cmd_info;

/// Flags shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
  /// Workspace root (default: $BUILD_WORKSPACE_DIRECTORY, then the current directory)
  #[arg(long, global = true)]
  pub workspace: Option<PathBuf>,

  /// Execution root holding external repositories (default: ask the build tool)
  #[arg(long, global = true)]
  pub execution_root: Option<PathBuf>,

  /// Output tree holding generated files (default: <workspace>/bazel-bin)
  #[arg(long, global = true)]
  pub output_root: Option<PathBuf>,

  /// Build tool binary (default: $TARGETDIFF_BAZEL, then bazel)
  #[arg(long, global = true)]
  pub bazel: Option<String>,

  /// Log filter, overridden by RUST_LOG
  #[arg(long, global = true, default_value = "warn")]
  pub log_level: String,
}

/// The build tool and the paths labels resolve under.
pub struct Session {
  pub query: BazelQuery,
  pub paths: WorkspacePaths,
}

impl Session {
  pub fn open(args: &GlobalArgs) -> Result<Self> {
    let workspace_root =
      WorkspacePaths::find_workspace_root(args.workspace.as_deref()).context("Failed to locate workspace")?;

    let program = args
      .bazel
      .clone()
      .or_else(|| std::env::var(BAZEL_BIN_ENV).ok())
      .unwrap_or_else(|| DEFAULT_BAZEL_BIN.to_string());
    let query = BazelQuery::new(program, workspace_root.clone());

    let execution_root = match &args.execution_root {
      Some(path) => path.clone(),
      None => query
        .execution_root()
        .context("Failed to determine execution root (pass --execution-root to skip discovery)")?,
    };

    let paths = WorkspacePaths::new(workspace_root, execution_root, args.output_root.clone());
    debug!(
      workspace = %paths.workspace_root.display(),
      execution_root = %paths.execution_root.display(),
      output_root = %paths.output_root.display(),
      "resolved workspace paths"
    );
    Ok(Self { query, paths })
  }
}

/// The patterns to analyze, defaulting to the whole workspace.
fn universe_or_default(universe: Vec<String>) -> Vec<String> {
  if universe.is_empty() {
    vec![DEFAULT_UNIVERSE.to_string()]
  } else {
    universe
  }
}

mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use targetdiff_lib::consts::DEFAULT_BASE;

use crate::cmd::GlobalArgs;
use crate::output::{OutputFormat, print_error};

/// targetdiff - report which build targets a change affects
#[derive(Parser)]
#[command(name = "targetdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List targets whose content changed between two states of the repository
  Changes {
    /// Target patterns to analyze (default: //...)
    universe: Vec<String>,

    /// Commit to compare the current checkout against
    #[arg(long, default_value = DEFAULT_BASE, conflicts_with = "working_tree")]
    base: String,

    /// Compare uncommitted changes against the current checkout instead
    #[arg(long)]
    working_tree: bool,

    /// Show which changed dependencies caused each change
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Print the content hash of every target in the current tree
  Hashes {
    /// Target patterns to analyze (default: //...)
    universe: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the resolved workspace paths
  Info {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn init_tracing(level: &str) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(&cli.global.log_level);

  let result = match cli.command {
    Commands::Changes {
      universe,
      base,
      working_tree,
      verbose,
      output,
    } => cmd::cmd_changes(&cli.global, universe, &base, working_tree, verbose, output),
    Commands::Hashes { universe, output } => cmd::cmd_hashes(&cli.global, universe, output),
    Commands::Info { output } => cmd::cmd_info(&cli.global, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_env, cmd_info};
use crate::output::print_error;

/// bgraph - inspect resolved build graphs
#[derive(Parser)]
#[command(name = "bgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Print machine-readable JSON
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the products of a build graph
  Info {
    /// Path to the build graph file
    graph: PathBuf,
  },

  /// Compute and print the environment of a product
  Env {
    /// Path to the build graph file
    graph: PathBuf,

    /// Name of the product
    #[arg(short, long)]
    product: String,

    /// Compute the run environment instead of the build environment
    #[arg(long)]
    run: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Info { graph } => cmd_info(&graph, cli.verbose, cli.json),
    Commands::Env { graph, product, run } => cmd_env(&graph, &product, run, cli.json),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

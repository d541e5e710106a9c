mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{ListMode, cmd_check, cmd_list, cmd_run};
use crate::output::{OutputFormat, print_error};

/// barf - build and run flow for HDL components
#[derive(Parser)]
#[command(name = "barf")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a flow script
  Run {
    /// Path to the flow script
    #[arg(short, long)]
    file: PathBuf,

    /// Top component (overrides the script's `top`)
    #[arg(short, long)]
    top: Option<String>,
  },

  /// Print the dependency-ordered build list
  List {
    /// Top component to resolve from
    #[arg(short, long)]
    top: String,

    /// Print the ordered file list
    #[arg(long, conflicts_with = "options")]
    files: bool,

    /// Print the ordered option list
    #[arg(long)]
    options: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Load every manifest and validate the component graph
  Check {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "info" } else { "warn" };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result: Result<()> = match cli.command {
    Commands::Run { file, top } => cmd_run(&file, top.as_deref()),
    Commands::List {
      top,
      files,
      options,
      output,
    } => {
      let mode = if files {
        ListMode::Files
      } else if options {
        ListMode::Options
      } else {
        ListMode::Names
      };
      cmd_list(&top, mode, output)
    }
    Commands::Check { output } => cmd_check(cli.verbose, output),
  };

  if let Err(err) = result {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}

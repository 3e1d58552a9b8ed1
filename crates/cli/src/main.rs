mod archive;
mod cmd;
mod output;

#[cfg(test)]
#[path = "../build/archive_source.rs"]
mod archive_source;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{Overrides, Session};
use output::{OutputFormat, print_error};

/// wodman - run the podman service in a WSL distribution
#[derive(Parser)]
#[command(name = "wodman")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(flatten)]
  overrides: Overrides,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Default)]
enum Commands {
  /// Register the distribution if needed and start podman (default)
  #[default]
  Up,

  /// Register the distribution without starting podman
  Register,

  /// Show whether the distribution is registered and running
  Status {
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the effective configuration
  Config {
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose {
    "warn,wodman_lib=debug,wodman=debug"
  } else {
    "warn"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let session = Session::new(&cli.overrides);
  let result = match cli.command.unwrap_or_default() {
    Commands::Up => cmd::cmd_up(&session),
    Commands::Register => cmd::cmd_register(&session),
    Commands::Status { output } => cmd::cmd_status(&session, output),
    Commands::Config { output } => cmd::cmd_config(&session, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

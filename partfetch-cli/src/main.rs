//! partfetch CLI - split, fetch and reassemble framed part files.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use partfetch::config::ConfigFile;
use partfetch::logging::{init_logging, LoggingOptions};
use tracing::warn;

use commands::combine::CombineArgs;
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::inspect::InspectArgs;
use commands::order::OrderArgs;
use commands::split::SplitArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "partfetch")]
#[command(version, about = "Split, fetch and reassemble framed part files", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Split a file into framed parts
    Split(SplitArgs),

    /// Reassemble parts into the original file
    Combine(CombineArgs),

    /// Show the order parts would be combined in
    Order(OrderArgs),

    /// Print the frame header of part files
    Inspect(InspectArgs),

    /// Download the parts listed in a manifest
    Fetch(FetchArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // A broken config file should not stop `config init --force` from fixing it
    let (config, config_error) = match ConfigFile::load() {
        Ok(config) => (config, None),
        Err(e) => (ConfigFile::default(), Some(e)),
    };

    let _log_guard = init_logging(&LoggingOptions {
        verbose: cli.verbose,
        level: Some(config.logging.level.clone()),
        log_file: cli.log_file.or_else(|| config.logging.file.clone()),
    })?;

    if let Some(e) = config_error {
        if !matches!(cli.command, Commands::Config { .. }) {
            return Err(e.into());
        }
        warn!(error = %e, "Ignoring unreadable config file");
    }

    match cli.command {
        Commands::Split(args) => commands::split::run(args, &config),
        Commands::Combine(args) => commands::combine::run(args, &config),
        Commands::Order(args) => commands::order::run(args, &config),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Fetch(args) => commands::fetch::run(args, &config),
        Commands::Config { command } => commands::config::run(command, &config),
    }
}

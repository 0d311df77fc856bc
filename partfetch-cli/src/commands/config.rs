//! Configuration management CLI commands.

use clap::Subcommand;
use partfetch::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective settings
    Show,

    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(config),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path()
        .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))?;
    println!("{}", path.display());
    Ok(())
}

fn run_show(config: &ConfigFile) -> Result<(), CliError> {
    println!("[fetch]");
    println!("  concurrency = {}", config.fetch.concurrency);
    println!("  buffer_size = {}", config.fetch.buffer_size);
    println!(
        "  connect_timeout_secs = {}",
        config.fetch.connect_timeout_secs
    );
    if config.fetch.timeout_secs == 0 {
        println!("  timeout_secs = 0 (none)");
    } else {
        println!("  timeout_secs = {}", config.fetch.timeout_secs);
    }
    println!();
    println!("[parts]");
    println!("  extension = {}", config.parts.extension);
    println!("  encoding = {}", config.parts.encoding);
    println!("  chunk_size = {}", config.parts.chunk_size);
    println!();
    println!("[logging]");
    println!("  level = {}", config.logging.level);
    match &config.logging.file {
        Some(file) => println!("  file = {}", file.display()),
        None => println!("  file = (not set)"),
    }
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path()
        .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))?;

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

//! `partfetch order` - show the order parts would be combined in.

use std::path::PathBuf;

use clap::Args;
use partfetch::config::ConfigFile;
use partfetch::PartCombiner;

use super::common::{resolve_extension, OrderArg};
use crate::error::CliError;

/// Arguments for `order`.
#[derive(Debug, Args)]
pub struct OrderArgs {
    /// Directory holding the parts
    pub dir: PathBuf,

    /// Part file extension (defaults to config)
    #[arg(long)]
    pub ext: Option<String>,

    /// How to order the parts
    #[arg(long, value_enum, default_value = "id")]
    pub by: OrderArg,
}

/// Run `order`.
pub fn run(args: OrderArgs, config: &ConfigFile) -> Result<(), CliError> {
    let ordered = PartCombiner::new()
        .with_extension(resolve_extension(args.ext, config))
        .with_strategy(args.by.into())
        .order(&args.dir)?;

    if ordered.parts.is_empty() && ordered.skipped.is_empty() {
        println!("No parts found in {}", args.dir.display());
        return Ok(());
    }

    for (position, part) in ordered.parts.iter().enumerate() {
        match &part.header {
            Some(header) => println!(
                "{:>4}  id {:<6} {}",
                position + 1,
                header.part_id,
                part.path.display()
            ),
            None => println!("{:>4}  {}", position + 1, part.path.display()),
        }
    }

    if !ordered.skipped.is_empty() {
        println!();
        println!("Skipped ({}):", ordered.skipped.len());
        for skipped in &ordered.skipped {
            println!("  {} - {}", skipped.path.display(), skipped.error);
        }
    }

    Ok(())
}

//! `partfetch split` - cut a file into framed parts.

use std::path::PathBuf;

use clap::Args;
use partfetch::config::ConfigFile;
use partfetch::{PartSplitter, PayloadEncoding};

use super::common::{format_size, parse_size, resolve_extension};
use crate::error::CliError;

/// Arguments for `split`.
#[derive(Debug, Args)]
pub struct SplitArgs {
    /// File to split
    pub source: PathBuf,

    /// Directory to write the parts to
    #[arg(short, long)]
    pub out: PathBuf,

    /// Maximum payload per part, e.g. 100M (defaults to config)
    #[arg(short, long, value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Part file extension (defaults to config)
    #[arg(long)]
    pub ext: Option<String>,

    /// Store payloads as base64 text
    #[arg(long)]
    pub base64: bool,

    /// Id of the first part
    #[arg(long, default_value_t = 1)]
    pub first_id: i32,

    /// Part name prefix (defaults to the source file stem)
    #[arg(long)]
    pub base_name: Option<String>,
}

/// Run `split`.
pub fn run(args: SplitArgs, config: &ConfigFile) -> Result<(), CliError> {
    let chunk_size = args.chunk_size.unwrap_or(config.parts.chunk_size);
    let encoding = if args.base64 {
        PayloadEncoding::Base64
    } else {
        config.parts.encoding
    };

    let mut splitter = PartSplitter::new(chunk_size)
        .with_extension(resolve_extension(args.ext, config))
        .with_encoding(encoding)
        .with_first_part_id(args.first_id);
    if let Some(base) = args.base_name {
        splitter = splitter.with_base_name(base);
    }

    println!(
        "Splitting {} into {} parts ({})",
        args.source.display(),
        format_size(splitter.effective_chunk_size()),
        encoding
    );

    let parts = splitter.split(&args.source, &args.out)?;

    for part in &parts {
        println!("  {}", part.display());
    }
    println!();
    println!("Wrote {} parts to {}", parts.len(), args.out.display());

    Ok(())
}

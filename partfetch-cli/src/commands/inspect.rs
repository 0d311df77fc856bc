//! `partfetch inspect` - print frame headers.

use std::path::PathBuf;

use clap::Args;
use partfetch::frame::{read_header_from_path, HEADER_LEN};

use super::common::format_size;
use crate::error::CliError;

/// Arguments for `inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Part files to inspect
    #[arg(required = true)]
    pub parts: Vec<PathBuf>,
}

/// Run `inspect`. Every file is reported; the first failure is returned.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let mut first_error = None;

    for path in &args.parts {
        println!("{}", path.display());
        match read_header_from_path(path) {
            Ok(header) => {
                println!("  Part id:   {}", header.part_id);
                println!(
                    "  Payload:   {} ({} bytes)",
                    format_size(header.payload_len()),
                    header.data_size
                );
                println!("  SHA-256:   {}", header.hash_hex());
                println!("  Offset:    {}", HEADER_LEN);
            }
            Err(e) => {
                println!("  Invalid frame: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

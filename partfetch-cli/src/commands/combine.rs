//! `partfetch combine` - reassemble parts into the original file.

use std::path::{Path, PathBuf};

use clap::Args;
use partfetch::checksum::verify_checksum;
use partfetch::config::ConfigFile;
use partfetch::parts::CombineSummary;
use partfetch::{PartCombiner, PayloadEncoding, Verification};

use super::common::{format_size, resolve_encoding, resolve_extension, EncodingArg, OrderArg};
use crate::error::CliError;

/// Arguments for `combine`.
#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Directory holding the parts
    pub dir: PathBuf,

    /// File to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Part file extension (defaults to config)
    #[arg(long)]
    pub ext: Option<String>,

    /// How payloads are stored (defaults to config)
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Check each payload against the hash in its header
    #[arg(long)]
    pub strict: bool,

    /// How to order the parts
    #[arg(long, value_enum, default_value = "id")]
    pub order: OrderArg,

    /// Fail unless exactly this many consecutive parts are present
    #[arg(long)]
    pub expect: Option<usize>,

    /// Expected SHA-256 of the result
    #[arg(long)]
    pub sha256: Option<String>,
}

/// Run `combine`.
pub fn run(args: CombineArgs, config: &ConfigFile) -> Result<(), CliError> {
    let encoding = resolve_encoding(args.encoding, config);
    let extension = resolve_extension(args.ext, config);

    let mut combiner = PartCombiner::new()
        .with_extension(extension)
        .with_encoding(encoding)
        .with_verification(verification(args.strict))
        .with_strategy(args.order.into());
    if let Some(expected) = args.expect {
        combiner = combiner.with_expected_parts(expected);
    }

    let summary = combine_and_verify(
        &combiner,
        &args.dir,
        &args.output,
        args.sha256.as_deref(),
    )?;
    print_summary(&summary, &args.output, encoding);

    Ok(())
}

/// Map the `--strict` flag to a verification mode.
pub fn verification(strict: bool) -> Verification {
    if strict {
        Verification::Strict
    } else {
        Verification::Lenient
    }
}

/// Combine `dir` into `output`, then check the whole-file hash if one is given.
pub fn combine_and_verify(
    combiner: &PartCombiner,
    dir: &Path,
    output: &Path,
    sha256: Option<&str>,
) -> Result<CombineSummary, CliError> {
    let summary = combiner.combine(dir, output)?;

    if let Some(expected) = sha256 {
        verify_checksum(output, expected)?;
        println!("Checksum verified (SHA-256)");
    }

    Ok(summary)
}

pub fn print_summary(summary: &CombineSummary, output: &Path, encoding: PayloadEncoding) {
    println!(
        "Combined {} parts ({}, {}) into {}",
        summary.parts,
        format_size(summary.bytes),
        encoding,
        output.display()
    );
}

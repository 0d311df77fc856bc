//! Argument types and helpers shared across CLI commands.

use clap::ValueEnum;
use partfetch::config::ConfigFile;
use partfetch::{OrderStrategy, PayloadEncoding};

/// Payload encoding selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EncodingArg {
    /// Payload bytes stored verbatim
    Raw,
    /// Payload stored as base64 text
    Base64,
}

impl From<EncodingArg> for PayloadEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Raw => PayloadEncoding::Raw,
            EncodingArg::Base64 => PayloadEncoding::Base64,
        }
    }
}

/// Ordering strategy selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OrderArg {
    /// By the part id stored in each frame header
    Id,
    /// By the number in each file name
    Name,
}

impl From<OrderArg> for OrderStrategy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Id => OrderStrategy::EmbeddedId,
            OrderArg::Name => OrderStrategy::FileName,
        }
    }
}

/// Resolve the payload encoding from CLI args and config.
pub fn resolve_encoding(cli: Option<EncodingArg>, config: &ConfigFile) -> PayloadEncoding {
    cli.map(PayloadEncoding::from)
        .unwrap_or(config.parts.encoding)
}

/// Resolve the part extension from CLI args and config.
pub fn resolve_extension(cli: Option<String>, config: &ConfigFile) -> String {
    cli.unwrap_or_else(|| config.parts.extension.clone())
}

/// Parse a byte size such as `4096`, `512K`, `3M` or `1G` (binary units).
pub fn parse_size(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    let without_b = upper.strip_suffix("IB").or_else(|| upper.strip_suffix('B'));
    let unit_str = without_b.unwrap_or(&upper);

    let (digits, multiplier) = match unit_str.chars().last() {
        Some('K') => (&unit_str[..unit_str.len() - 1], 1024u64),
        Some('M') => (&unit_str[..unit_str.len() - 1], 1024 * 1024),
        Some('G') => (&unit_str[..unit_str.len() - 1], 1024 * 1024 * 1024),
        _ => (unit_str, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{}'", trimmed))?;

    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{}' is too large", trimmed))?;

    if bytes == 0 {
        return Err("size must be greater than zero".to_string());
    }
    Ok(bytes)
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

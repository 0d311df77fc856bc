//! Ordering of part files.
//!
//! Two strategies are available:
//!
//! - **Embedded id**: read each file's frame header and sort by `part_id`.
//!   Files whose header cannot be read are skipped, not fatal; the caller
//!   receives them as [`SkippedPart`]s and decides what to do.
//! - **File name**: sort by the last run of digits in the file name, so
//!   `part10.bin` follows `part9.bin`. Names without digits sort last.
//!
//! Both produce a total order: ties fall back to a case-insensitive path
//! comparison and finally to the exact path.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::frame::{read_header_from_path, FrameError, FrameHeader};

/// How a set of part files is put into sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderStrategy {
    /// Sort by the `part_id` stored in each frame header.
    #[default]
    EmbeddedId,
    /// Sort by the numeric suffix of each file name.
    FileName,
}

impl OrderStrategy {
    /// Order `paths` with this strategy.
    ///
    /// With [`OrderStrategy::FileName`] nothing is ever skipped.
    pub fn order<I, P>(self, paths: I) -> OrderedParts
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        match self {
            OrderStrategy::EmbeddedId => order_by_embedded_id(paths),
            OrderStrategy::FileName => OrderedParts {
                parts: order_by_file_name(paths)
                    .into_iter()
                    .map(|path| OrderedPart { path, header: None })
                    .collect(),
                skipped: Vec::new(),
            },
        }
    }
}

/// A part file in its resolved position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPart {
    /// Path of the part file.
    pub path: PathBuf,
    /// Header read while ordering, when ordering by embedded id.
    pub header: Option<FrameHeader>,
}

/// A candidate excluded from the order because its header was unreadable.
#[derive(Debug)]
pub struct SkippedPart {
    /// Path of the rejected file.
    pub path: PathBuf,
    /// Why the header could not be read.
    pub error: FrameError,
}

/// Outcome of inspecting one candidate file.
#[derive(Debug)]
pub enum Candidate {
    /// The header was read and the file can be placed.
    Keyed(OrderedPart),
    /// The header was unreadable; the file is left out.
    Skipped(SkippedPart),
}

impl Candidate {
    /// Inspect the header of the file at `path`.
    pub fn inspect(path: PathBuf) -> Self {
        match read_header_from_path(&path) {
            Ok(header) => Candidate::Keyed(OrderedPart {
                path,
                header: Some(header),
            }),
            Err(error) => Candidate::Skipped(SkippedPart { path, error }),
        }
    }
}

/// Ordered parts plus the candidates that could not be placed.
#[derive(Debug, Default)]
pub struct OrderedParts {
    /// Parts in sequence order.
    pub parts: Vec<OrderedPart>,
    /// Candidates excluded from `parts`.
    pub skipped: Vec<SkippedPart>,
}

impl OrderedParts {
    /// Paths in sequence order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.parts.iter().map(|p| p.path.clone()).collect()
    }
}

/// Order candidate files by the `part_id` in their frame headers.
pub fn order_by_embedded_id<I, P>(paths: I) -> OrderedParts
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut ordered = OrderedParts::default();

    for path in paths {
        match Candidate::inspect(path.into()) {
            Candidate::Keyed(part) => ordered.parts.push(part),
            Candidate::Skipped(skipped) => {
                warn!(
                    path = %skipped.path.display(),
                    error = %skipped.error,
                    "Skipping part with invalid header"
                );
                ordered.skipped.push(skipped);
            }
        }
    }

    ordered.parts.sort_by(|a, b| {
        let id_a = a.header.map(|h| h.part_id).unwrap_or(i32::MAX);
        let id_b = b.header.map(|h| h.part_id).unwrap_or(i32::MAX);
        id_a.cmp(&id_b).then_with(|| compare_paths(&a.path, &b.path))
    });

    debug!(
        parts = ordered.parts.len(),
        skipped = ordered.skipped.len(),
        "Ordered parts by embedded id"
    );

    ordered
}

/// Order files by the numeric hint in their names.
pub fn order_by_file_name<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut keyed: Vec<(u64, PathBuf)> = paths
        .into_iter()
        .map(Into::into)
        .map(|path: PathBuf| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (numeric_key(&name), path)
        })
        .collect();

    keyed.sort_by(|(key_a, path_a), (key_b, path_b)| {
        key_a.cmp(key_b).then_with(|| compare_paths(path_a, path_b))
    });

    keyed.into_iter().map(|(_, path)| path).collect()
}

/// Pattern for the last run of digits followed only by non-digits.
///
/// The regex engine returns the leftmost match, and a digit run can only be
/// followed by `\D*$` when no later digits exist, so group 1 is the last run.
fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\D*$").expect("part number pattern is valid"))
}

/// Sort key derived from a file name.
///
/// Names without digits, or whose digits overflow `u64`, get `u64::MAX` so
/// they sort after every numbered entry.
///
/// ```
/// use partfetch::parts::numeric_key;
///
/// assert_eq!(numeric_key("archive.rar0012.cpp"), 12);
/// assert_eq!(numeric_key("part9.bin"), 9);
/// assert_eq!(numeric_key("partABC.bin"), u64::MAX);
/// ```
pub fn numeric_key(file_name: &str) -> u64 {
    number_pattern()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(u64::MAX)
}

fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

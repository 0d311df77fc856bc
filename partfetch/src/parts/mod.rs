//! Splitting files into framed parts and putting them back together.
//!
//! - [`PartSplitter`] cuts a source file into fixed-size parts, each wrapped in
//!   a frame and named `{base}{NNNN}.{ext}`
//! - [`order`] puts a set of part files into sequence, by embedded id or by
//!   the number in the file name
//! - [`PartCombiner`] discovers, orders, unwraps and concatenates parts
//!
//! Splitting and combining are synchronous and single-threaded.

mod combiner;
mod error;
pub mod order;
mod splitter;

pub use combiner::{CombineSummary, PartCombiner};
pub use error::{PartsError, PartsResult};
pub use order::{
    numeric_key, order_by_embedded_id, order_by_file_name, OrderStrategy, OrderedPart,
    OrderedParts, SkippedPart,
};
pub use splitter::{PartSplitter, MAX_CHUNK_SIZE};

/// Extension used for part files unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = "cpp";

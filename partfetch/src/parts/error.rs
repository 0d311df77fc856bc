//! Error types for splitting and combining parts.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::frame::FrameError;

/// Result type for part operations.
pub type PartsResult<T> = Result<T, PartsError>;

/// Errors that can occur while splitting or combining parts.
#[derive(Debug, Error)]
pub enum PartsError {
    /// A caller-supplied parameter is invalid. Raised before any I/O.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A part file found during discovery is no longer present.
    #[error("missing part file: {}", path.display())]
    MissingPart { path: PathBuf },

    /// The ordered parts do not form a contiguous id sequence.
    #[error("missing part {part_id}: expected {expected} parts, found {found}")]
    MissingPartId {
        part_id: i64,
        expected: usize,
        found: usize,
    },

    /// A part's frame could not be decoded.
    #[error("invalid part {}: {source}", path.display())]
    Frame {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PartsError {
    /// Attribute a frame failure to the part at `path`.
    ///
    /// A part that no longer exists is reported as [`PartsError::MissingPart`].
    pub fn from_frame(path: PathBuf, error: FrameError) -> Self {
        match error {
            FrameError::Io(e) if e.kind() == io::ErrorKind::NotFound => {
                PartsError::MissingPart { path }
            }
            source => PartsError::Frame { path, source },
        }
    }
}

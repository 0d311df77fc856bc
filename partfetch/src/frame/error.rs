//! Error types for frame encoding and decoding.

use std::io;

use thiserror::Error;

/// Errors that can occur while reading or validating a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The leading magic sentinel does not match.
    #[error("invalid or missing header magic at start of frame")]
    BadMagicStart,

    /// The trailing magic sentinel does not match.
    #[error("invalid or missing header magic at end of header")]
    BadMagicEnd,

    /// Fewer bytes were available than the frame requires.
    #[error("frame truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    /// The header carries a negative payload length.
    #[error("invalid payload size in header: {0}")]
    InvalidSize(i64),

    /// The stored payload text is not valid for the payload encoding.
    #[error("failed to decode payload: {0}")]
    PayloadDecode(String),

    /// Strict verification found a payload whose digest differs from the header.
    #[error("payload hash mismatch: header has {expected}, payload hashes to {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Underlying I/O failure while reading the frame.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Returns true for sentinel mismatches.
    pub fn is_bad_magic(&self) -> bool {
        matches!(self, FrameError::BadMagicStart | FrameError::BadMagicEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_display() {
        let err = FrameError::Truncated {
            expected: 60,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "frame truncated: expected 60 bytes, found 12"
        );
    }

    #[test]
    fn test_is_bad_magic() {
        assert!(FrameError::BadMagicStart.is_bad_magic());
        assert!(FrameError::BadMagicEnd.is_bad_magic());
        assert!(!FrameError::InvalidSize(-1).is_bad_magic());
    }
}

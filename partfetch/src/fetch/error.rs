//! Error types for batch fetching.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching parts.
///
/// Any error from a single item aborts the whole batch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network fault while sending the request or reading the body.
    #[error("failed to download {url}: {reason}")]
    Transfer { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("GET {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// A URL cannot be used as a part source.
    #[error("invalid part URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Invalid batch parameters.
    #[error("invalid fetch configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Failed to write a downloaded file.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create the destination directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The batch was cancelled.
    #[error("download cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true if the batch ended because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

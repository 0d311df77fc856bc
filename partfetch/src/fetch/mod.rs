//! Concurrent download of part files.
//!
//! A [`FetchCoordinator`] takes a list of [`FetchRequest`]s and streams each
//! remote resource into a local file, keeping at most
//! [`FetchConfig::concurrency`] transfers in flight. Status and progress are
//! reported per item through a [`FetchObserver`]; a `tokio` unbounded sender
//! is an observer, so UIs can consume [`FetchEvent`]s from a channel and fold
//! them into a [`DownloadBoard`].
//!
//! The batch is all-or-nothing: the first failing item aborts it, and the
//! shared `CancellationToken` stops it early. No retries are attempted.
//!
//! # Example
//!
//! ```ignore
//! use partfetch::fetch::{FetchConfig, FetchCoordinator, FetchRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let coordinator = FetchCoordinator::with_http(FetchConfig::default().with_concurrency(8))?;
//! let requests = vec![FetchRequest::from_url("https://example.com/pkg.rar0001.cpp")?];
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! let paths = coordinator
//!     .fetch_all(&requests, Path::new("parts"), &CancellationToken::new(), &tx)
//!     .await?;
//! ```

mod config;
mod coordinator;
mod error;
mod item;
mod source;

pub use config::{
    FetchConfig, DEFAULT_BUFFER_SIZE, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT,
};
pub use coordinator::FetchCoordinator;
pub use error::{FetchError, FetchResult};
pub use item::{
    file_name_from_url, DownloadBoard, DownloadItem, DownloadStatus, FetchEvent, FetchEventKind,
    FetchObserver, FetchRequest,
};
pub use source::{HttpPartSource, OpenFuture, PartSource, PartStream};

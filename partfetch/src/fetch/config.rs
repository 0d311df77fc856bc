//! Configuration for batch fetching.

use std::time::Duration;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENCY: usize = 30;

/// Default read buffer per transfer (80 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 80 * 1024;

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a [`FetchCoordinator`](super::FetchCoordinator).
///
/// Passed explicitly; there is no process-wide client or parallelism setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum transfers in flight at once (at least 1).
    pub concurrency: usize,

    /// Size of each body read (at least 1 byte).
    pub buffer_size: usize,

    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,

    /// Overall per-request timeout, including the body. `None` leaves
    /// long transfers unbounded.
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
        }
    }
}

impl FetchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum concurrent transfers (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the read buffer size (minimum 1 byte).
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the overall per-request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

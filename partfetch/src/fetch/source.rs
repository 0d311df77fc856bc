//! Transport abstraction for fetching part bodies.
//!
//! The coordinator only needs "open this URL as a byte stream, and tell me its
//! length if you know it". Keeping that behind a trait lets tests drive the
//! coordinator with in-memory sources and artificial delays.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

use futures::TryStreamExt;
use reqwest::Client;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use super::config::FetchConfig;
use super::error::{FetchError, FetchResult};

/// Future returned by [`PartSource::open`].
pub type OpenFuture<'a> = Pin<Box<dyn Future<Output = FetchResult<PartStream>> + Send + 'a>>;

/// An opened response body.
pub struct PartStream {
    /// Body length from response metadata, when known.
    pub content_length: Option<u64>,
    /// The body.
    pub reader: Pin<Box<dyn AsyncRead + Send>>,
}

impl PartStream {
    /// Wrap a reader with an optional known length.
    pub fn new<R>(content_length: Option<u64>, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            content_length,
            reader: Box::pin(reader),
        }
    }
}

impl fmt::Debug for PartStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens remote resources as streams.
///
/// Uses a boxed future so the trait stays dyn-compatible.
pub trait PartSource: Send + Sync {
    /// Issue a streaming GET for `url`.
    ///
    /// A non-success response must be reported as [`FetchError::Status`]
    /// rather than returned as a body.
    fn open<'a>(&'a self, url: &'a str) -> OpenFuture<'a>;
}

/// HTTP(S) source backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPartSource {
    client: Client,
}

impl HttpPartSource {
    /// Create a source with default timeouts.
    pub fn new() -> FetchResult<Self> {
        Self::from_config(&FetchConfig::default())
    }

    /// Create a source using the timeouts in `config`.
    pub fn from_config(config: &FetchConfig) -> FetchResult<Self> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl PartSource for HttpPartSource {
    fn open<'a>(&'a self, url: &'a str) -> OpenFuture<'a> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    e.to_string()
                };
                FetchError::Transfer {
                    url: url.to_string(),
                    reason,
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let content_length = response.content_length();
            let body = response.bytes_stream().map_err(io::Error::other);

            Ok(PartStream::new(content_length, StreamReader::new(body)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;

    struct StaticSource(&'static [u8]);

    impl PartSource for StaticSource {
        fn open<'a>(&'a self, _url: &'a str) -> OpenFuture<'a> {
            Box::pin(async move {
                Ok(PartStream::new(
                    Some(self.0.len() as u64),
                    Cursor::new(self.0.to_vec()),
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_dyn_source() {
        let source: Box<dyn PartSource> = Box::new(StaticSource(b"abc"));
        let mut stream = source.open("mem://abc").await.unwrap();

        let mut body = Vec::new();
        stream.reader.read_to_end(&mut body).await.unwrap();

        assert_eq!(stream.content_length, Some(3));
        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_http_source_builds() {
        assert!(HttpPartSource::new().is_ok());
        let config = FetchConfig::new().with_timeout(Some(std::time::Duration::from_secs(10)));
        assert!(HttpPartSource::from_config(&config).is_ok());
    }
}

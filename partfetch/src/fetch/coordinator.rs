//! Bounded-concurrency batch download.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FetchConfig;
use super::error::{FetchError, FetchResult};
use super::item::{DownloadStatus, FetchObserver, FetchRequest};
use super::source::{HttpPartSource, PartSource};

/// Downloads a batch of parts with at most `concurrency` transfers in flight.
///
/// # Example
///
/// ```ignore
/// let coordinator = FetchCoordinator::with_http(FetchConfig::default())?;
/// let cancel = CancellationToken::new();
/// let paths = coordinator
///     .fetch_all(&manifest.requests()?, Path::new("parts"), &cancel, &())
///     .await?;
/// ```
pub struct FetchCoordinator {
    source: Arc<dyn PartSource>,
    config: FetchConfig,
}

impl FetchCoordinator {
    /// Create a coordinator over an arbitrary source.
    pub fn new(source: Arc<dyn PartSource>, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Create a coordinator that downloads over HTTP(S).
    pub fn with_http(config: FetchConfig) -> FetchResult<Self> {
        let source = HttpPartSource::from_config(&config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    /// The configuration in use.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every request into `dest_dir`.
    ///
    /// Returns the local paths of the fetched files in completion order. The
    /// first failing item aborts the batch: transfers still in flight are
    /// dropped and no further items start. Files already written, complete or
    /// partial, are left on disk.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidConfig`] for unusable or duplicate file names
    /// - [`FetchError::CreateDirFailed`] if `dest_dir` cannot be created
    /// - [`FetchError::Cancelled`] once `cancel` fires
    /// - the first item error otherwise
    pub async fn fetch_all(
        &self,
        requests: &[FetchRequest],
        dest_dir: &Path,
        cancel: &CancellationToken,
        observer: &dyn FetchObserver,
    ) -> FetchResult<Vec<PathBuf>> {
        let mut names = HashSet::with_capacity(requests.len());
        for request in requests {
            request.validate()?;
            if !names.insert(request.file_name.as_str()) {
                return Err(FetchError::InvalidConfig(format!(
                    "more than one part is named '{}'",
                    request.file_name
                )));
            }
        }

        if requests.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| FetchError::CreateDirFailed {
                path: dest_dir.to_path_buf(),
                source: e,
            })?;

        info!(
            items = requests.len(),
            concurrency = self.config.concurrency,
            dest = %dest_dir.display(),
            "Starting batch download"
        );

        for id in 0..requests.len() {
            observer.on_status(id, &DownloadStatus::Pending);
        }

        let started = Instant::now();
        let mut queue = requests.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = Vec::with_capacity(requests.len());

        loop {
            while in_flight.len() < self.config.concurrency && !cancel.is_cancelled() {
                match queue.next() {
                    Some((id, request)) => {
                        in_flight.push(self.fetch_one(id, request, dest_dir, cancel, observer))
                    }
                    None => break,
                }
            }

            match in_flight.next().await {
                Some(Ok(path)) => completed.push(path),
                Some(Err(e)) => {
                    if e.is_cancelled() {
                        info!(completed = completed.len(), "Batch download cancelled");
                    } else {
                        warn!(error = %e, "Aborting batch download");
                    }
                    return Err(e);
                }
                None => break,
            }
        }

        if completed.len() < requests.len() {
            info!(completed = completed.len(), "Batch download cancelled");
            return Err(FetchError::Cancelled);
        }

        info!(
            items = completed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch download complete"
        );

        Ok(completed)
    }

    async fn fetch_one(
        &self,
        id: usize,
        request: &FetchRequest,
        dest_dir: &Path,
        cancel: &CancellationToken,
        observer: &dyn FetchObserver,
    ) -> FetchResult<PathBuf> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let path = dest_dir.join(&request.file_name);
        observer.on_status(id, &DownloadStatus::Downloading);
        debug!(item = id, url = %request.url, "Downloading part");

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.transfer(id, request, &path, observer) => result,
        };

        match result {
            Ok(bytes) => {
                let elapsed = started.elapsed();
                debug!(
                    item = id,
                    bytes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Part downloaded"
                );
                observer.on_status(id, &DownloadStatus::Completed(elapsed));
                Ok(path)
            }
            Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
            Err(e) => {
                observer.on_status(id, &DownloadStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stream one body to disk, returning the number of bytes written.
    async fn transfer(
        &self,
        id: usize,
        request: &FetchRequest,
        path: &Path,
        observer: &dyn FetchObserver,
    ) -> FetchResult<u64> {
        let mut stream = self.source.open(&request.url).await?;

        let write_err = |e| FetchError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::create(path).await.map_err(write_err)?;
        let total = stream.content_length.filter(|&len| len > 0);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut written: u64 = 0;

        loop {
            let n = stream
                .reader
                .read(&mut buffer)
                .await
                .map_err(|e| FetchError::Transfer {
                    url: request.url.clone(),
                    reason: e.to_string(),
                })?;
            if n == 0 {
                break;
            }

            file.write_all(&buffer[..n]).await.map_err(write_err)?;
            written += n as u64;

            if let Some(total) = total {
                let percent = (written.saturating_mul(100) / total).min(100) as u8;
                observer.on_progress(id, percent);
            }
        }

        file.flush().await.map_err(write_err)?;
        Ok(written)
    }
}

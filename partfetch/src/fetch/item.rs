//! Requests, per-item state and progress events.

use std::path::{Component, Path};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use tokio::sync::mpsc;

use super::error::{FetchError, FetchResult};

/// One remote resource to fetch into a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL of the resource.
    pub url: String,
    /// Name of the local file, relative to the batch destination directory.
    pub file_name: String,
}

impl FetchRequest {
    /// Create a request with an explicit local file name.
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
        }
    }

    /// Create a request named after the final path segment of `url`.
    ///
    /// ```
    /// use partfetch::FetchRequest;
    ///
    /// let request = FetchRequest::from_url("https://example.com/data/pkg.rar0001.cpp").unwrap();
    /// assert_eq!(request.file_name, "pkg.rar0001.cpp");
    /// ```
    pub fn from_url(url: impl Into<String>) -> FetchResult<Self> {
        let url = url.into();
        let file_name = file_name_from_url(&url)?;
        Ok(Self { url, file_name })
    }

    /// Check that the file name is a single plain path component.
    pub(crate) fn validate(&self) -> FetchResult<()> {
        let mut components = Path::new(&self.file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(FetchError::InvalidConfig(format!(
                "file name '{}' for {} must be a plain file name",
                self.file_name, self.url
            ))),
        }
    }
}

/// Final, percent-decoded path segment of `url`.
pub fn file_name_from_url(url: &str) -> FetchResult<String> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no file name".to_string(),
        })?;

    Ok(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

/// Lifecycle of one item within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Queued, not yet started.
    Pending,
    /// Transfer in progress.
    Downloading,
    /// Finished; carries the wall-clock duration of the transfer.
    Completed(Duration),
    /// The transfer failed; the batch is aborted.
    Failed(String),
}

impl DownloadStatus {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "Pending",
            DownloadStatus::Downloading => "Downloading",
            DownloadStatus::Completed(_) => "Completed",
            DownloadStatus::Failed(_) => "Failed",
        }
    }

    /// Returns true once the item can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed(_) | DownloadStatus::Failed(_)
        )
    }
}

/// What changed for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEventKind {
    /// The item moved to a new status.
    Status(DownloadStatus),
    /// Percentage of the item's bytes written so far (0-100).
    Progress(u8),
}

/// A change reported by the coordinator for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchEvent {
    /// Index of the item in the batch request list.
    pub item_id: usize,
    /// The change.
    pub kind: FetchEventKind,
}

/// Receives per-item status and progress from a running batch.
///
/// Callbacks run on the coordinator's task. Implementations that must reach
/// another execution context (a UI thread, say) should forward the values
/// rather than block here.
pub trait FetchObserver: Send + Sync {
    /// The item moved to `status`.
    fn on_status(&self, item_id: usize, status: &DownloadStatus);

    /// The item has written `percent` of its known size.
    fn on_progress(&self, item_id: usize, percent: u8);
}

/// Ignores all events.
impl FetchObserver for () {
    fn on_status(&self, _item_id: usize, _status: &DownloadStatus) {}

    fn on_progress(&self, _item_id: usize, _percent: u8) {}
}

/// Forwards events to a channel. Events are dropped once the receiver is gone.
impl FetchObserver for mpsc::UnboundedSender<FetchEvent> {
    fn on_status(&self, item_id: usize, status: &DownloadStatus) {
        let _ = self.send(FetchEvent {
            item_id,
            kind: FetchEventKind::Status(status.clone()),
        });
    }

    fn on_progress(&self, item_id: usize, percent: u8) {
        let _ = self.send(FetchEvent {
            item_id,
            kind: FetchEventKind::Progress(percent),
        });
    }
}

/// Snapshot of one item's state.
///
/// Snapshots are immutable; [`apply`](Self::apply) returns the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Index of the item in the batch.
    pub id: usize,
    /// Source URL.
    pub url: String,
    /// Local file name.
    pub file_name: String,
    /// Current status.
    pub status: DownloadStatus,
    /// Last reported progress percentage.
    pub progress: u8,
}

impl DownloadItem {
    /// Initial snapshot for a request.
    pub fn pending(id: usize, request: &FetchRequest) -> Self {
        Self {
            id,
            url: request.url.clone(),
            file_name: request.file_name.clone(),
            status: DownloadStatus::Pending,
            progress: 0,
        }
    }

    /// Snapshot after `event`. Events for other items are ignored.
    pub fn apply(&self, event: &FetchEvent) -> Self {
        let mut next = self.clone();
        if event.item_id != self.id {
            return next;
        }
        match &event.kind {
            FetchEventKind::Status(status) => {
                if matches!(status, DownloadStatus::Completed(_)) {
                    next.progress = 100;
                }
                next.status = status.clone();
            }
            FetchEventKind::Progress(percent) => next.progress = (*percent).min(100),
        }
        next
    }
}

/// Aggregate view of a batch, built by folding events.
#[derive(Debug, Clone, Default)]
pub struct DownloadBoard {
    items: Vec<DownloadItem>,
}

impl DownloadBoard {
    /// Board with every request pending.
    pub fn new(requests: &[FetchRequest]) -> Self {
        Self {
            items: requests
                .iter()
                .enumerate()
                .map(|(id, request)| DownloadItem::pending(id, request))
                .collect(),
        }
    }

    /// Fold an event into the board, returning the updated item.
    pub fn apply(&mut self, event: &FetchEvent) -> Option<&DownloadItem> {
        let item = self.items.get_mut(event.item_id)?;
        *item = item.apply(event);
        Some(item)
    }

    /// Current snapshots in request order.
    pub fn items(&self) -> &[DownloadItem] {
        &self.items
    }

    /// Number of completed items.
    pub fn completed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, DownloadStatus::Completed(_)))
            .count()
    }

    /// Mean progress over all items (0-100).
    pub fn overall_progress(&self) -> u8 {
        if self.items.is_empty() {
            return 100;
        }
        let sum: u64 = self.items.iter().map(|i| i.progress as u64).sum();
        (sum / self.items.len() as u64) as u8
    }
}

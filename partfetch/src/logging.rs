//! Tracing subscriber setup.
//!
//! Logs go to stderr with local timestamps and, optionally, to a file through
//! a non-blocking writer. `RUST_LOG` overrides the configured level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, time::FormatTime, time::OffsetTime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Errors from logging initialisation.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Logging options, usually assembled from CLI flags and the config file.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Log at debug level regardless of `level`.
    pub verbose: bool,
    /// Filter directive used when `RUST_LOG` is unset; defaults to `info`.
    pub level: Option<String>,
    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
}

impl LoggingOptions {
    /// Filter directive applied when `RUST_LOG` is not set.
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            self.level.as_deref().unwrap_or("info")
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the life of the program.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(options.directive()).map_err(|e| LoggingError::Filter {
            directive: options.directive().to_string(),
            reason: e.to_string(),
        })
    })?;

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(local_timer());

    let (file_layer, guard) = match &options.log_file {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(local_timer());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

fn local_timer() -> impl FormatTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"),
    )
}

fn open_log_file(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let log_err = |e| LoggingError::LogFile {
        path: path.to_path_buf(),
        source: e,
    };

    let file_name = path.file_name().ok_or_else(|| {
        log_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "log file path has no file name",
        ))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(log_err)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

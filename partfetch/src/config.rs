//! INI configuration file.
//!
//! Settings live in `~/.partfetch/config.ini`:
//!
//! ```ini
//! [fetch]
//! concurrency = 30
//! buffer_size = 81920
//! connect_timeout_secs = 30
//! ; 0 disables the overall per-request timeout
//! timeout_secs = 0
//!
//! [parts]
//! extension = cpp
//! encoding = raw
//! chunk_size = 104857600
//!
//! [logging]
//! level = info
//! ; file = /var/log/partfetch.log
//! ```
//!
//! A missing file yields the defaults. Missing keys keep their defaults;
//! values that are present but unparsable are an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::fetch::{FetchConfig, DEFAULT_BUFFER_SIZE, DEFAULT_CONCURRENCY};
use crate::frame::PayloadEncoding;
use crate::parts::DEFAULT_EXTENSION;

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = ".partfetch";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default chunk size for splitting (100 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors from reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub concurrency: usize,
    pub buffer_size: usize,
    pub connect_timeout_secs: u64,
    /// Zero means no overall timeout.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: 0,
        }
    }
}

/// `[parts]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsSettings {
    pub extension: String,
    pub encoding: PayloadEncoding,
    pub chunk_size: u64,
}

impl Default for PartsSettings {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            encoding: PayloadEncoding::Raw,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub fetch: FetchSettings,
    pub parts: PartsSettings,
    pub logging: LoggingSettings,
}

/// The per-user configuration directory (`~/.partfetch`).
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

/// The per-user configuration file (`~/.partfetch/config.ini`).
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

impl ConfigFile {
    /// Load the per-user configuration, falling back to defaults when the
    /// file or the home directory does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config = Self::from_ini(&ini)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Write every setting to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Settings for a fetch coordinator.
    pub fn fetch_config(&self) -> FetchConfig {
        let timeout = match self.fetch.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        FetchConfig::new()
            .with_concurrency(self.fetch.concurrency)
            .with_buffer_size(self.fetch.buffer_size)
            .with_connect_timeout(Duration::from_secs(self.fetch.connect_timeout_secs))
            .with_timeout(timeout)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("fetch")) {
            let fetch = &mut config.fetch;
            parse_into(section.get("concurrency"), "fetch", "concurrency", &mut fetch.concurrency)?;
            parse_into(section.get("buffer_size"), "fetch", "buffer_size", &mut fetch.buffer_size)?;
            parse_into(
                section.get("connect_timeout_secs"),
                "fetch",
                "connect_timeout_secs",
                &mut fetch.connect_timeout_secs,
            )?;
            parse_into(section.get("timeout_secs"), "fetch", "timeout_secs", &mut fetch.timeout_secs)?;

            if fetch.concurrency == 0 {
                return Err(invalid("fetch", "concurrency", "0", "must be at least 1"));
            }
            if fetch.buffer_size == 0 {
                return Err(invalid("fetch", "buffer_size", "0", "must be at least 1"));
            }
        }

        if let Some(section) = ini.section(Some("parts")) {
            let parts = &mut config.parts;
            if let Some(extension) = section.get("extension") {
                parts.extension = extension.trim().trim_start_matches('.').to_string();
            }
            parse_into(section.get("encoding"), "parts", "encoding", &mut parts.encoding)?;
            parse_into(section.get("chunk_size"), "parts", "chunk_size", &mut parts.chunk_size)?;

            if parts.chunk_size == 0 {
                return Err(invalid("parts", "chunk_size", "0", "must be positive"));
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = section.get("level") {
                config.logging.level = level.trim().to_string();
            }
            config.logging.file = section
                .get("file")
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(PathBuf::from);
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("fetch"))
            .set("concurrency", self.fetch.concurrency.to_string())
            .set("buffer_size", self.fetch.buffer_size.to_string())
            .set("connect_timeout_secs", self.fetch.connect_timeout_secs.to_string())
            .set("timeout_secs", self.fetch.timeout_secs.to_string());

        ini.with_section(Some("parts"))
            .set("extension", self.parts.extension.as_str())
            .set("encoding", self.parts.encoding.as_str())
            .set("chunk_size", self.parts.chunk_size.to_string());

        let mut logging = ini.with_section(Some("logging"));
        logging.set("level", self.logging.level.as_str());
        if let Some(file) = &self.logging.file {
            logging.set("file", file.to_string_lossy().into_owned());
        }

        ini
    }
}

fn parse_into<T>(
    raw: Option<&str>,
    section: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = raw {
        *target = raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(section, key, raw, &e.to_string()))?;
    }
    Ok(())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

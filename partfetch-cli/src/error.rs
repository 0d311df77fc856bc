//! CLI error type.

use std::fmt;

use partfetch::checksum::ChecksumError;
use partfetch::config::ConfigError;
use partfetch::logging::LoggingError;
use partfetch::manifest::ManifestError;
use partfetch::{FetchError, FrameError, PartsError};

/// Errors surfaced to the user by `partfetch` commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad arguments or unusable settings.
    Config(String),
    ConfigFile(ConfigError),
    Logging(LoggingError),
    Frame(FrameError),
    Parts(PartsError),
    Fetch(FetchError),
    Manifest(ManifestError),
    Checksum(ChecksumError),
    /// Failure setting up the async runtime or signal handling.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Frame(e) => write!(f, "{}", e),
            CliError::Parts(e) => write!(f, "{}", e),
            CliError::Fetch(e) => write!(f, "{}", e),
            CliError::Manifest(e) => write!(f, "{}", e),
            CliError::Checksum(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<FrameError> for CliError {
    fn from(e: FrameError) -> Self {
        CliError::Frame(e)
    }
}

impl From<PartsError> for CliError {
    fn from(e: PartsError) -> Self {
        CliError::Parts(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}

impl From<ChecksumError> for CliError {
    fn from(e: ChecksumError) -> Self {
        CliError::Checksum(e)
    }
}

//! Remote descriptor of a split file.
//!
//! A manifest is a small JSON document naming the artifact, its expected
//! whole-file hash and the ordered list of part URLs:
//!
//! ```json
//! {
//!   "id": "42",
//!   "name": "archive.rar",
//!   "size": 10485760,
//!   "hash": "9f86d0...",
//!   "algorithm": "SHA-256",
//!   "encrypted": false,
//!   "password": null,
//!   "numparts": 4,
//!   "listparts": ["https://host/archive.rar0001.cpp", "..."]
//! }
//! ```
//!
//! Only `listparts` is required. `id`, `size` and `numparts` are accepted as
//! either JSON numbers or strings, since publishers disagree on the type.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fetch::{FetchRequest, FetchResult};

/// Errors from loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not a valid manifest.
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// The manifest could not be downloaded.
    #[error("failed to fetch manifest from {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// Descriptor listing the parts of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Size of the reassembled artifact in bytes.
    #[serde(default, deserialize_with = "number_or_string")]
    pub size: u64,

    /// Expected hash of the reassembled artifact.
    #[serde(default)]
    pub hash: Option<String>,

    /// Name of the hash algorithm, e.g. `SHA-256`.
    #[serde(default)]
    pub algorithm: Option<String>,

    /// Payload encryption flag. Carried through but not acted on.
    #[serde(default)]
    pub encrypted: bool,

    #[serde(default)]
    pub password: Option<String>,

    /// Number of parts the publisher produced.
    #[serde(default, deserialize_with = "number_or_string")]
    pub numparts: u64,

    /// Part URLs in sequence order.
    pub listparts: Vec<String>,
}

impl Manifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(text)?;
        if manifest.encrypted {
            warn!(
                name = %manifest.name,
                "Manifest marks parts as encrypted; payloads are not decrypted"
            );
        }
        Ok(manifest)
    }

    /// Read a manifest from a local file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    /// Download and parse a manifest.
    pub async fn fetch(url: &str) -> Result<Self, ManifestError> {
        let fetch_err = |e: reqwest::Error| ManifestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        debug!(url, "Fetching manifest");
        let text = reqwest::get(url)
            .await
            .map_err(fetch_err)?
            .error_for_status()
            .map_err(fetch_err)?
            .text()
            .await
            .map_err(fetch_err)?;

        Self::from_json(&text)
    }

    /// One request per listed part, named after the URL's final segment.
    pub fn requests(&self) -> FetchResult<Vec<FetchRequest>> {
        self.listparts
            .iter()
            .map(|url| FetchRequest::from_url(url.as_str()))
            .collect()
    }

    /// The expected SHA-256 of the artifact, when the manifest publishes one.
    pub fn sha256(&self) -> Option<&str> {
        let algorithm = self.algorithm.as_deref()?.trim().to_ascii_lowercase();
        if algorithm != "sha256" && algorithm != "sha-256" {
            return None;
        }
        self.hash
            .as_deref()
            .map(str::trim)
            .filter(|hash| !hash.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrString;

    impl Visitor<'_> for NumberOrString {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative value {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("'{}' is not a number", v)))
        }

        fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(NumberOrString)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "id": 42,
        "name": "archive.rar",
        "size": "10485760",
        "hash": "ABCDEF",
        "algorithm": "SHA-256",
        "encrypted": false,
        "password": null,
        "numparts": 3,
        "listparts": [
            "https://host/a/archive.rar0001.cpp",
            "https://host/b/archive.rar0002.cpp",
            "https://host/c/archive.rar0003.cpp"
        ]
    }"#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.id, "42");
        assert_eq!(manifest.size, 10_485_760);
        assert_eq!(manifest.numparts, 3);
        assert_eq!(manifest.listparts.len(), 3);
        assert_eq!(manifest.sha256(), Some("ABCDEF"));
    }

    #[test]
    fn test_minimal_manifest() {
        let manifest = Manifest::from_json(r#"{"listparts": []}"#).unwrap();
        assert_eq!(manifest.numparts, 0);
        assert_eq!(manifest.sha256(), None);
    }

    #[test]
    fn test_listparts_required() {
        assert!(matches!(
            Manifest::from_json(r#"{"name": "x"}"#),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_requests_named_by_final_segment() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let names: Vec<String> = manifest
            .requests()
            .unwrap()
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "archive.rar0001.cpp",
                "archive.rar0002.cpp",
                "archive.rar0003.cpp"
            ]
        );
    }

    #[test]
    fn test_requests_reject_bad_url() {
        let manifest =
            Manifest::from_json(r#"{"listparts": ["https://host/ok0001.cpp", "https://host/"]}"#)
                .unwrap();
        assert!(matches!(
            manifest.requests(),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_sha256_only_for_sha256_algorithm() {
        let manifest =
            Manifest::from_json(r#"{"hash": "abc", "algorithm": "md5", "listparts": []}"#)
                .unwrap();
        assert_eq!(manifest.sha256(), None);

        let manifest =
            Manifest::from_json(r#"{"hash": "abc", "algorithm": "sha256", "listparts": []}"#)
                .unwrap();
        assert_eq!(manifest.sha256(), Some("abc"));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        fs::write(&path, SAMPLE).unwrap();

        assert_eq!(Manifest::load(&path).unwrap().name, "archive.rar");
        assert!(matches!(
            Manifest::load(&temp.path().join("missing.json")),
            Err(ManifestError::Read { .. })
        ));
    }
}

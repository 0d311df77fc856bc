//! SHA-256 checksums of whole files.
//!
//! Used to verify a recombined artifact against the hash published in its
//! manifest.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Errors from checksum calculation and verification.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file's digest differs from the expected one.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    Mismatch {
        filename: String,
        expected: String,
        actual: String,
    },
}

/// Calculate the SHA-256 checksum of a file.
///
/// # Returns
///
/// The lowercase hexadecimal SHA-256 hash of the file contents.
pub fn calculate_file_checksum(path: &Path) -> Result<String, ChecksumError> {
    let read_err = |e| ChecksumError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(read_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify that a file matches an expected SHA-256 checksum.
///
/// The comparison ignores case and surrounding whitespace, since published
/// hashes are often upper-case hex.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), ChecksumError> {
    let actual = calculate_file_checksum(path)?;
    let expected = expected.trim().to_lowercase();
    if actual != expected {
        return Err(ChecksumError::Mismatch {
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn write_file(temp: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = temp.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(data).unwrap();
        path
    }

    #[test]
    fn test_calculate_file_checksum() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "test.txt", b"hello world");

        assert_eq!(calculate_file_checksum(&path).unwrap(), HELLO_WORLD);
    }

    #[test]
    fn test_calculate_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "empty.txt", b"");

        assert_eq!(
            calculate_file_checksum(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_calculate_nonexistent_file() {
        let result = calculate_file_checksum(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(ChecksumError::ReadFailed { .. })));
    }

    #[test]
    fn test_verify_checksum_ignores_case() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "test.txt", b"hello world");

        assert!(verify_checksum(&path, &HELLO_WORLD.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_checksum_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "test.txt", b"hello world");

        match verify_checksum(&path, "wrong_checksum") {
            Err(ChecksumError::Mismatch { filename, .. }) => assert_eq!(filename, "test.txt"),
            other => panic!("Expected Mismatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_large_file_checksum() {
        let temp = TempDir::new().unwrap();
        // Larger than the read buffer
        let path = write_file(&temp, "large.bin", &vec![0xABu8; 100_000]);

        let first = calculate_file_checksum(&path).unwrap();
        let second = calculate_file_checksum(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}

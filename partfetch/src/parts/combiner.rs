//! Reassembling framed parts into the original file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{PartsError, PartsResult};
use super::order::{OrderStrategy, OrderedPart, OrderedParts};
use super::DEFAULT_EXTENSION;
use crate::frame::{strip, PayloadEncoding, Verification};

/// Outcome of a successful combine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    /// Number of parts appended.
    pub parts: usize,
    /// Total payload bytes written to the destination.
    pub bytes: u64,
}

/// Locates, orders, unwraps and concatenates parts.
///
/// Unlike ordering on its own, combining is strict: a part with an unreadable
/// frame aborts the whole operation.
#[derive(Debug, Clone)]
pub struct PartCombiner {
    extension: String,
    encoding: PayloadEncoding,
    verification: Verification,
    strategy: OrderStrategy,
    expected_parts: Option<usize>,
}

impl Default for PartCombiner {
    fn default() -> Self {
        Self::new()
    }
}

impl PartCombiner {
    /// Create a combiner for raw `.cpp` parts ordered by embedded id.
    pub fn new() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            encoding: PayloadEncoding::Raw,
            verification: Verification::Lenient,
            strategy: OrderStrategy::EmbeddedId,
            expected_parts: None,
        }
    }

    /// Set the extension used to discover part files. Leading dots are ignored.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Set how payloads are stored in the parts.
    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable or disable digest checks on every payload.
    pub fn with_verification(mut self, verification: Verification) -> Self {
        self.verification = verification;
        self
    }

    /// Set the ordering strategy.
    pub fn with_strategy(mut self, strategy: OrderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Require exactly `count` parts with contiguous embedded ids.
    pub fn with_expected_parts(mut self, count: usize) -> Self {
        self.expected_parts = Some(count);
        self
    }

    /// Part files in `parts_dir` matching the configured extension.
    ///
    /// Not recursive. Order is unspecified.
    pub fn discover(&self, parts_dir: &Path) -> PartsResult<Vec<PathBuf>> {
        let read_err = |e| PartsError::ReadFailed {
            path: parts_dir.to_path_buf(),
            source: e,
        };

        let mut found = Vec::new();
        for entry in fs::read_dir(parts_dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && self.matches_extension(&path) {
                found.push(path);
            }
        }
        Ok(found)
    }

    /// Discover and order the parts in `parts_dir` without reading payloads.
    pub fn order(&self, parts_dir: &Path) -> PartsResult<OrderedParts> {
        let candidates = self.discover(parts_dir)?;
        Ok(self.strategy.order(candidates))
    }

    /// Combine the parts in `parts_dir` into `destination`.
    ///
    /// The destination is created (or truncated) once and written strictly in
    /// part order.
    ///
    /// # Errors
    ///
    /// - `Frame` if any candidate has a corrupt frame
    /// - `MissingPart` if a part disappears between discovery and read
    /// - `MissingPartId` if an expected part count was set and ids have gaps
    pub fn combine(&self, parts_dir: &Path, destination: &Path) -> PartsResult<CombineSummary> {
        let ordered = self.order(parts_dir)?;
        if ordered.parts.is_empty() && ordered.skipped.is_empty() {
            warn!(dir = %parts_dir.display(), extension = %self.extension, "No parts found");
        }
        self.combine_ordered(ordered, destination)
    }

    /// Combine parts that were already ordered, e.g. by [`order`](Self::order).
    ///
    /// Fails on the same conditions as [`combine`](Self::combine).
    pub fn combine_ordered(
        &self,
        ordered: OrderedParts,
        destination: &Path,
    ) -> PartsResult<CombineSummary> {
        if let Some(skipped) = ordered.skipped.into_iter().next() {
            return Err(PartsError::from_frame(skipped.path, skipped.error));
        }

        if let Some(expected) = self.expected_parts {
            check_contiguous(&ordered.parts, expected)?;
        }

        let write_err = |e| PartsError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        };

        let output = File::create(destination).map_err(write_err)?;
        let mut writer = BufWriter::new(output);
        let mut summary = CombineSummary { parts: 0, bytes: 0 };

        for part in &ordered.parts {
            let (header, payload) = strip(&part.path, self.encoding, self.verification)
                .map_err(|e| PartsError::from_frame(part.path.clone(), e))?;

            writer.write_all(&payload).map_err(write_err)?;

            debug!(
                part_id = header.part_id,
                bytes = payload.len(),
                path = %part.path.display(),
                "Appended part"
            );

            summary.parts += 1;
            summary.bytes += payload.len() as u64;
        }

        writer.flush().map_err(write_err)?;

        info!(
            destination = %destination.display(),
            parts = summary.parts,
            bytes = summary.bytes,
            "Recombined parts"
        );

        Ok(summary)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// Check that parts carry consecutive ids, `expected` of them.
///
/// Only parts with a known header are checked; file-name ordering reads no
/// headers, so only the count applies there.
fn check_contiguous(parts: &[OrderedPart], expected: usize) -> PartsResult<()> {
    let ids: Vec<i64> = parts
        .iter()
        .filter_map(|p| p.header.map(|h| h.part_id as i64))
        .collect();

    if let Some(&first) = ids.first() {
        for (offset, &id) in ids.iter().enumerate() {
            let want = first + offset as i64;
            if id != want {
                return Err(PartsError::MissingPartId {
                    part_id: want,
                    expected,
                    found: parts.len(),
                });
            }
        }
    }

    if parts.len() != expected {
        let next = ids.first().map(|f| f + parts.len() as i64).unwrap_or(1);
        return Err(PartsError::MissingPartId {
            part_id: next,
            expected,
            found: parts.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode, encode_with, FrameError};
    use crate::parts::PartSplitter;
    use tempfile::TempDir;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_combine_orders_by_embedded_id() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.cpp"), encode(b"world", 2)).unwrap();
        fs::write(temp.path().join("a.cpp"), encode(b"hello ", 1)).unwrap();
        fs::write(temp.path().join("ignored.txt"), b"not a part").unwrap();

        let dest = temp.path().join("out.bin");
        let summary = PartCombiner::new().combine(temp.path(), &dest).unwrap();

        assert_eq!(summary, CombineSummary { parts: 2, bytes: 11 });
        assert_eq!(fs::read(&dest).unwrap(), b"hello world");
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a0001.CPP"), encode(b"x", 1)).unwrap();

        let found = PartCombiner::new().discover(temp.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_corrupt_part_aborts_combine() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a0001.cpp"), encode(b"ok", 1)).unwrap();
        let mut bad = encode(b"bad", 2);
        bad[0] = 0;
        fs::write(temp.path().join("a0002.cpp"), bad).unwrap();

        let dest = temp.path().join("out.bin");
        let result = PartCombiner::new().combine(temp.path(), &dest);

        match result {
            Err(PartsError::Frame { path, source }) => {
                assert!(path.ends_with("a0002.cpp"));
                assert!(matches!(source, FrameError::BadMagicStart));
            }
            other => panic!("expected Frame error, got {:?}", other),
        }
    }

    #[test]
    fn test_base64_roundtrip() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("doc.txt");
        let data = sample(1000);
        fs::write(&source, &data).unwrap();
        let parts_dir = temp.path().join("parts");

        PartSplitter::new(64)
            .with_encoding(PayloadEncoding::Base64)
            .split(&source, &parts_dir)
            .unwrap();

        let dest = temp.path().join("restored.txt");
        PartCombiner::new()
            .with_encoding(PayloadEncoding::Base64)
            .with_verification(Verification::Strict)
            .combine(&parts_dir, &dest)
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_malformed_base64_rejected() {
        let temp = TempDir::new().unwrap();
        let mut frame = encode_with(b"abcdef", 1, PayloadEncoding::Base64);
        let last = frame.len() - 2;
        frame[last] = b'*';
        fs::write(temp.path().join("p0001.cpp"), frame).unwrap();

        let result = PartCombiner::new()
            .with_encoding(PayloadEncoding::Base64)
            .combine(temp.path(), &temp.path().join("out.bin"));

        assert!(matches!(
            result,
            Err(PartsError::Frame {
                source: FrameError::PayloadDecode(_),
                ..
            })
        ));
    }

    #[test]
    fn test_strict_verification_catches_tampering() {
        let temp = TempDir::new().unwrap();
        let mut frame = encode(b"trusted", 1);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        fs::write(temp.path().join("p0001.cpp"), frame).unwrap();
        let dest = temp.path().join("out.bin");

        assert!(PartCombiner::new().combine(temp.path(), &dest).is_ok());

        let strict = PartCombiner::new()
            .with_verification(Verification::Strict)
            .combine(temp.path(), &dest);
        assert!(matches!(
            strict,
            Err(PartsError::Frame {
                source: FrameError::HashMismatch { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_expected_parts_gap() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("p0001.cpp"), encode(b"a", 1)).unwrap();
        fs::write(temp.path().join("p0003.cpp"), encode(b"c", 3)).unwrap();
        let dest = temp.path().join("out.bin");

        let result = PartCombiner::new()
            .with_expected_parts(3)
            .combine(temp.path(), &dest);

        assert!(matches!(
            result,
            Err(PartsError::MissingPartId { part_id: 2, .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_expected_parts_short_tail() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("p0001.cpp"), encode(b"a", 1)).unwrap();
        fs::write(temp.path().join("p0002.cpp"), encode(b"b", 2)).unwrap();

        let result = PartCombiner::new()
            .with_expected_parts(3)
            .combine(temp.path(), &temp.path().join("out.bin"));

        assert!(matches!(
            result,
            Err(PartsError::MissingPartId {
                part_id: 3,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_file_name_strategy() {
        let temp = TempDir::new().unwrap();
        // Embedded ids disagree with names; the name wins under this strategy
        fs::write(temp.path().join("p10.cpp"), encode(b"second", 1)).unwrap();
        fs::write(temp.path().join("p9.cpp"), encode(b"first ", 2)).unwrap();
        let dest = temp.path().join("out.bin");

        PartCombiner::new()
            .with_strategy(OrderStrategy::FileName)
            .combine(temp.path(), &dest)
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"first second");
    }

    #[test]
    fn test_part_removed_after_ordering() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("p0001.cpp"), encode(b"a", 1)).unwrap();
        fs::write(temp.path().join("p0002.cpp"), encode(b"b", 2)).unwrap();

        let combiner = PartCombiner::new();
        let ordered = combiner.order(temp.path()).unwrap();
        fs::remove_file(temp.path().join("p0002.cpp")).unwrap();

        let result = combiner.combine_ordered(ordered, &temp.path().join("out.bin"));
        match result {
            Err(PartsError::MissingPart { path }) => assert!(path.ends_with("p0002.cpp")),
            other => panic!("expected MissingPart, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dir_produces_empty_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");

        let summary = PartCombiner::new().combine(temp.path(), &dest).unwrap();

        assert_eq!(summary.parts, 0);
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_missing_dir() {
        let result = PartCombiner::new().combine(
            Path::new("/nonexistent/parts"),
            Path::new("/nonexistent/out.bin"),
        );
        assert!(matches!(result, Err(PartsError::ReadFailed { .. })));
    }
}

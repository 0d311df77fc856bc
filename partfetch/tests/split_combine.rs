//! Integration tests for splitting files into framed parts and combining
//! them back.
//!
//! Run with: `cargo test --test split_combine`

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use partfetch::checksum::calculate_file_checksum;
use partfetch::frame::{read_header_from_path, HEADER_LEN};
use partfetch::parts::CombineSummary;
use partfetch::{
    FrameError, OrderStrategy, PartCombiner, PartSplitter, PartsError, PayloadEncoding,
    Verification,
};

// ============================================================================
// Helper Functions
// ============================================================================

const MIB: u64 = 1024 * 1024;

/// Deterministic, non-repeating test data.
fn sample_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

fn round_trip(data: &[u8], chunk_size: u64, encoding: PayloadEncoding) -> (Vec<u8>, usize) {
    let temp = TempDir::new().unwrap();
    let source = write_source(temp.path(), "payload.bin", data);
    let parts_dir = temp.path().join("parts");
    let output = temp.path().join("restored.bin");

    let parts = PartSplitter::new(chunk_size)
        .with_encoding(encoding)
        .split(&source, &parts_dir)
        .unwrap();

    let summary: CombineSummary = PartCombiner::new()
        .with_encoding(encoding)
        .with_verification(Verification::Strict)
        .combine(&parts_dir, &output)
        .unwrap();

    assert_eq!(summary.parts, parts.len());
    assert_eq!(summary.bytes, data.len() as u64);
    (fs::read(&output).unwrap(), parts.len())
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_split_combine_is_identity_for_edge_chunk_sizes() {
    let data = sample_bytes(1000);
    let len = data.len() as u64;

    for (chunk_size, expected_parts) in [(1, 1000), (len, 1), (len + 1, 1), (u64::MAX, 1)] {
        let (restored, parts) = round_trip(&data, chunk_size, PayloadEncoding::Raw);
        assert_eq!(restored, data, "chunk size {}", chunk_size);
        assert_eq!(parts, expected_parts, "chunk size {}", chunk_size);
    }
}

#[test]
fn test_base64_round_trip() {
    let data = sample_bytes(10_001);
    let (restored, parts) = round_trip(&data, 4096, PayloadEncoding::Base64);
    assert_eq!(restored, data);
    assert_eq!(parts, 3);
}

#[test]
fn test_empty_source_produces_no_parts_and_empty_output() {
    let (restored, parts) = round_trip(&[], 1024, PayloadEncoding::Raw);
    assert!(restored.is_empty());
    assert_eq!(parts, 0);
}

// ============================================================================
// Reference scenario: 10 MiB file in 3 MiB parts
// ============================================================================

#[test]
fn test_ten_mib_in_three_mib_parts() {
    let temp = TempDir::new().unwrap();
    let data = sample_bytes((10 * MIB) as usize);
    let source = write_source(temp.path(), "archive.rar", &data);
    let parts_dir = temp.path().join("parts");
    let output = temp.path().join("archive.restored.rar");

    let parts = PartSplitter::new(3 * MIB)
        .split(&source, &parts_dir)
        .unwrap();

    assert_eq!(parts.len(), 4);
    let expected_sizes = [3 * MIB, 3 * MIB, 3 * MIB, MIB];
    for (index, (part, expected_size)) in parts.iter().zip(expected_sizes).enumerate() {
        let header = read_header_from_path(part).unwrap();
        assert_eq!(header.part_id, index as i32 + 1);
        assert_eq!(header.payload_len(), expected_size);
        assert_eq!(
            fs::metadata(part).unwrap().len(),
            HEADER_LEN as u64 + expected_size
        );
        assert_eq!(
            part.file_name().unwrap().to_string_lossy(),
            format!("archive{:04}.cpp", index + 1)
        );
    }

    PartCombiner::new()
        .with_expected_parts(4)
        .combine(&parts_dir, &output)
        .unwrap();

    assert_eq!(
        calculate_file_checksum(&output).unwrap(),
        calculate_file_checksum(&source).unwrap()
    );
}

// ============================================================================
// Ordering and integrity
// ============================================================================

#[test]
fn test_combine_orders_by_embedded_id_not_name() {
    let temp = TempDir::new().unwrap();
    let data = sample_bytes(30);
    let source = write_source(temp.path(), "data.bin", &data);
    let parts_dir = temp.path().join("parts");

    let parts = PartSplitter::new(10).split(&source, &parts_dir).unwrap();

    // Shuffle names so that file-name order disagrees with the embedded ids
    fs::rename(&parts[0], parts_dir.join("zz0009.cpp")).unwrap();
    fs::rename(&parts[2], parts_dir.join("aa0001.cpp")).unwrap();

    let output = temp.path().join("out.bin");
    PartCombiner::new().combine(&parts_dir, &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), data);

    let by_name = temp.path().join("by_name.bin");
    PartCombiner::new()
        .with_strategy(OrderStrategy::FileName)
        .combine(&parts_dir, &by_name)
        .unwrap();
    assert_ne!(fs::read(&by_name).unwrap(), data);
}

#[test]
fn test_strict_combine_detects_tampered_payload() {
    let temp = TempDir::new().unwrap();
    let source = write_source(temp.path(), "data.bin", &sample_bytes(64));
    let parts_dir = temp.path().join("parts");
    let parts = PartSplitter::new(32).split(&source, &parts_dir).unwrap();

    let mut bytes = fs::read(&parts[1]).unwrap();
    bytes[HEADER_LEN + 5] ^= 0xFF;
    fs::write(&parts[1], bytes).unwrap();

    // Lenient mode does not recompute the digest
    PartCombiner::new()
        .combine(&parts_dir, &temp.path().join("lenient.bin"))
        .unwrap();

    let result = PartCombiner::new()
        .with_verification(Verification::Strict)
        .combine(&parts_dir, &temp.path().join("strict.bin"));
    assert!(matches!(
        result,
        Err(PartsError::Frame {
            source: FrameError::HashMismatch { .. },
            ..
        })
    ));
}

#[test]
fn test_combine_rejects_foreign_file_with_part_extension() {
    let temp = TempDir::new().unwrap();
    let source = write_source(temp.path(), "data.bin", &sample_bytes(20));
    let parts_dir = temp.path().join("parts");
    PartSplitter::new(10).split(&source, &parts_dir).unwrap();
    fs::write(parts_dir.join("notes.cpp"), b"int main() { return 0; }").unwrap();

    let result = PartCombiner::new().combine(&parts_dir, &temp.path().join("out.bin"));
    assert!(matches!(result, Err(PartsError::Frame { .. })));
}

#[test]
fn test_combine_reports_gap_in_part_ids() {
    let temp = TempDir::new().unwrap();
    let source = write_source(temp.path(), "data.bin", &sample_bytes(40));
    let parts_dir = temp.path().join("parts");
    let parts = PartSplitter::new(10).split(&source, &parts_dir).unwrap();
    fs::remove_file(&parts[2]).unwrap();

    let result = PartCombiner::new()
        .with_expected_parts(4)
        .combine(&parts_dir, &temp.path().join("out.bin"));
    assert!(matches!(
        result,
        Err(PartsError::MissingPartId { part_id: 3, .. })
    ));
}

#[test]
fn test_combine_reports_part_deleted_after_ordering() {
    let temp = TempDir::new().unwrap();
    let source = write_source(temp.path(), "data.bin", &sample_bytes(40));
    let parts_dir = temp.path().join("parts");
    let parts = PartSplitter::new(10).split(&source, &parts_dir).unwrap();

    let combiner = PartCombiner::new().with_expected_parts(4);
    let ordered = combiner.order(&parts_dir).unwrap();
    assert_eq!(ordered.parts.len(), 4);
    fs::remove_file(&parts[2]).unwrap();

    let result = combiner.combine_ordered(ordered, &temp.path().join("out.bin"));
    assert!(matches!(
        result,
        Err(PartsError::MissingPart { ref path }) if path == &parts[2]
    ));
}

//! Fixed-width frame header.
//!
//! ```text
//! offset  size  field
//! 0       8     magic_start
//! 8       4     part_id      (i32, little-endian)
//! 12      8     data_size    (i64, little-endian)
//! 20      32    content_hash (SHA-256 of the payload)
//! 52      8     magic_end
//! 60      N     payload
//! ```

use sha2::digest::Output;
use sha2::{Digest, Sha256};

use super::error::FrameError;

/// Sentinel written at both ends of every header.
pub const MAGIC: [u8; 8] = [0x42, 0x4D, 0x57, 0x21, 0x2A, 0x4D, 0x53, 0x47];

/// Length of the SHA-256 digest stored in the header.
pub const HASH_LEN: usize = 32;

/// Total header length in bytes; the payload starts at this offset.
pub const HEADER_LEN: usize = 8 + 4 + 8 + HASH_LEN + 8;

const PART_ID_OFFSET: usize = 8;
const DATA_SIZE_OFFSET: usize = 12;
const HASH_OFFSET: usize = 20;
const MAGIC_END_OFFSET: usize = 52;

/// Parsed frame header.
///
/// The magic sentinels are validated on parse and implied on write, so they
/// are not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// 1-based position of the part in the original sequence.
    pub part_id: i32,
    /// Exact length of the decoded payload.
    pub data_size: i64,
    /// SHA-256 of the decoded payload, computed at write time.
    pub content_hash: [u8; HASH_LEN],
}

impl FrameHeader {
    /// Build the header describing `payload` at position `part_id`.
    pub fn for_payload(part_id: i32, payload: &[u8]) -> Self {
        Self {
            part_id,
            data_size: payload.len() as i64,
            content_hash: hash_payload(payload),
        }
    }

    /// Serialize into the fixed 60-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..PART_ID_OFFSET].copy_from_slice(&MAGIC);
        buf[PART_ID_OFFSET..DATA_SIZE_OFFSET].copy_from_slice(&self.part_id.to_le_bytes());
        buf[DATA_SIZE_OFFSET..HASH_OFFSET].copy_from_slice(&self.data_size.to_le_bytes());
        buf[HASH_OFFSET..MAGIC_END_OFFSET].copy_from_slice(&self.content_hash);
        buf[MAGIC_END_OFFSET..].copy_from_slice(&MAGIC);
        buf
    }

    /// Parse the header from the start of `bytes`.
    ///
    /// Both sentinels must match exactly and `data_size` must not be negative.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: HEADER_LEN as u64,
                actual: bytes.len() as u64,
            });
        }

        if bytes[..PART_ID_OFFSET] != MAGIC {
            return Err(FrameError::BadMagicStart);
        }

        let mut part_id = [0u8; 4];
        part_id.copy_from_slice(&bytes[PART_ID_OFFSET..DATA_SIZE_OFFSET]);
        let mut data_size = [0u8; 8];
        data_size.copy_from_slice(&bytes[DATA_SIZE_OFFSET..HASH_OFFSET]);
        let mut content_hash = [0u8; HASH_LEN];
        content_hash.copy_from_slice(&bytes[HASH_OFFSET..MAGIC_END_OFFSET]);

        if bytes[MAGIC_END_OFFSET..HEADER_LEN] != MAGIC {
            return Err(FrameError::BadMagicEnd);
        }

        let data_size = i64::from_le_bytes(data_size);
        if data_size < 0 {
            return Err(FrameError::InvalidSize(data_size));
        }

        Ok(Self {
            part_id: i32::from_le_bytes(part_id),
            data_size,
            content_hash,
        })
    }

    /// Payload length as an unsigned count. Headers with a negative size never
    /// parse, so this only clamps hand-built values.
    pub fn payload_len(&self) -> u64 {
        self.data_size.max(0) as u64
    }

    /// Lowercase hex rendering of the stored digest.
    pub fn hash_hex(&self) -> String {
        to_hex(&self.content_hash)
    }

    /// Compare the stored digest against a freshly computed one.
    pub fn verify(&self, payload: &[u8]) -> Result<(), FrameError> {
        let actual = hash_payload(payload);
        if actual != self.content_hash {
            return Err(FrameError::HashMismatch {
                expected: self.hash_hex(),
                actual: to_hex(&actual),
            });
        }
        Ok(())
    }
}

/// SHA-256 of a payload.
pub fn hash_payload(payload: &[u8]) -> [u8; HASH_LEN] {
    let digest = Sha256::digest(payload);
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&digest);
    hash
}

fn to_hex(hash: &[u8; HASH_LEN]) -> String {
    format!("{:x}", Output::<Sha256>::from_slice(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_len() {
        assert_eq!(HEADER_LEN, 60);
    }

    #[test]
    fn test_layout_offsets() {
        let header = FrameHeader::for_payload(7, b"hello world");
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..8], &MAGIC);
        assert_eq!(&bytes[8..12], &7i32.to_le_bytes());
        assert_eq!(&bytes[12..20], &11i64.to_le_bytes());
        assert_eq!(&bytes[52..60], &MAGIC);
        assert_eq!(
            header.hash_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let header = FrameHeader::for_payload(-3, &[1, 2, 3]);
        let parsed = FrameHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_from_bytes_short_input() {
        let result = FrameHeader::from_bytes(&MAGIC);
        assert!(matches!(
            result,
            Err(FrameError::Truncated {
                expected: 60,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut header = FrameHeader::for_payload(1, b"x");
        header.data_size = -5;
        let result = FrameHeader::from_bytes(&header.to_bytes());
        assert!(matches!(result, Err(FrameError::InvalidSize(-5))));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let header = FrameHeader::for_payload(1, b"payload");
        assert!(header.verify(b"payload").is_ok());
        assert!(matches!(
            header.verify(b"pAyload"),
            Err(FrameError::HashMismatch { .. })
        ));
    }
}

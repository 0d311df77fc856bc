//! Frame encoding and decoding.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::encoding::PayloadEncoding;
use super::error::FrameError;
use super::header::{FrameHeader, HEADER_LEN};

/// Upper bound on the buffer reserved up front when reading a payload.
///
/// A corrupt `data_size` must not trigger a huge allocation before the read
/// discovers the file is short.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Whether the stored digest is checked against the payload on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verification {
    /// Trust the header; the digest is carried but not recomputed.
    #[default]
    Lenient,
    /// Recompute SHA-256 of every payload and fail on mismatch.
    Strict,
}

/// Wrap `payload` in a frame for position `part_id`.
pub fn encode(payload: &[u8], part_id: i32) -> Vec<u8> {
    encode_with(payload, part_id, PayloadEncoding::Raw)
}

/// Wrap `payload` in a frame, storing the payload in `encoding`.
///
/// The header describes the bytes as given, before encoding.
pub fn encode_with(payload: &[u8], part_id: i32, encoding: PayloadEncoding) -> Vec<u8> {
    let header = FrameHeader::for_payload(part_id, payload);
    let stored = encoding.encode(payload);

    let mut frame = Vec::with_capacity(HEADER_LEN + stored.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&stored);
    frame
}

/// Parse the header at the start of `bytes`.
///
/// Returns the header and the offset at which the payload begins. The payload
/// itself is not touched, so callers can stream it.
pub fn decode(bytes: &[u8]) -> Result<(FrameHeader, usize), FrameError> {
    let header = FrameHeader::from_bytes(bytes)?;
    Ok((header, HEADER_LEN))
}

/// Read and validate a header from a stream, leaving it positioned at the payload.
pub fn read_header<R: Read>(reader: &mut R) -> Result<FrameHeader, FrameError> {
    let mut buf = [0u8; HEADER_LEN];
    let filled = read_up_to(reader, &mut buf)?;
    FrameHeader::from_bytes(&buf[..filled])
}

/// Read and validate the header of the part file at `path`.
pub fn read_header_from_path(path: &Path) -> Result<FrameHeader, FrameError> {
    let mut file = File::open(path)?;
    read_header(&mut file)
}

/// Decode the header of the part at `path` and return it with the decoded payload.
///
/// Reads exactly the stored payload length implied by `data_size` and
/// `encoding`. The part file is left untouched.
pub fn strip(
    path: &Path,
    encoding: PayloadEncoding,
    verification: Verification,
) -> Result<(FrameHeader, Vec<u8>), FrameError> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header(&mut reader)?;

    let stored_len = encoding.encoded_len(header.payload_len());
    let mut stored = Vec::with_capacity(stored_len.min(MAX_PREALLOC) as usize);
    (&mut reader).take(stored_len).read_to_end(&mut stored)?;

    if (stored.len() as u64) < stored_len {
        return Err(FrameError::Truncated {
            expected: HEADER_LEN as u64 + stored_len,
            actual: HEADER_LEN as u64 + stored.len() as u64,
        });
    }

    let payload = encoding.decode(stored)?;
    if payload.len() as u64 != header.payload_len() {
        return Err(FrameError::PayloadDecode(format!(
            "decoded {} bytes, header declares {}",
            payload.len(),
            header.data_size
        )));
    }

    if verification == Verification::Strict {
        header.verify(&payload)?;
    }

    Ok((header, payload))
}

/// Fill `buf` from `reader` until it is full or the stream ends.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

//! Self-describing binary frame wrapped around each part.
//!
//! Every part file is a fixed 60-byte header followed by its payload. The
//! header repeats a magic sentinel at both ends so a truncated or foreign file
//! is rejected instead of misparsed, and carries the part's sequence id, the
//! payload length and a SHA-256 of the payload.
//!
//! # Example
//!
//! ```
//! use partfetch::frame::{decode, encode};
//!
//! let frame = encode(b"chunk of data", 1);
//! let (header, offset) = decode(&frame).unwrap();
//!
//! assert_eq!(header.part_id, 1);
//! assert_eq!(&frame[offset..], b"chunk of data");
//! ```

mod codec;
mod encoding;
mod error;
mod header;

pub use codec::{
    decode, encode, encode_with, read_header, read_header_from_path, strip, Verification,
};
pub use encoding::PayloadEncoding;
pub use error::FrameError;
pub use header::{hash_payload, FrameHeader, HASH_LEN, HEADER_LEN, MAGIC};

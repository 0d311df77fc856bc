//! On-disk payload representation.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::FrameError;

/// How a part's payload is stored after the header.
///
/// The header always describes the decoded bytes; only the bytes following it
/// change with the encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Payload bytes stored verbatim.
    #[default]
    Raw,
    /// Payload stored as standard padded base64 text (`[A-Za-z0-9+/=]`).
    Base64,
}

impl PayloadEncoding {
    /// Number of bytes occupied on disk by a payload of `decoded_len` bytes.
    pub fn encoded_len(self, decoded_len: u64) -> u64 {
        match self {
            PayloadEncoding::Raw => decoded_len,
            PayloadEncoding::Base64 => decoded_len.div_ceil(3) * 4,
        }
    }

    /// Encode decoded payload bytes for storage.
    pub fn encode(self, payload: &[u8]) -> Vec<u8> {
        match self {
            PayloadEncoding::Raw => payload.to_vec(),
            PayloadEncoding::Base64 => STANDARD.encode(payload).into_bytes(),
        }
    }

    /// Decode stored payload bytes. Malformed base64 text is rejected.
    pub fn decode(self, stored: Vec<u8>) -> Result<Vec<u8>, FrameError> {
        match self {
            PayloadEncoding::Raw => Ok(stored),
            PayloadEncoding::Base64 => STANDARD
                .decode(&stored)
                .map_err(|e| FrameError::PayloadDecode(e.to_string())),
        }
    }

    /// Name used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadEncoding::Raw => "raw",
            PayloadEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" | "binary" => Ok(PayloadEncoding::Raw),
            "base64" => Ok(PayloadEncoding::Base64),
            other => Err(format!("unknown payload encoding '{}'", other)),
        }
    }
}

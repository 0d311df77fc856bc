//! partfetch - framed part files, fetched in parallel and reassembled
//!
//! A large file is published as an ordered sequence of parts. Each part is a
//! self-describing frame (magic markers, sequence id, payload length and a
//! SHA-256 of the payload) so parts can be moved around, stored and sorted
//! without relying on filesystem metadata.
//!
//! # Architecture
//!
//! ```text
//! Manifest ──► FetchCoordinator ──► parts dir ──► PartOrderer ──► PartCombiner ──► artifact
//!              (bounded window)                  (id / name)     (FrameCodec)      (checksum)
//!
//! source file ──► PartSplitter (FrameCodec) ──► parts dir
//! ```
//!
//! - [`frame`]: binary frame header codec
//! - [`parts`]: splitting, ordering and combining framed parts
//! - [`fetch`]: bounded-concurrency downloader with progress and cancellation
//! - [`manifest`]: remote descriptor listing the part URLs
//! - [`checksum`]: whole-file SHA-256 verification
//! - [`config`]: INI configuration file
//! - [`logging`]: tracing subscriber setup

pub mod checksum;
pub mod config;
pub mod fetch;
pub mod frame;
pub mod logging;
pub mod manifest;
pub mod parts;

pub use fetch::{FetchConfig, FetchCoordinator, FetchError, FetchRequest};
pub use frame::{FrameError, FrameHeader, PayloadEncoding, Verification};
pub use manifest::Manifest;
pub use parts::{OrderStrategy, PartCombiner, PartSplitter, PartsError};

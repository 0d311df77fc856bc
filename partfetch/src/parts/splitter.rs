//! Splitting a file into framed parts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::{PartsError, PartsResult};
use super::DEFAULT_EXTENSION;
use crate::frame::{FrameHeader, PayloadEncoding};

/// Hard ceiling on the read buffer, and so on the size of a single part (1 GiB).
pub const MAX_CHUNK_SIZE: u64 = 1024 * 1024 * 1024;

/// Cuts a source file into fixed-size framed parts.
///
/// Parts are named `{base}{part_id:04}.{extension}` and written to the output
/// directory. The source file is never modified.
///
/// # Example
///
/// ```ignore
/// use partfetch::parts::PartSplitter;
///
/// let parts = PartSplitter::new(100 * 1024 * 1024)
///     .with_extension("cpp")
///     .split(Path::new("installer.rar"), Path::new("out"))?;
/// ```
#[derive(Debug, Clone)]
pub struct PartSplitter {
    chunk_size: u64,
    extension: String,
    encoding: PayloadEncoding,
    first_part_id: i32,
    base_name: Option<String>,
}

impl PartSplitter {
    /// Create a splitter producing parts of at most `chunk_size` bytes.
    ///
    /// The size is validated when [`split`](Self::split) runs.
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            extension: DEFAULT_EXTENSION.to_string(),
            encoding: PayloadEncoding::Raw,
            first_part_id: 1,
            base_name: None,
        }
    }

    /// Set the part file extension. Leading dots are ignored.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Set how payloads are stored on disk.
    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the id of the first part.
    pub fn with_first_part_id(mut self, part_id: i32) -> Self {
        self.first_part_id = part_id;
        self
    }

    /// Override the part name prefix (defaults to the source file stem).
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    /// Effective part size: the configured chunk size capped at [`MAX_CHUNK_SIZE`].
    pub fn effective_chunk_size(&self) -> u64 {
        self.chunk_size.min(MAX_CHUNK_SIZE)
    }

    /// Name of the part file carrying `part_id`.
    pub fn part_file_name(&self, base: &str, part_id: i32) -> String {
        format!("{}{:04}.{}", base, part_id, self.extension)
    }

    /// Split `source` into parts written under `out_dir`.
    ///
    /// # Returns
    ///
    /// Paths of the written parts, in sequence order. An empty source yields
    /// no parts.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the chunk size is zero (checked before any I/O),
    /// otherwise I/O failures on the source or the output directory.
    pub fn split(&self, source: &Path, out_dir: &Path) -> PartsResult<Vec<PathBuf>> {
        if self.chunk_size == 0 {
            return Err(PartsError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(PartsError::InvalidConfig(
                "part extension must not be empty".to_string(),
            ));
        }

        let base = match &self.base_name {
            Some(base) => base.clone(),
            None => source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    PartsError::InvalidConfig(format!(
                        "cannot derive part name from {}",
                        source.display()
                    ))
                })?,
        };

        fs::create_dir_all(out_dir).map_err(|e| PartsError::CreateDirFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

        let mut reader = File::open(source).map_err(|e| PartsError::ReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

        let buffer_len = self.buffer_len(reader.metadata().ok());

        let mut buffer = vec![0u8; buffer_len as usize];
        let mut part_id = self.first_part_id;
        let mut parts = Vec::new();
        let mut total_bytes = 0u64;

        loop {
            let filled = fill_buffer(&mut reader, &mut buffer).map_err(|e| {
                PartsError::ReadFailed {
                    path: source.to_path_buf(),
                    source: e,
                }
            })?;

            if filled == 0 {
                break;
            }

            let chunk = &buffer[..filled];
            let path = out_dir.join(self.part_file_name(&base, part_id));
            self.write_part(&path, part_id, chunk)?;

            debug!(part_id, bytes = filled, path = %path.display(), "Wrote part");

            total_bytes += filled as u64;
            parts.push(path);

            if filled < buffer.len() {
                break;
            }

            part_id = part_id.checked_add(1).ok_or_else(|| {
                PartsError::InvalidConfig("part id overflow: too many parts".to_string())
            })?;
        }

        info!(
            source = %source.display(),
            parts = parts.len(),
            bytes = total_bytes,
            encoding = %self.encoding,
            "Split file into parts"
        );

        Ok(parts)
    }

    /// Read buffer size for a source with the given metadata.
    ///
    /// Only regular files report a trustworthy length; pipes and procfs
    /// entries report zero, so they get the full chunk size.
    fn buffer_len(&self, metadata: Option<fs::Metadata>) -> u64 {
        let chunk_size = self.effective_chunk_size();
        match metadata {
            Some(m) if m.is_file() => chunk_size.min(m.len().max(1)),
            _ => chunk_size,
        }
    }

    fn write_part(&self, path: &Path, part_id: i32, chunk: &[u8]) -> PartsResult<()> {
        let header = FrameHeader::for_payload(part_id, chunk);
        let write_err = |e| PartsError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        let file = File::create(path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&header.to_bytes()).map_err(write_err)?;

        match self.encoding {
            PayloadEncoding::Raw => writer.write_all(chunk).map_err(write_err)?,
            encoding => writer
                .write_all(&encoding.encode(chunk))
                .map_err(write_err)?,
        }

        writer.flush().map_err(write_err)
    }
}

/// Read from `reader` until `buffer` is full or the stream ends.
fn fill_buffer<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

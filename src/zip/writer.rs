use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::structures::{CompressionMethod, DosDateTime, EndOfCentralDirectory, EntryHeader, FLAG_UTF8};

/// One stored file, as recorded while building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
}

/// A finished in-memory ZIP archive
#[derive(Debug, Clone)]
pub struct Archive {
    bytes: Vec<u8>,
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Name offered for the downloaded archive
    pub const FILE_NAME: &'static str = "pdf_files.zip";

    /// MIME type of the archive
    pub const MIME_TYPE: &'static str = "application/zip";

    /// Raw archive bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entries in archive order, duplicates included
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail early if [`write_to`](Archive::write_to) would refuse `path`.
    ///
    /// Lets a run stop before anything is downloaded. `write_to` still
    /// opens with `create_new`, so a file appearing in between is not
    /// clobbered.
    pub async fn check_destination(path: &Path, overwrite: bool) -> Result<()> {
        if overwrite {
            return Ok(());
        }
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("Cannot access {}", path.display()))?;
        if exists {
            bail!("{} already exists (use --overwrite to replace it)", path.display());
        }
        Ok(())
    }

    /// Write the archive to `path`.
    ///
    /// An existing file is only replaced when `overwrite` is set.
    pub async fn write_to(&self, path: &Path, overwrite: bool) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = match options.open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("{} already exists (use --overwrite to replace it)", path.display())
            }
            Err(e) => {
                return Err(anyhow!(e).context(format!("Cannot create {}", path.display())));
            }
        };

        file.write_all(&self.bytes)
            .await
            .with_context(|| format!("Cannot write {}", path.display()))?;
        file.flush().await?;

        debug!(path = %path.display(), bytes = self.bytes.len(), "Archive written");
        Ok(())
    }
}

/// Builds a deflate-compressed ZIP archive in memory
///
/// Entries are appended in call order and names are used verbatim. Adding
/// the same name twice stores two entries; most readers resolve the name
/// to the later one.
pub struct ArchiveBuilder {
    buf: Vec<u8>,
    headers: Vec<EntryHeader>,
    modified: DosDateTime,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    /// New builder stamping entries with the current local time
    pub fn new() -> Self {
        Self::with_timestamp(Local::now().naive_local())
    }

    /// New builder stamping every entry with `modified`
    pub fn with_timestamp(modified: NaiveDateTime) -> Self {
        Self {
            buf: Vec::new(),
            headers: Vec::new(),
            modified: DosDateTime::from_datetime(modified),
        }
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Compress `data` and append it under `name`
    pub fn add(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if self.headers.iter().any(|h| h.file_name == name) {
            warn!(name, "Archive already has an entry with this name; adding another");
        }

        let mut crc = Crc::new();
        crc.update(data);

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let header = EntryHeader {
            file_name: name.to_string(),
            flags: if name.is_ascii() { 0 } else { FLAG_UTF8 },
            compression_method: CompressionMethod::Deflate,
            modified: self.modified,
            crc32: crc.sum(),
            compressed_size: fit_u32(compressed.len(), name)?,
            uncompressed_size: fit_u32(data.len(), name)?,
            lfh_offset: fit_u32(self.buf.len(), name)?,
        };

        header.write_local(&mut self.buf)?;
        self.buf.extend_from_slice(&compressed);
        self.headers.push(header);

        debug!(
            name,
            size = data.len(),
            compressed = compressed.len(),
            "Added archive entry"
        );
        Ok(())
    }

    /// Write the central directory and return the finished archive
    pub fn finish(mut self) -> Result<Archive> {
        let Ok(entry_count) = u16::try_from(self.headers.len()) else {
            bail!("Too many entries for ZIP: {}", self.headers.len());
        };

        let cd_offset = fit_u32(self.buf.len(), "central directory")?;
        for header in &self.headers {
            header.write_central(&mut self.buf)?;
        }
        let cd_size = fit_u32(self.buf.len() - cd_offset as usize, "central directory")?;

        EndOfCentralDirectory::new(entry_count, cd_size, cd_offset).write_to(&mut self.buf)?;

        let entries = self
            .headers
            .into_iter()
            .map(|h| ArchiveEntry {
                name: h.file_name,
                size: u64::from(h.uncompressed_size),
                compressed_size: u64::from(h.compressed_size),
            })
            .collect();

        Ok(Archive {
            bytes: self.buf,
            entries,
        })
    }
}

/// Sizes and offsets are 32-bit without ZIP64
fn fit_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{} exceeds the 4 GiB ZIP limit", what))
}

//! ZIP archive building and inspection.
//!
//! Selected documents are bundled into one in-memory archive that is then
//! written out as `pdf_files.zip`.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (local/central headers, EOCD) and
//!   their little-endian encoding
//! - [`writer`]: [`ArchiveBuilder`], which deflates entries into a buffer
//!   and appends the central directory on [`ArchiveBuilder::finish`]
//! - [`reader`]: [`ZipReader`], which lists and decompresses entries of a
//!   finished archive
//!
//! ## Format Notes
//!
//! - Every entry uses the DEFLATE method with a CRC-32 from `flate2`
//! - Non-ASCII names set the UTF-8 flag (general purpose bit 11)
//! - No ZIP64: entries and the archive are limited to 4 GiB, 65535 entries
//! - Names are not deduplicated; a repeated name is stored twice

mod reader;
mod structures;
mod writer;

pub use reader::ZipReader;
pub use structures::*;
pub use writer::{Archive, ArchiveBuilder, ArchiveEntry};

//! Reads back archives held in memory.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. Read the Central Directory to get metadata for all entries
//! 3. For extraction, read each entry's Local File Header and data
//!
//! Serves as the check on what the writer produced: the unit and
//! integration tests list and decompress every archive they build.
//! Only what [`ArchiveBuilder`](super::ArchiveBuilder) produces needs to be
//! understood, so ZIP64 and multi-disk archives are rejected.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use flate2::Crc;
use std::io::{Cursor, Read};

use anyhow::{bail, Context, Result};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Parser over an in-memory ZIP archive
pub struct ZipReader<'a> {
    data: &'a [u8],
}

impl<'a> ZipReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the no-comment case first, then searches backwards for the
    /// signature across the maximum comment length.
    pub fn find_eocd(&self) -> Result<EndOfCentralDirectory> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            bail!("Not a valid ZIP file");
        }

        let tail = &self.data[size - EndOfCentralDirectory::SIZE..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && &tail[20..22] == b"\x00\x00" {
            return EndOfCentralDirectory::from_bytes(tail);
        }

        let search_start = size.saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);
        let window = &self.data[search_start..];

        for i in (0..=window.len() - EndOfCentralDirectory::SIZE).rev() {
            if &window[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for every remaining byte.
                let comment_len = u16::from_le_bytes([window[i + 20], window[i + 21]]) as usize;
                if comment_len == window.len() - i - EndOfCentralDirectory::SIZE {
                    return EndOfCentralDirectory::from_bytes(&window[i..]);
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// List every entry recorded in the Central Directory, in order
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let eocd = self.find_eocd()?;
        if eocd.disk_number != 0 || eocd.disk_with_cd != 0 {
            bail!("Multi-disk archives are not supported");
        }
        if eocd.total_entries == 0xFFFF || eocd.cd_offset == 0xFFFFFFFF {
            bail!("ZIP64 archives are not supported");
        }

        let cd_start = eocd.cd_offset as usize;
        let cd_end = cd_start + eocd.cd_size as usize;
        let cd_data = self
            .data
            .get(cd_start..cd_end)
            .context("Central Directory lies outside the archive")?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..eocd.total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse one Central Directory File Header at the cursor position
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Extra field and comment are not used
        cursor.set_position(
            cursor.position() + extra_field_length as u64 + file_comment_length as u64,
        );

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
        })
    }

    /// Offset of an entry's data, just past its Local File Header
    pub fn data_offset(&self, entry: &ZipFileEntry) -> Result<usize> {
        let start = entry.lfh_offset as usize;
        let lfh = self
            .data
            .get(start..start + LFH_SIZE)
            .context("Local File Header lies outside the archive")?;

        if &lfh[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as usize;

        Ok(start + LFH_SIZE + file_name_length + extra_field_length)
    }

    /// Decompress one entry and verify its CRC-32
    pub fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let offset = self.data_offset(entry)?;
        let raw = self
            .data
            .get(offset..offset + entry.compressed_size as usize)
            .context("Entry data lies outside the archive")?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(raw).read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!("Unsupported compression method: {}", method)
            }
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC mismatch for {}", entry.file_name);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_zip_data() {
        assert!(ZipReader::new(b"").list_files().is_err());
        assert!(ZipReader::new(b"%PDF-1.4 not a zip at all, definitely").list_files().is_err());
    }

    #[test]
    fn finds_eocd_behind_a_comment() {
        let mut data = Vec::new();
        let mut eocd = EndOfCentralDirectory::new(0, 0, 0);
        eocd.comment_len = 7;
        eocd.write_to(&mut data).unwrap();
        data.extend_from_slice(b"comment");

        let found = ZipReader::new(&data).find_eocd().unwrap();
        assert_eq!(found.comment_len, 7);
        assert!(ZipReader::new(&data).list_files().unwrap().is_empty());
    }

    #[test]
    fn detects_corrupted_entry() {
        let mut builder = crate::zip::ArchiveBuilder::new();
        builder.add("a.txt", b"hello hello hello").unwrap();
        let archive = builder.finish().unwrap();

        let mut bytes = archive.bytes().to_vec();
        let entries = ZipReader::new(&bytes).list_files().unwrap();
        let mut entry = entries[0].clone();
        entry.crc32 ^= 1;
        assert!(ZipReader::new(&bytes).read_entry(&entry).is_err());

        // Truncating the central directory breaks listing
        bytes.truncate(bytes.len() - 30);
        assert!(ZipReader::new(&bytes).list_files().is_err());
    }
}

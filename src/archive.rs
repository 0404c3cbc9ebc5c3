//! Packs N files into one byte stream with a JSON header of authoritative
//! per-entry offsets, and splits it back.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CryptoImgError;

/// Literal separator between the header and each entry, and between entries.
pub const SEPARATOR: &[u8] = b"---FILE-SEPARATOR---";

/// A single file handed to [`pack`].
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A single file recovered by [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HeaderEntry {
    name: String,
    size: u64,
    #[serde(rename = "mimeType")]
    mime_type: String,
    offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    #[serde(rename = "fileCount")]
    file_count: u64,
    #[serde(rename = "createdAt")]
    created_at: i64,
    entries: Vec<HeaderEntry>,
}

/// Metadata describing the packed archive as a whole, for the caller to
/// attach to the enclosing envelope (`mimeType`/`filename`).
pub struct ArchiveMetadata {
    pub mime_type: String,
    pub filename: String,
}

pub const ARCHIVE_MIME_TYPE: &str = "application/x-file-archive";

/// Pack `files` into one byte stream: `header_json || SEP || entry_1 || SEP || … || SEP || entry_N`.
///
/// Offsets are absolute — measured from byte 0 of the whole stream, header
/// included — so header length and offset values are mutually dependent;
/// a handful of fixed-point iterations converge since a header's length
/// only changes when an offset's digit count does.
///
/// `created_at` is a caller-supplied Unix-millisecond timestamp; this module
/// never reads the clock itself, matching the rest of the crate.
#[instrument(skip(files), fields(file_count = files.len()))]
pub fn pack(files: &[ArchiveInput], created_at: i64) -> Result<(Vec<u8>, ArchiveMetadata), CryptoImgError> {
    let mut header_len = 0u64;
    let mut header_json;
    loop {
        let mut entries = Vec::with_capacity(files.len());
        let mut running = header_len + SEPARATOR.len() as u64;
        for file in files {
            entries.push(HeaderEntry {
                name: file.name.clone(),
                size: file.data.len() as u64,
                mime_type: file.mime_type.clone(),
                offset: running,
            });
            running += file.data.len() as u64 + SEPARATOR.len() as u64;
        }

        let header = Header { file_count: files.len() as u64, created_at, entries };
        header_json = serde_json::to_vec(&header).map_err(|_| CryptoImgError::ProcessingError)?;

        if header_json.len() as u64 == header_len {
            break;
        }
        header_len = header_json.len() as u64;
    }

    let mut out = Vec::with_capacity(header_json.len() + SEPARATOR.len());
    out.extend_from_slice(&header_json);
    out.extend_from_slice(SEPARATOR);
    for file in files {
        out.extend_from_slice(&file.data);
        out.extend_from_slice(SEPARATOR);
    }

    let metadata = ArchiveMetadata {
        mime_type: ARCHIVE_MIME_TYPE.to_string(),
        filename: format!("archive_{created_at}.farc"),
    };
    Ok((out, metadata))
}

/// Split a packed archive back into its entries.
///
/// Entries are sliced by their declared `size`/`offset`, never by scanning
/// for [`SEPARATOR`] — a file's own bytes may legitimately contain the
/// separator.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn unpack(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, CryptoImgError> {
    let sep_pos = find_subslice(bytes, SEPARATOR).ok_or(CryptoImgError::ArchiveCorrupt)?;
    let header: Header =
        serde_json::from_slice(&bytes[..sep_pos]).map_err(|_| CryptoImgError::ArchiveCorrupt)?;

    let mut out = Vec::with_capacity(header.entries.len());
    for entry in &header.entries {
        let start = usize::try_from(entry.offset).map_err(|_| CryptoImgError::ArchiveCorrupt)?;
        let size = usize::try_from(entry.size).map_err(|_| CryptoImgError::ArchiveCorrupt)?;
        let end = start.checked_add(size).ok_or(CryptoImgError::ArchiveCorrupt)?;
        let data = bytes.get(start..end).ok_or(CryptoImgError::ArchiveCorrupt)?;

        out.push(ArchiveEntry {
            name: entry.name.clone(),
            size: entry.size,
            mime_type: entry.mime_type.clone(),
            data: data.to_vec(),
        });
    }

    Ok(out)
}

/// True iff the first 4 KiB contain both the `"fileCount"` key and the
/// separator literal.
pub fn looks_like_archive(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(4096)];
    find_subslice(window, br#""fileCount""#).is_some() && find_subslice(window, SEPARATOR).is_some()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_files() -> Vec<ArchiveInput> {
        vec![
            ArchiveInput { name: "a.txt".into(), mime_type: "text/plain".into(), data: b"Hello".to_vec() },
            ArchiveInput { name: "b.txt".into(), mime_type: "text/plain".into(), data: b"World".to_vec() },
        ]
    }

    #[test]
    fn round_trips_multiple_files_preserving_order_and_names() {
        let (bytes, meta) = pack(&sample_files(), 1_700_000_000_000).unwrap();
        assert_eq!(meta.mime_type, ARCHIVE_MIME_TYPE);

        let entries = unpack(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].data, b"Hello");
        assert_eq!(entries[1].name, "b.txt");
        assert_eq!(entries[1].data, b"World");
    }

    #[test]
    fn entry_containing_separator_bytes_still_round_trips() {
        let files = vec![ArchiveInput {
            name: "tricky.bin".into(),
            mime_type: "application/octet-stream".into(),
            data: b"before---FILE-SEPARATOR---after".to_vec(),
        }];
        let (bytes, _) = pack(&files, 0).unwrap();
        let entries = unpack(&bytes).unwrap();
        assert_eq!(entries[0].data, b"before---FILE-SEPARATOR---after");
    }

    #[test]
    fn looks_like_archive_detects_packed_bytes() {
        let (bytes, _) = pack(&sample_files(), 0).unwrap();
        assert!(looks_like_archive(&bytes));
        assert!(!looks_like_archive(b"just some plain bytes"));
    }

    #[test]
    fn unpack_without_separator_is_archive_corrupt() {
        assert_eq!(unpack(b"no separator here"), Err(CryptoImgError::ArchiveCorrupt));
    }

    #[test]
    fn unpack_with_offset_out_of_range_is_archive_corrupt() {
        let header = r#"{"fileCount":1,"createdAt":0,"entries":[{"name":"x","size":999,"mimeType":"text/plain","offset":0}]}"#;
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(SEPARATOR);
        bytes.extend_from_slice(b"short");
        bytes.extend_from_slice(SEPARATOR);
        assert_eq!(unpack(&bytes), Err(CryptoImgError::ArchiveCorrupt));
    }

    #[test]
    fn archive_filename_ends_with_farc() {
        let (_, meta) = pack(&sample_files(), 42).unwrap();
        assert!(meta.filename.ends_with(".farc"));
    }
}

//! Plaintext-block metadata codec.
//!
//! A plaintext block is `utf8(json(FileMetadata)) || 0x7C 0x7C || file_bytes`.
//! The delimiter is a literal two-byte scan, never a Unicode-aware split —
//! JSON escapes any literal `|` inside a string, so the delimiter bytes can
//! never legitimately occur inside the JSON prefix.

use serde::{Deserialize, Serialize};

use crate::error::CryptoImgError;

/// Literal two-byte delimiter separating JSON metadata from raw file bytes.
pub const DELIMITER: [u8; 2] = [0x7C, 0x7C];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub timestamp: i64,
}

impl FileMetadata {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, timestamp: i64) -> Self {
        Self { filename: filename.into(), mime_type: mime_type.into(), timestamp }
    }
}

/// Encode `metadata || 0x7C 0x7C || bytes` into one buffer.
pub fn encode_block(metadata: &FileMetadata, bytes: &[u8]) -> Result<Vec<u8>, CryptoImgError> {
    let json = serde_json::to_vec(metadata).map_err(|_| CryptoImgError::ProcessingError)?;
    let mut out = Vec::with_capacity(json.len() + DELIMITER.len() + bytes.len());
    out.extend_from_slice(&json);
    out.extend_from_slice(&DELIMITER);
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Split a plaintext block at the first occurrence of the literal delimiter
/// and parse the left side as [`FileMetadata`]. Does not copy the binary
/// right-hand side into a second buffer — it is returned as a borrowed
/// slice of `block`.
pub fn decode_block(block: &[u8]) -> Result<(FileMetadata, &[u8]), CryptoImgError> {
    let pos = find_delimiter(block).ok_or(CryptoImgError::InvalidMetadata)?;
    let metadata: FileMetadata =
        serde_json::from_slice(&block[..pos]).map_err(|_| CryptoImgError::InvalidMetadata)?;
    let rest = &block[pos + DELIMITER.len()..];
    Ok((metadata, rest))
}

fn find_delimiter(block: &[u8]) -> Option<usize> {
    block.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_metadata_and_bytes() {
        let meta = FileMetadata::new("a.txt", "text/plain", 1_700_000_000_000);
        let block = encode_block(&meta, b"payload").unwrap();
        let (decoded_meta, rest) = decode_block(&block).unwrap();
        assert_eq!(decoded_meta, meta);
        assert_eq!(rest, b"payload");
    }

    #[test]
    fn binary_payload_may_contain_pipe_bytes() {
        let meta = FileMetadata::new("x.bin", "application/octet-stream", 0);
        let payload = vec![b'|', b'|', 0xFF, 0x00, b'|'];
        let block = encode_block(&meta, &payload).unwrap();
        let (_, rest) = decode_block(&block).unwrap();
        assert_eq!(rest, payload.as_slice());
    }

    #[test]
    fn filename_with_pipe_does_not_confuse_the_scan() {
        let meta = FileMetadata::new("a|b.txt", "text/plain", 1);
        let block = encode_block(&meta, b"data").unwrap();
        let (decoded_meta, rest) = decode_block(&block).unwrap();
        assert_eq!(decoded_meta.filename, "a|b.txt");
        assert_eq!(rest, b"data");
    }

    #[test]
    fn missing_delimiter_is_invalid_metadata() {
        assert_eq!(decode_block(b"not a valid block"), Err(CryptoImgError::InvalidMetadata));
    }

    #[test]
    fn malformed_json_prefix_is_invalid_metadata() {
        let mut block = b"{not json".to_vec();
        block.extend_from_slice(&DELIMITER);
        block.extend_from_slice(b"data");
        assert_eq!(decode_block(&block), Err(CryptoImgError::InvalidMetadata));
    }
}

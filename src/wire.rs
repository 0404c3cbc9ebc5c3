//! Wire format (v1)
//!
//! Format (v1):
//!   magic[6] "ENCIMG" || version[1] || salt[16] || nonce[12] || aead_ct[16+]
//!
//! `aead_ct` is the AES-256-GCM ciphertext with its 16-byte authentication
//! tag appended, as produced by [`crate::aead`].

use crate::error::CryptoImgError;

/// Fixed six-byte magic identifying an envelope produced by this format.
pub const MAGIC: &[u8; 6] = b"ENCIMG";

/// Version byte for the only format this crate currently knows how to read.
pub const VERSION_1: u8 = 0x01;

/// All version bytes this decoder accepts. Decoders must reject anything
/// else with [`CryptoImgError::UnrecognizedFormat`].
pub const KNOWN_VERSIONS: &[u8] = &[VERSION_1];

pub const SALT_BYTES: usize = 16;
pub const NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;

/// `magic(6) + version(1) + salt(16) + nonce(12)`.
pub const HEADER_BYTES: usize = MAGIC.len() + 1 + SALT_BYTES + NONCE_BYTES; // 35

/// Minimum envelope length accepted by header validation: the fixed header
/// plus at least one byte of ciphertext. A real envelope
/// always carries a full 16-byte AEAD tag on top of that, but the header
/// check itself only enforces this looser floor — AEAD decryption is what
/// ultimately rejects anything shorter than a valid tag.
pub const MIN_ENVELOPE_BYTES: usize = HEADER_BYTES + 1; // 36

/// Borrowed view of a parsed envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub salt: &'a [u8; SALT_BYTES],
    pub nonce: &'a [u8; NONCE_BYTES],
    pub aead_ciphertext: &'a [u8],
}

/// Parse an envelope's fixed-size header and validate magic/version/length.
///
/// Length is checked before magic, and magic/version are checked before any
/// key derivation ever runs — a bad password should never be the reported
/// cause of a header that was never well-formed to begin with.
pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>, CryptoImgError> {
    if data.len() < MIN_ENVELOPE_BYTES {
        return Err(CryptoImgError::CorruptedImage);
    }

    if &data[0..MAGIC.len()] != MAGIC {
        return Err(CryptoImgError::UnrecognizedFormat);
    }

    let version = data[MAGIC.len()];
    if !KNOWN_VERSIONS.contains(&version) {
        return Err(CryptoImgError::UnrecognizedFormat);
    }

    let salt_start = MAGIC.len() + 1;
    let salt_end = salt_start + SALT_BYTES;
    let nonce_end = salt_end + NONCE_BYTES;

    let salt: &[u8; SALT_BYTES] = data[salt_start..salt_end]
        .try_into()
        .map_err(|_| CryptoImgError::CorruptedImage)?;
    let nonce: &[u8; NONCE_BYTES] = data[salt_end..nonce_end]
        .try_into()
        .map_err(|_| CryptoImgError::CorruptedImage)?;

    let aead_ciphertext = &data[nonce_end..];

    Ok(WireComponents { version, salt, nonce, aead_ciphertext })
}

/// Assemble `magic || version || salt || nonce || aead_ct` into one buffer.
pub fn encode_wire(
    salt: &[u8; SALT_BYTES],
    nonce: &[u8; NONCE_BYTES],
    aead_ciphertext: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + aead_ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION_1);
    out.extend_from_slice(salt);
    out.extend_from_slice(nonce);
    out.extend_from_slice(aead_ciphertext);
    out
}

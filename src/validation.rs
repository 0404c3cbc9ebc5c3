//! A centralized policy layer consulted by the pipeline before any
//! expensive work runs: size caps, password/Base64/envelope-header shape
//! checks, and the memory budget gate, each returning the crate's own
//! closed error type instead of an ad hoc `String`.

use crate::archive::looks_like_archive;
use crate::error::CryptoImgError;
use crate::wire;

/// Single-file cap: 1 GiB.
pub const MAX_SINGLE_FILE_BYTES: u64 = 1024 * 1024 * 1024;
/// Aggregate cap for `N > 1` archives before encryption.
pub const MAX_MULTI_FILE_BYTES: u64 = 150 * 1024 * 1024;
/// Default per-process memory reservation budget.
pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 2_560 * 1024 * 1024; // 2.5 GiB
/// Multiplier applied to a requested size when checking against the budget:
/// `size * 2.5 <= budget`.
const MEMORY_CHECK_MULTIPLIER: f64 = 2.5;

/// A candidate file offered for encryption.
#[derive(Debug, Clone, Copy)]
pub struct FileForEncryption {
    pub size: u64,
}

/// A candidate image file offered for decryption.
#[derive(Debug, Clone, Copy)]
pub struct ImageForDecryption<'a> {
    pub mime_type: &'a str,
    pub name: &'a str,
    pub size: u64,
}

/// `f.size <= 1 GiB`. A nil/absent file is the caller's responsibility to
/// never construct; this contract starts from a size.
pub fn file_for_encryption(file: FileForEncryption) -> Result<(), CryptoImgError> {
    if file.size > MAX_SINGLE_FILE_BYTES {
        return Err(CryptoImgError::FileTooLarge);
    }
    Ok(())
}

/// Total size of a multi-file bundle against the 150 MiB archive cap.
pub fn multi_file_total(total_bytes: u64) -> Result<(), CryptoImgError> {
    if total_bytes > MAX_MULTI_FILE_BYTES {
        return Err(CryptoImgError::FileTooLarge);
    }
    Ok(())
}

/// `f.mime = "image/png" ∧ f.name ends with ".png" ∧ f.size <= 1 GiB`.
pub fn image_for_decryption(file: ImageForDecryption<'_>) -> Result<(), CryptoImgError> {
    if file.mime_type != "image/png" || !file.name.ends_with(".png") {
        return Err(CryptoImgError::InvalidImageFormat);
    }
    if file.size > MAX_SINGLE_FILE_BYTES {
        return Err(CryptoImgError::FileTooLarge);
    }
    Ok(())
}

/// `trim(p) != ""`. Empty or whitespace-only is rejected; the primitive
/// crypto layer itself accepts any UTF-8, including empty — this check is
/// the policy gate in front of it.
pub fn password(p: &str) -> Result<(), CryptoImgError> {
    if p.trim().is_empty() {
        return Err(CryptoImgError::EmptyPassword);
    }
    Ok(())
}

/// `^[A-Za-z0-9+/]*={0,2}$` and `len(s) % 4 == 0`.
pub fn base64(s: &str) -> Result<(), CryptoImgError> {
    if s.len() % 4 != 0 {
        return Err(CryptoImgError::CorruptedImage);
    }

    let bytes = s.as_bytes();
    let pad_start = bytes.iter().rposition(|&b| b != b'=').map_or(0, |i| i + 1);
    let padding = &bytes[pad_start..];
    let body = &bytes[..pad_start];

    if padding.len() > 2 {
        return Err(CryptoImgError::CorruptedImage);
    }
    let body_ok = body
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
    if !body_ok {
        return Err(CryptoImgError::CorruptedImage);
    }
    Ok(())
}

/// `len(b) >= 36 ∧ b[0..6] = magic ∧ b[6] in known_versions`.
///
/// Length is rejected as `CORRUPTED_IMAGE`; magic/version mismatches as
/// `UNRECOGNIZED_FORMAT` — matching [`wire::decode_wire`]'s own ordering,
/// since this is the same check surfaced as a standalone policy gate.
pub fn envelope_header(b: &[u8]) -> Result<(), CryptoImgError> {
    wire::decode_wire(b).map(|_| ())
}

/// `size * 2.5 <= budget`.
pub fn memory(size: u64, budget: u64) -> Result<(), CryptoImgError> {
    let projected = size as f64 * MEMORY_CHECK_MULTIPLIER;
    if projected > budget as f64 {
        return Err(CryptoImgError::MemoryLimit);
    }
    Ok(())
}

/// Convenience check layered on [`crate::archive::looks_like_archive`]; kept
/// here so callers have one module to consult for all pre-flight checks.
pub fn is_archive_payload(bytes: &[u8]) -> bool {
    looks_like_archive(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_for_encryption_accepts_up_to_one_gib() {
        assert!(file_for_encryption(FileForEncryption { size: MAX_SINGLE_FILE_BYTES }).is_ok());
        assert_eq!(
            file_for_encryption(FileForEncryption { size: MAX_SINGLE_FILE_BYTES + 1 }),
            Err(CryptoImgError::FileTooLarge)
        );
    }

    #[test]
    fn multi_file_total_enforces_150_mib_cap() {
        assert!(multi_file_total(MAX_MULTI_FILE_BYTES).is_ok());
        assert_eq!(multi_file_total(MAX_MULTI_FILE_BYTES + 1), Err(CryptoImgError::FileTooLarge));
    }

    #[test]
    fn image_for_decryption_requires_png_mime_and_extension() {
        let ok = ImageForDecryption { mime_type: "image/png", name: "x.png", size: 10 };
        assert!(image_for_decryption(ok).is_ok());

        let bad_mime = ImageForDecryption { mime_type: "image/jpeg", name: "x.png", size: 10 };
        assert_eq!(image_for_decryption(bad_mime), Err(CryptoImgError::InvalidImageFormat));

        let bad_ext = ImageForDecryption { mime_type: "image/png", name: "x.jpg", size: 10 };
        assert_eq!(image_for_decryption(bad_ext), Err(CryptoImgError::InvalidImageFormat));
    }

    #[test]
    fn password_rejects_blank_and_whitespace_only() {
        assert_eq!(password(""), Err(CryptoImgError::EmptyPassword));
        assert_eq!(password("   "), Err(CryptoImgError::EmptyPassword));
        assert!(password("pw").is_ok());
    }

    #[test]
    fn base64_validates_alphabet_padding_and_length() {
        assert!(base64("SGVsbG8=").is_ok());
        assert!(base64("").is_ok());
        assert_eq!(base64("abc"), Err(CryptoImgError::CorruptedImage)); // len % 4 != 0
        assert_eq!(base64("ab==cdef"), Err(CryptoImgError::CorruptedImage)); // padding mid-string
        assert_eq!(base64("SGVs!G8="), Err(CryptoImgError::CorruptedImage)); // bad char
    }

    #[test]
    fn envelope_header_matches_wire_decode_ordering() {
        assert_eq!(envelope_header(&[0u8; 10]), Err(CryptoImgError::CorruptedImage));
        let mut bad_magic = vec![0u8; 40];
        bad_magic[0] = b'X';
        assert_eq!(envelope_header(&bad_magic), Err(CryptoImgError::UnrecognizedFormat));
    }

    #[test]
    fn memory_check_applies_2_5x_multiplier() {
        let budget = 1000u64;
        assert!(memory(400, budget).is_ok()); // 400*2.5 = 1000
        assert_eq!(memory(401, budget), Err(CryptoImgError::MemoryLimit));
    }
}

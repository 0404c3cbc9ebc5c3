//! Closed error taxonomy for the envelope, image, archive, and pipeline layers.
//!
//! Every failure surface in the crate collapses into one [`CryptoImgError`]
//! variant. Each variant carries the operational metadata a caller needs to
//! decide what to do next (severity, whether retrying can help, and ordered
//! recovery hints) instead of a bare string.

use core::fmt;

use thiserror::Error;

/// Severity band attached to every canonical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// A suggested path to recovery, returned alongside a canonical error.
#[derive(Debug, Clone)]
pub struct Recovery {
    pub can_recover: bool,
    pub strategy: &'static str,
    pub hints: &'static [&'static str],
}

impl Recovery {
    const fn none() -> Self {
        Recovery { can_recover: false, strategy: "none", hints: &[] }
    }
}

/// The closed taxonomy of canonical failure codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoImgError {
    #[error("invalid password")]
    InvalidPassword,
    #[error("unrecognized envelope format")]
    UnrecognizedFormat,
    #[error("corrupted image or truncated envelope")]
    CorruptedImage,
    #[error("input exceeds the size limit")]
    FileTooLarge,
    #[error("memory budget exceeded")]
    MemoryLimit,
    #[error("input is not a PNG image")]
    InvalidImageFormat,
    #[error("password is empty")]
    EmptyPassword,
    #[error("metadata could not be parsed as JSON")]
    InvalidMetadata,
    #[error("archive header is corrupt or offsets are out of range")]
    ArchiveCorrupt,
    #[error("internal processing error")]
    ProcessingError,
}

impl CryptoImgError {
    pub fn code(&self) -> &'static str {
        match self {
            CryptoImgError::InvalidPassword => "INVALID_PASSWORD",
            CryptoImgError::UnrecognizedFormat => "UNRECOGNIZED_FORMAT",
            CryptoImgError::CorruptedImage => "CORRUPTED_IMAGE",
            CryptoImgError::FileTooLarge => "FILE_TOO_LARGE",
            CryptoImgError::MemoryLimit => "MEMORY_LIMIT",
            CryptoImgError::InvalidImageFormat => "INVALID_IMAGE_FORMAT",
            CryptoImgError::EmptyPassword => "EMPTY_PASSWORD",
            CryptoImgError::InvalidMetadata => "INVALID_METADATA",
            CryptoImgError::ArchiveCorrupt => "ARCHIVE_CORRUPT",
            CryptoImgError::ProcessingError => "PROCESSING_ERROR",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CryptoImgError::InvalidPassword => Severity::Medium,
            CryptoImgError::UnrecognizedFormat => Severity::Medium,
            CryptoImgError::CorruptedImage => Severity::Medium,
            CryptoImgError::FileTooLarge => Severity::Low,
            CryptoImgError::MemoryLimit => Severity::Critical,
            CryptoImgError::InvalidImageFormat => Severity::Low,
            CryptoImgError::EmptyPassword => Severity::Low,
            CryptoImgError::InvalidMetadata => Severity::Medium,
            CryptoImgError::ArchiveCorrupt => Severity::Medium,
            CryptoImgError::ProcessingError => Severity::High,
        }
    }

    /// Ordered recovery hints for the caller to surface to a user.
    pub fn recovery(&self) -> Recovery {
        match self {
            CryptoImgError::InvalidPassword => Recovery {
                can_recover: true,
                strategy: "retry_password",
                hints: &["check caps lock", "paste instead of type"],
            },
            CryptoImgError::UnrecognizedFormat => Recovery {
                can_recover: false,
                strategy: "reject",
                hints: &["verify the file was produced by this tool"],
            },
            CryptoImgError::CorruptedImage => Recovery {
                can_recover: false,
                strategy: "reject",
                hints: &["re-transfer the file", "confirm it was not truncated"],
            },
            CryptoImgError::FileTooLarge => Recovery {
                can_recover: true,
                strategy: "split_input",
                hints: &["encrypt fewer files at once", "split large files before encrypting"],
            },
            CryptoImgError::MemoryLimit => Recovery {
                can_recover: true,
                strategy: "reduce_size",
                hints: &["retry with a smaller input", "free memory and retry"],
            },
            CryptoImgError::InvalidImageFormat => Recovery {
                can_recover: true,
                strategy: "reselect_file",
                hints: &["choose a PNG file"],
            },
            CryptoImgError::EmptyPassword => Recovery {
                can_recover: true,
                strategy: "retry_password",
                hints: &["enter a non-empty password"],
            },
            CryptoImgError::InvalidMetadata => Recovery::none(),
            CryptoImgError::ArchiveCorrupt => Recovery::none(),
            CryptoImgError::ProcessingError => Recovery::none(),
        }
    }
}

/// Scrub a raw error message of anything that looks like key material,
/// Base64 payload, or hex-encoded bytes before it reaches a user.
pub fn scrub_message(raw: &str) -> String {
    raw.split_whitespace()
        .map(|tok| if looks_sensitive(tok) { "<redacted>" } else { tok })
        .collect::<Vec<_>>()
        .join(" ")
}

fn looks_sensitive(tok: &str) -> bool {
    let len = tok.len();
    if len < 16 {
        return false;
    }
    let is_hex = tok.chars().all(|c| c.is_ascii_hexdigit());
    let is_base64ish = tok
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=');
    is_hex || is_base64ish
}

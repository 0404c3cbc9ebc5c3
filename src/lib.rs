//! # encimg
//!
//! Turns arbitrary user data — a file, several files, or plain text — into a
//! password-protected, self-describing envelope that travels as raw binary,
//! as Base64 text, or as a PNG image whose pixels carry the Base64 string.
//! Running the pipeline in reverse recovers the original bytes and their
//! filesystem metadata.
//!
//! ## Quick Start
//!
//! ```rust
//! use encimg::{pipeline, BufferManager, Phase};
//!
//! let buffer = BufferManager::default();
//! let envelope = pipeline::encrypt_text(&buffer, "secret", "correct horse", 0, |_, _: Phase| {}).unwrap();
//! let (plaintext, metadata, is_archive) = pipeline::decrypt_envelope(&envelope, "correct horse", |_, _| {}).unwrap();
//!
//! assert_eq!(plaintext, b"secret");
//! assert!(!is_archive);
//! assert_eq!(metadata.filename, "encrypted_text.txt");
//! ```
//!
//! ## Security Properties
//!
//! - **Authenticated**: AES-256-GCM; a wrong password and a tampered
//!   envelope fail identically, by design.
//! - **Self-describing**: magic + version byte select the KDF/AEAD
//!   parameters; unknown versions are rejected before any key derivation.
//! - **Zeroizing**: derived keys and plaintext buffers are wiped on every
//!   exit path, including panics.
//!
//! ## What's NOT Provided
//!
//! - Key escrow or password recovery
//! - A server-side component
//! - Streaming: every operation consumes a whole input and produces a whole
//!   output
//! - Steganographic concealment — the carrier PNG is structured and
//!   trivially recognized as carrying data, not a covert channel

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/encimg/0.1.0")]

mod aead;
mod archive;
mod buffer;
mod crypto;
mod error;
mod kdf;
mod metadata;
mod validation;

// Image codec and wire framing are documented core components but not
// meant to be reached around the pipeline in normal use; kept visible for
// cross-implementation wire-compatibility testing and CLI `inspect`.
#[doc(hidden)]
pub mod image;
#[doc(hidden)]
pub mod wire;

pub mod pipeline;

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

pub use archive::{ArchiveEntry, ArchiveInput, ArchiveMetadata, ARCHIVE_MIME_TYPE};
pub use buffer::{BufferManager, MemoryUsage, SecureBuffer};
pub use error::{scrub_message, CryptoImgError, Recovery, Severity};
pub use metadata::FileMetadata;
pub use pipeline::{
    decrypt, decrypt_base64, decrypt_envelope, decrypt_image, encrypt, encrypt_files,
    encrypt_text, estimate_time_seconds, unarchive, DecryptInput, DecryptOutput, EncryptInput,
    EncryptOutput, Phase,
};
pub use validation::{
    DEFAULT_MEMORY_BUDGET_BYTES, MAX_MULTI_FILE_BYTES, MAX_SINGLE_FILE_BYTES,
};

//! Pipeline Orchestrator: composes validation, the archive, the crypto
//! engine, and the image codec into the user-level encrypt/decrypt
//! operations, reporting progress and guaranteeing buffer cleanup on every
//! exit path.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{instrument, warn};

use crate::archive::{self, ArchiveEntry, ArchiveInput, ARCHIVE_MIME_TYPE};
use crate::buffer::BufferManager;
use crate::crypto;
use crate::error::CryptoImgError;
use crate::image;
use crate::metadata::FileMetadata;
use crate::validation::{self, FileForEncryption, ImageForDecryption};

/// Phase reported to a caller's progress callback. Validation itself runs
/// ahead of any reported phase, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Archiving,
    Encrypting,
    Base64Encoding,
    Rendering,
    Decoding,
    Decrypting,
    Unarchiving,
}

/// Rough processing-time estimate in seconds, at ~1 MiB/s. Purely advisory
/// — for UI countdowns, never a timeout.
pub fn estimate_time_seconds(size_bytes: u64) -> f64 {
    size_bytes as f64 / (1024.0 * 1024.0)
}

/// Invoke `progress` but never let a panic inside it escape into the
/// pipeline: a caller's broken callback must never abort the operation.
fn report(progress: &mut dyn FnMut(u8, Phase), percent: u8, phase: Phase) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| progress(percent, phase)));
    if result.is_err() {
        warn!(?phase, percent, "progress callback panicked; continuing operation");
    }
}

static OP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_op_id(label: &str) -> String {
    let n = OP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{label}-{n}")
}

/// Releases a buffer-manager reservation when it drops, on every exit path
/// including early returns via `?` and panics.
struct ReservationGuard<'a> {
    manager: &'a BufferManager,
    op_id: String,
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        self.manager.release(&self.op_id);
    }
}

fn reserve_scoped<'a>(
    manager: &'a BufferManager,
    label: &str,
    bytes: u64,
) -> Result<ReservationGuard<'a>, CryptoImgError> {
    let op_id = next_op_id(label);
    manager.reserve(&op_id, bytes)?;
    Ok(ReservationGuard { manager, op_id })
}

/// Validates each file, archives when `files.len() > 1`, then runs the
/// crypto engine. `created_at` is a caller-supplied Unix-millisecond
/// timestamp.
#[instrument(skip(buffer, files, password, progress), fields(file_count = files.len()))]
pub fn encrypt_files(
    buffer: &BufferManager,
    files: &[ArchiveInput],
    password: &str,
    created_at: i64,
    mut progress: impl FnMut(u8, Phase),
) -> Result<Vec<u8>, CryptoImgError> {
    validation::password(password)?;

    let mut total_size: u64 = 0;
    for file in files {
        validation::file_for_encryption(FileForEncryption { size: file.data.len() as u64 })?;
        total_size += file.data.len() as u64;
    }

    let (plaintext, file_metadata) = if files.len() > 1 {
        validation::multi_file_total(total_size)?;
        report(&mut progress, 0, Phase::Archiving);
        let (archive_bytes, archive_meta) = archive::pack(files, created_at)?;
        report(&mut progress, 100, Phase::Archiving);
        let metadata = FileMetadata::new(archive_meta.filename, archive_meta.mime_type, created_at);
        (archive_bytes, metadata)
    } else {
        let file = files.first().ok_or(CryptoImgError::ProcessingError)?;
        let metadata = FileMetadata::new(file.name.clone(), file.mime_type.clone(), created_at);
        (file.data.clone(), metadata)
    };

    let _reservation = reserve_scoped(buffer, "encrypt_files", total_size.saturating_mul(3))?;

    report(&mut progress, 0, Phase::Encrypting);
    let envelope = crypto::encrypt(&plaintext, password, &file_metadata)?;
    report(&mut progress, 100, Phase::Encrypting);

    Ok(envelope)
}

/// Encrypts a plain text body under fixed metadata:
/// `{filename: "encrypted_text.txt", mimeType: "text/plain"}`.
#[instrument(skip(buffer, text, password, progress), fields(text_len = text.len()))]
pub fn encrypt_text(
    buffer: &BufferManager,
    text: &str,
    password: &str,
    created_at: i64,
    mut progress: impl FnMut(u8, Phase),
) -> Result<Vec<u8>, CryptoImgError> {
    validation::password(password)?;
    let plaintext = text.as_bytes();
    validation::file_for_encryption(FileForEncryption { size: plaintext.len() as u64 })?;

    let _reservation = reserve_scoped(buffer, "encrypt_text", (plaintext.len() as u64).saturating_mul(3))?;

    let metadata = FileMetadata::new("encrypted_text.txt", "text/plain", created_at);
    report(&mut progress, 0, Phase::Encrypting);
    let envelope = crypto::encrypt(plaintext, password, &metadata)?;
    report(&mut progress, 100, Phase::Encrypting);

    Ok(envelope)
}

/// Validates the header, decrypts, and classifies the recovered payload as
/// an archive or a plain file.
#[instrument(skip(envelope_bytes, password, progress), fields(len = envelope_bytes.len()))]
pub fn decrypt_envelope(
    envelope_bytes: &[u8],
    password: &str,
    mut progress: impl FnMut(u8, Phase),
) -> Result<(Vec<u8>, FileMetadata, bool), CryptoImgError> {
    validation::password(password)?;
    validation::envelope_header(envelope_bytes)?;

    report(&mut progress, 0, Phase::Decrypting);
    let (bytes, metadata) = crypto::decrypt(envelope_bytes, password)?;
    report(&mut progress, 100, Phase::Decrypting);

    let is_archive = metadata.filename.ends_with(".farc")
        || metadata.mime_type == ARCHIVE_MIME_TYPE
        || archive::looks_like_archive(&bytes);

    Ok((bytes, metadata, is_archive))
}

/// Validates the candidate image (PNG mime/extension, size cap), then
/// decodes it: PNG → Base64 → envelope → [`decrypt_envelope`].
#[instrument(skip(png_bytes, password, progress), fields(len = png_bytes.len()))]
pub fn decrypt_image(
    name: &str,
    mime_type: &str,
    png_bytes: &[u8],
    password: &str,
    mut progress: impl FnMut(u8, Phase),
) -> Result<(Vec<u8>, FileMetadata, bool), CryptoImgError> {
    validation::image_for_decryption(ImageForDecryption {
        mime_type,
        name,
        size: png_bytes.len() as u64,
    })?;

    report(&mut progress, 0, Phase::Decoding);
    let base64_str = image::decode_from_png(png_bytes)?;
    report(&mut progress, 100, Phase::Decoding);

    decrypt_base64(&base64_str, password, progress)
}

/// Base64-decode → envelope → [`decrypt_envelope`].
#[instrument(skip(text, password, progress), fields(len = text.len()))]
pub fn decrypt_base64(
    text: &str,
    password: &str,
    progress: impl FnMut(u8, Phase),
) -> Result<(Vec<u8>, FileMetadata, bool), CryptoImgError> {
    validation::base64(text)?;
    let envelope_bytes = BASE64.decode(text.as_bytes()).map_err(|_| CryptoImgError::CorruptedImage)?;
    decrypt_envelope(&envelope_bytes, password, progress)
}

/// Unarchive a decrypted payload once the caller has confirmed `is_archive`.
#[instrument(skip(bytes, progress), fields(len = bytes.len()))]
pub fn unarchive(bytes: &[u8], mut progress: impl FnMut(u8, Phase)) -> Result<Vec<ArchiveEntry>, CryptoImgError> {
    report(&mut progress, 0, Phase::Unarchiving);
    let entries = archive::unpack(bytes)?;
    report(&mut progress, 100, Phase::Unarchiving);
    Ok(entries)
}

/// What to encrypt, at the caller-interface level.
pub enum EncryptInput {
    Files(Vec<ArchiveInput>),
    Text(String),
}

/// The raw envelope plus whichever optional transports the caller asked for.
pub struct EncryptOutput {
    pub envelope: Vec<u8>,
    pub base64: Option<String>,
    pub png: Option<Vec<u8>>,
}

/// The full encrypt side, optionally layering Base64 and PNG transports on
/// top of the raw envelope.
#[instrument(skip(buffer, input, password, progress))]
pub fn encrypt(
    buffer: &BufferManager,
    input: EncryptInput,
    password: &str,
    created_at: i64,
    want_base64: bool,
    want_image: bool,
    mut progress: impl FnMut(u8, Phase),
) -> Result<EncryptOutput, CryptoImgError> {
    let envelope = match input {
        EncryptInput::Files(files) => encrypt_files(buffer, &files, password, created_at, &mut progress)?,
        EncryptInput::Text(text) => encrypt_text(buffer, &text, password, created_at, &mut progress)?,
    };

    let rendered_base64 = if want_base64 || want_image {
        report(&mut progress, 0, Phase::Base64Encoding);
        let s = BASE64.encode(&envelope);
        report(&mut progress, 100, Phase::Base64Encoding);
        Some(s)
    } else {
        None
    };

    let png = if want_image {
        report(&mut progress, 0, Phase::Rendering);
        let base64_ref = rendered_base64.as_deref().ok_or(CryptoImgError::ProcessingError)?;
        let bytes = image::encode_to_png(base64_ref)?;
        report(&mut progress, 100, Phase::Rendering);
        Some(bytes)
    } else {
        None
    };

    Ok(EncryptOutput {
        envelope,
        base64: if want_base64 { rendered_base64 } else { None },
        png,
    })
}

/// What to decrypt, at the caller-interface level. The `Png` variant carries
/// the candidate's real filename and mime type so [`decrypt_image`] can run
/// its pre-flight checks on values independent of how the caller happened
/// to route the input here.
pub enum DecryptInput {
    Envelope(Vec<u8>),
    Base64(String),
    Png { name: String, mime_type: String, bytes: Vec<u8> },
}

/// The recovered payload, its metadata, and — if it was an archive —
/// the unpacked entries.
pub struct DecryptOutput {
    pub bytes: Vec<u8>,
    pub metadata: FileMetadata,
    pub is_archive: bool,
    pub entries: Option<Vec<ArchiveEntry>>,
}

/// The full decrypt side, dispatching on transport and unarchiving when the
/// payload is one.
#[instrument(skip(input, password, progress))]
pub fn decrypt(
    input: DecryptInput,
    password: &str,
    mut progress: impl FnMut(u8, Phase),
) -> Result<DecryptOutput, CryptoImgError> {
    let (bytes, metadata, is_archive) = match input {
        DecryptInput::Envelope(envelope) => decrypt_envelope(&envelope, password, &mut progress)?,
        DecryptInput::Base64(text) => decrypt_base64(&text, password, &mut progress)?,
        DecryptInput::Png { name, mime_type, bytes } => {
            decrypt_image(&name, &mime_type, &bytes, password, &mut progress)?
        }
    };

    let entries = if is_archive { Some(unarchive(&bytes, &mut progress)?) } else { None };

    Ok(DecryptOutput { bytes, metadata, is_archive, entries })
}

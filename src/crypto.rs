//! Frames an encrypted envelope from plaintext + password + metadata, and
//! reverses the process: derive key, draw a fresh nonce, seal, frame on the
//! wire; parse the wire, derive the same key, open, split metadata back out.

use tracing::instrument;
use zeroize::Zeroizing;

use crate::aead;
use crate::error::CryptoImgError;
use crate::kdf;
use crate::metadata::{self, FileMetadata};
use crate::wire::{self, NONCE_BYTES, SALT_BYTES};

/// Encrypt `plaintext` under `password`, embedding `metadata` ahead of it.
///
/// Draws a fresh salt and nonce from the OS CSPRNG for every call, so two
/// calls with identical inputs produce distinct envelopes.
#[instrument(skip(plaintext, password), fields(plaintext_len = plaintext.len()))]
pub fn encrypt(
    plaintext: &[u8],
    password: &str,
    metadata: &FileMetadata,
) -> Result<Vec<u8>, CryptoImgError> {
    let salt: [u8; SALT_BYTES] = aead::salt()?;
    let nonce: [u8; NONCE_BYTES] = aead::nonce()?;

    let key = kdf::derive_key(wire::VERSION_1, password, &salt)?;
    let block: Zeroizing<Vec<u8>> = Zeroizing::new(metadata::encode_block(metadata, plaintext)?);

    let ciphertext = aead::seal(&key, &nonce, &block)?;
    Ok(wire::encode_wire(&salt, &nonce, &ciphertext))
}

/// Decrypt `envelope` with `password`, returning the recovered plaintext and
/// its embedded metadata.
///
/// A wrong password and a tampered envelope are deliberately
/// indistinguishable: both surface as [`CryptoImgError::InvalidPassword`].
#[instrument(skip(envelope, password), fields(envelope_len = envelope.len()))]
pub fn decrypt(envelope: &[u8], password: &str) -> Result<(Vec<u8>, FileMetadata), CryptoImgError> {
    let parts = wire::decode_wire(envelope)?;
    let key = kdf::derive_key(parts.version, password, parts.salt)?;

    let block: Zeroizing<Vec<u8>> =
        Zeroizing::new(aead::open(&key, parts.nonce, parts.aead_ciphertext)?);

    let (file_metadata, rest) = metadata::decode_block(&block)?;
    Ok((rest.to_vec(), file_metadata))
}

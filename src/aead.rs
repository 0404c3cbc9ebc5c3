//! AEAD: AES-256-GCM, no associated data in v1.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;

use crate::error::CryptoImgError;
use crate::wire::NONCE_BYTES;

/// Generate a random 12-byte nonce from the OS CSPRNG. Used once per
/// encryption; reuse across encryptions under the same key is a correctness
/// bug.
pub fn nonce() -> Result<[u8; NONCE_BYTES], CryptoImgError> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n).map_err(|_| CryptoImgError::ProcessingError)?;
    Ok(n)
}

/// Generate a random 16-byte salt from the OS CSPRNG.
pub fn salt() -> Result<[u8; 16], CryptoImgError> {
    let mut s = [0u8; 16];
    getrandom(&mut s).map_err(|_| CryptoImgError::ProcessingError)?;
    Ok(s)
}

/// Seal `plaintext` under `key`/`nonce` with no AAD. Returns ciphertext with
/// the 16-byte authentication tag appended.
pub fn seal(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_BYTES],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoImgError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoImgError::ProcessingError)?;
    let n = Nonce::from_slice(nonce_bytes);
    cipher.encrypt(n, plaintext).map_err(|_| CryptoImgError::ProcessingError)
}

/// Open `ciphertext` (with trailing tag) under `key`/`nonce`. Any failure —
/// wrong key, tampered bytes, or a malformed tag — collapses to
/// [`CryptoImgError::InvalidPassword`]; a wrong password and a tampered
/// ciphertext are deliberately indistinguishable.
pub fn open(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoImgError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoImgError::InvalidPassword)?;
    let n = Nonce::from_slice(nonce_bytes);
    cipher.decrypt(n, ciphertext).map_err(|_| CryptoImgError::InvalidPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open_round_trips() {
        let key = [5u8; 32];
        let n = [1u8; NONCE_BYTES];
        let ct = seal(&key, &n, b"hello").unwrap();
        let pt = open(&key, &n, &ct).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn empty_plaintext_ciphertext_is_exactly_one_tag() {
        let key = [5u8; 32];
        let n = [1u8; NONCE_BYTES];
        let ct = seal(&key, &n, b"").unwrap();
        assert_eq!(ct.len(), 16);
    }

    #[test]
    fn tampered_ciphertext_fails_as_invalid_password() {
        let key = [5u8; 32];
        let n = [1u8; NONCE_BYTES];
        let mut ct = seal(&key, &n, b"hello").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert_eq!(open(&key, &n, &ct), Err(CryptoImgError::InvalidPassword));
    }

    #[test]
    fn wrong_key_fails_as_invalid_password() {
        let key = [5u8; 32];
        let wrong_key = [6u8; 32];
        let n = [1u8; NONCE_BYTES];
        let ct = seal(&key, &n, b"hello").unwrap();
        assert_eq!(open(&wrong_key, &n, &ct), Err(CryptoImgError::InvalidPassword));
    }

    #[test]
    fn two_seals_of_same_plaintext_differ_with_fresh_nonces() {
        let key = [5u8; 32];
        let ct_a = seal(&key, &nonce().unwrap(), b"same").unwrap();
        let ct_b = seal(&key, &nonce().unwrap(), b"same").unwrap();
        assert_ne!(ct_a, ct_b);
    }
}

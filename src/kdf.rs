//! Password-based key derivation, keyed by envelope version.
//!
//! v1: PBKDF2-HMAC-SHA256, 100,000 iterations, 32-byte output.

use pbkdf2::pbkdf2_hmac_array;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::wire::SALT_BYTES;

pub const V1_ITERATIONS: u32 = 100_000;
pub const KEY_BYTES: usize = 32;

/// Derive a 256-bit key from `password` and `salt` using the KDF parameters
/// bound to `version`. Returns [`crate::error::CryptoImgError::UnrecognizedFormat`]
/// for any version this crate doesn't know how to derive.
pub fn derive_key(
    version: u8,
    password: &str,
    salt: &[u8; SALT_BYTES],
) -> Result<Zeroizing<[u8; KEY_BYTES]>, crate::error::CryptoImgError> {
    match version {
        crate::wire::VERSION_1 => {
            let key = pbkdf2_hmac_array::<Sha256, KEY_BYTES>(
                password.as_bytes(),
                salt,
                V1_ITERATIONS,
            );
            Ok(Zeroizing::new(key))
        }
        _ => Err(crate::error::CryptoImgError::UnrecognizedFormat),
    }
}

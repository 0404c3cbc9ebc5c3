use encimg::{pipeline, BufferManager, CryptoImgError};
use proptest::prelude::*;

fn no_progress(_: u8, _: encimg::Phase) {}

proptest! {
    #[test]
    fn roundtrip_arbitrary_text_and_password(
        text in ".{0,512}",
        password in "\\PC{1,64}",
    ) {
        // Policy rejects a password that is blank after trimming; skip those
        // draws rather than asserting a failure mode this property isn't
        // about.
        prop_assume!(!password.trim().is_empty());

        let buffer = BufferManager::default();
        let envelope = pipeline::encrypt_text(&buffer, &text, &password, 0, no_progress).unwrap();
        let (pt, metadata, is_archive) = pipeline::decrypt_envelope(&envelope, &password, no_progress).unwrap();

        prop_assert_eq!(pt, text.as_bytes());
        prop_assert_eq!(metadata.filename, "encrypted_text.txt");
        prop_assert!(!is_archive);
        prop_assert_eq!(buffer.memory_usage().current, 0);
    }

    #[test]
    fn wrong_password_never_recovers_the_plaintext(
        text in ".{1,256}",
        password in "\\PC{1,32}",
        wrong in "\\PC{1,32}",
    ) {
        prop_assume!(!password.trim().is_empty());
        prop_assume!(!wrong.trim().is_empty());
        prop_assume!(password != wrong);

        let buffer = BufferManager::default();
        let envelope = pipeline::encrypt_text(&buffer, &text, &password, 0, no_progress).unwrap();
        let result = pipeline::decrypt_envelope(&envelope, &wrong, no_progress);

        prop_assert_eq!(result.unwrap_err(), CryptoImgError::InvalidPassword);
    }

    #[test]
    fn single_bit_flip_anywhere_in_the_ciphertext_fails_closed(
        text in ".{1,256}",
        flip_byte in 0usize..512,
        flip_bit in 0u8..8,
    ) {
        let buffer = BufferManager::default();
        let password = "correct horse battery staple";
        let mut envelope = pipeline::encrypt_text(&buffer, &text, password, 0, no_progress).unwrap();

        let idx = flip_byte % envelope.len();
        envelope[idx] ^= 1 << flip_bit;

        let result = pipeline::decrypt_envelope(&envelope, password, no_progress);
        prop_assert!(result.is_err());
    }
}

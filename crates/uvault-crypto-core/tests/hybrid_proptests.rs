#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for the `uv:` hybrid cipher.

use proptest::prelude::*;
use uvault_crypto_core::codec::BlobFrame;
use uvault_crypto_core::error::CryptoError;
use uvault_crypto_core::hybrid::{decrypt, encrypt, EncryptedBlob};
use uvault_crypto_core::keypair::{generate_keypair, KeyPair};

fn recipient() -> KeyPair {
    generate_keypair().expect("keygen should succeed")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Encrypt→decrypt recovers the original message for any length.
    #[test]
    fn encrypt_decrypt_roundtrip(
        message in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let kp = recipient();
        let blob = encrypt(&message, &kp.public).expect("encrypt should succeed");
        let plain = decrypt(&blob, &kp.private).expect("decrypt should succeed");
        prop_assert_eq!(plain.expose(), message.as_slice());
    }

    /// Re-encrypting the same message never repeats a blob.
    #[test]
    fn encryption_is_randomized(
        message in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let kp = recipient();
        let a = encrypt(&message, &kp.public).expect("encrypt should succeed");
        let b = encrypt(&message, &kp.public).expect("encrypt should succeed");
        prop_assert_ne!(a, b);
    }

    /// Flipping any single decoded byte makes decryption fail with
    /// `Decryption`, whichever region (point, iv, ciphertext, tag) it lands in.
    #[test]
    fn single_byte_tamper_is_detected(
        message in proptest::collection::vec(any::<u8>(), 0..128),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let kp = recipient();
        let blob = encrypt(&message, &kp.public).expect("encrypt should succeed");
        let frame = BlobFrame::decode(blob.as_str()).expect("frame should parse");

        let mut raw = Vec::new();
        raw.extend_from_slice(&frame.ephemeral_public);
        raw.extend_from_slice(&frame.iv);
        raw.extend_from_slice(&frame.ciphertext);
        let at = index.index(raw.len());
        raw[at] ^= mask;

        let (point, rest) = raw.split_at(65);
        let (iv, ciphertext) = rest.split_at(12);
        let tampered = BlobFrame {
            ephemeral_public: point.try_into().unwrap(),
            iv: iv.try_into().unwrap(),
            ciphertext: ciphertext.to_vec(),
        };
        let forged: EncryptedBlob = tampered.encode().parse().expect("framing survives tamper");

        prop_assert!(matches!(decrypt(&forged, &kp.private), Err(CryptoError::Decryption)));
    }
}

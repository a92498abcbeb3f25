//! Known-answer tests for the primitives under the wrap and hybrid layers.
//!
//! - PBKDF2-HMAC-SHA256: RFC 7914 §11
//! - AES-256-GCM: NIST SP 800-38D (GCMEncryptExtIV256.rsp), test cases 13 and 14

use std::num::NonZeroU32;

use data_encoding::HEXLOWER;
use ring::pbkdf2;
use uvault_crypto_core::kdf::{derive, Pbkdf2Params, KEY_LEN, SALT_LEN};
use uvault_crypto_core::symmetric::{open, seal, NONCE_LEN};

fn hex(s: &str) -> Vec<u8> {
    HEXLOWER.decode(s.as_bytes()).expect("valid hex")
}

/// RFC 7914 §11, first PBKDF2-HMAC-SHA256 vector, truncated to 32 bytes.
///
/// P = "passwd", S = "salt", c = 1
#[test]
fn rfc7914_pbkdf2_sha256_c1() {
    let mut out = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(1).expect("non-zero"),
        b"salt",
        b"passwd",
        &mut out,
    );
    assert_eq!(
        out.to_vec(),
        hex("55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc")
    );
}

/// `kdf::derive` is plain PBKDF2-HMAC-SHA256 with no extra framing.
#[test]
fn derive_matches_raw_pbkdf2() {
    let salt = [0x5A; SALT_LEN];
    let params = Pbkdf2Params::new(2_048);

    let mut expected = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(params.iterations).expect("non-zero"),
        &salt,
        b"correct-horse",
        &mut expected,
    );

    let derived = derive(b"correct-horse", &salt, &params).expect("derive should succeed");
    assert_eq!(derived.expose(), &expected);
}

/// NIST SP 800-38D Test Case 13: zero key, zero iv, empty plaintext.
///
/// Tag: 530f8afbc74536b9a963b4f1c4cb738b
#[test]
fn nist_test_case_13_empty_plaintext() {
    let sealed = seal(&[], &[0u8; 32], &[0u8; NONCE_LEN]).expect("seal should succeed");
    assert_eq!(sealed, hex("530f8afbc74536b9a963b4f1c4cb738b"));
}

/// NIST SP 800-38D Test Case 14: zero key, zero iv, 16 zero bytes.
///
/// CT:  cea7403d4d606b6e074ec5d3baf39d18
/// Tag: d0d1c8a799996bf0265b98b5d48ab919
#[test]
fn nist_test_case_14_aes256_gcm() {
    let sealed = seal(&[0u8; 16], &[0u8; 32], &[0u8; NONCE_LEN]).expect("seal should succeed");
    assert_eq!(
        sealed,
        hex("cea7403d4d606b6e074ec5d3baf39d18d0d1c8a799996bf0265b98b5d48ab919")
    );

    let opened = open(&sealed, &[0u8; 32], &[0u8; NONCE_LEN]).expect("open should succeed");
    assert_eq!(opened.expose(), &[0u8; 16]);
}

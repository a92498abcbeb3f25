//! Hybrid public-key encryption: ephemeral-static P-256 ECDH + AES-256-GCM.
//!
//! This module provides:
//! - [`encrypt`]: seal a message to a recipient's public key
//! - [`decrypt`]: open an [`EncryptedBlob`] with the recipient's private key
//! - [`encrypt_text`] / [`decrypt_text`]: UTF-8 convenience wrappers for form fields
//! - [`is_encrypted`]: cheap prefix test for stored field values
//!
//! # Construction
//!
//! 1. Generate a one-shot ephemeral key pair.
//! 2. ECDH(ephemeral private, recipient public) → 32-byte X coordinate.
//! 3. That coordinate is the AES-256-GCM key as-is. There is no HKDF step;
//!    this matches WebCrypto `deriveKey(ECDH → AES-GCM-256)` and is part of
//!    the `uv:` wire format.
//! 4. Random 12-byte iv, seal, frame as `uv:` + base64(point ‖ iv ‖ ct+tag).
//!
//! The ephemeral private key is dropped (and wiped) before `encrypt` returns.

use std::fmt;
use std::str::FromStr;

use crate::codec::{BlobFrame, BLOB_PREFIX};
use crate::error::{CryptoError, FormatError};
use crate::keypair::{generate_keypair, PrivateKey, PublicKey};
use crate::memory::SecretBuffer;
use crate::symmetric;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A well-framed `uv:` wire value.
///
/// Construction through [`FromStr`] or serde checks the framing only; the
/// authenticity of the contents is established by [`decrypt`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EncryptedBlob {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlobFrame::decode(s)?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for EncryptedBlob {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BlobFrame::decode(&value)?;
        Ok(Self(value))
    }
}

impl From<EncryptedBlob> for String {
    fn from(blob: EncryptedBlob) -> Self {
        blob.0
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Encrypt `message` (any length, including empty) to `recipient`.
///
/// Two calls with identical inputs produce different blobs.
///
/// # Errors
///
/// Returns `CryptoError::KeyGeneration` if the ephemeral key or iv cannot be
/// drawn, or `CryptoError::Encryption` if sealing fails.
pub fn encrypt(message: &[u8], recipient: &PublicKey) -> Result<EncryptedBlob, CryptoError> {
    let ephemeral = generate_keypair()?;
    let key = ephemeral.private.diffie_hellman(recipient)?;
    let iv = symmetric::random_nonce()?;
    let ciphertext = symmetric::seal(message, key.expose(), &iv)?;

    let frame = BlobFrame {
        ephemeral_public: ephemeral.public.to_sec1_bytes(),
        iv,
        ciphertext,
    };
    Ok(EncryptedBlob(frame.encode()))
}

/// Decrypt `blob` with the recipient's private key.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if the ephemeral region is not a valid
/// P-256 point, or on any tag failure (wrong key, tampered blob).
pub fn decrypt(blob: &EncryptedBlob, private: &PrivateKey) -> Result<SecretBuffer, CryptoError> {
    let frame = BlobFrame::decode(blob.as_str())?;
    let ephemeral =
        PublicKey::from_sec1_bytes(&frame.ephemeral_public).map_err(|_| CryptoError::Decryption)?;
    let key = private.diffie_hellman(&ephemeral)?;
    symmetric::open(&frame.ciphertext, key.expose(), &frame.iv)
}

/// Encrypt a UTF-8 text value.
///
/// # Errors
///
/// Same as [`encrypt`].
pub fn encrypt_text(text: &str, recipient: &PublicKey) -> Result<EncryptedBlob, CryptoError> {
    encrypt(text.as_bytes(), recipient)
}

/// Decrypt a blob produced by [`encrypt_text`].
///
/// The returned text is wiped when dropped.
///
/// # Errors
///
/// Same as [`decrypt`], plus `FormatError::InvalidUtf8` if the authentic
/// plaintext is not UTF-8.
pub fn decrypt_text(
    blob: &EncryptedBlob,
    private: &PrivateKey,
) -> Result<Zeroizing<String>, CryptoError> {
    let plaintext = decrypt(blob, private)?;
    std::str::from_utf8(plaintext.expose())
        .map(|text| Zeroizing::new(text.to_owned()))
        .map_err(|_| FormatError::InvalidUtf8.into())
}

/// Whether a stored value carries the `uv:` tag. Does not validate framing.
#[must_use]
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(BLOB_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_base64;

    #[test]
    fn roundtrip_short_message() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"meet at noon", &kp.public).expect("encrypt");
        let plain = decrypt(&blob, &kp.private).expect("decrypt");
        assert_eq!(plain.expose(), b"meet at noon");
    }

    #[test]
    fn roundtrip_empty_message() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(&[], &kp.public).expect("encrypt");
        assert!(decrypt(&blob, &kp.private).expect("decrypt").is_empty());
    }

    #[test]
    fn blob_starts_with_prefix() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"x", &kp.public).expect("encrypt");
        assert!(blob.as_str().starts_with("uv:"));
        assert!(is_encrypted(blob.as_str()));
        assert!(!is_encrypted("plain notes"));
    }

    #[test]
    fn same_input_encrypts_differently() {
        let kp = generate_keypair().expect("keygen should succeed");
        let a = encrypt(b"same", &kp.public).expect("encrypt");
        let b = encrypt(b"same", &kp.public).expect("encrypt");
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_private_key_fails() {
        let alice = generate_keypair().expect("keygen should succeed");
        let mallory = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"for alice", &alice.public).expect("encrypt");
        assert!(matches!(
            decrypt(&blob, &mallory.private),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn invalid_ephemeral_point_is_a_decryption_error() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"x", &kp.public).expect("encrypt");
        let mut frame = BlobFrame::decode(blob.as_str()).expect("frame");
        frame.ephemeral_public[0] = 0x05;
        let forged: EncryptedBlob = frame.encode().parse().expect("still well framed");
        assert!(matches!(
            decrypt(&forged, &kp.private),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn parse_rejects_unprefixed_value() {
        let raw = encode_base64(&[0u8; 100]);
        assert_eq!(
            raw.parse::<EncryptedBlob>(),
            Err(FormatError::MissingBlobPrefix)
        );
    }

    #[test]
    fn text_roundtrip() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt_text("VIN: 1HGCM82633A004352", &kp.public).expect("encrypt");
        let text: Zeroizing<String> = decrypt_text(&blob, &kp.private).expect("decrypt");
        assert_eq!(text.as_str(), "VIN: 1HGCM82633A004352");
    }

    #[test]
    fn blob_converts_back_into_its_wire_string() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"x", &kp.public).expect("encrypt");
        let wire = blob.to_string();
        assert_eq!(String::from(blob), wire);
    }

    #[test]
    fn decrypt_text_rejects_non_utf8() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(&[0xFF, 0xFE], &kp.public).expect("encrypt");
        assert!(matches!(
            decrypt_text(&blob, &kp.private),
            Err(CryptoError::Format(FormatError::InvalidUtf8))
        ));
    }

    #[test]
    fn blob_serde_validates_framing() {
        let kp = generate_keypair().expect("keygen should succeed");
        let blob = encrypt(b"x", &kp.public).expect("encrypt");
        let json = serde_json::to_string(&blob).expect("serialize");
        let back: EncryptedBlob = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, blob);
        assert!(serde_json::from_str::<EncryptedBlob>("\"uv:AAAA\"").is_err());
    }
}

//! Password wrapping of the private key.
//!
//! This module provides:
//! - [`wrap_private_key`]: seal a private key's PKCS8 bytes under a password
//! - [`unwrap_private_key`]: recover the private key from [`WrappedKeyMaterial`]
//!
//! # Key Hierarchy
//!
//! ```text
//! password + salt ──PBKDF2-SHA256──► KEK ──AES-256-GCM(iv)──► PKCS8(private key)
//! ```
//!
//! Salt and iv are fresh on every wrap, so wrapping the same key twice under
//! the same password yields unrelated ciphertexts. A wrong password and a
//! tampered ciphertext both fail the tag check and are indistinguishable.

use crate::error::CryptoError;
use crate::kdf::{self, Pbkdf2Params, SALT_LEN};
use crate::keypair::PrivateKey;
use crate::symmetric::{self, NONCE_LEN};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Output of one wrap operation. Valid only with the exact password, salt,
/// and iv it was produced with.
#[must_use = "wrapped key material must be persisted or the private key is lost"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyMaterial {
    /// PKCS8 ciphertext followed by the 16-byte GCM tag.
    pub ciphertext: Vec<u8>,
    /// PBKDF2 salt.
    pub salt: [u8; SALT_LEN],
    /// AES-GCM nonce.
    pub iv: [u8; NONCE_LEN],
}

/// Wrap `key` under `password`.
///
/// # Errors
///
/// - `CryptoError::KeyGeneration` if salt or iv cannot be drawn
/// - `CryptoError::KeyDerivation` for invalid `params`
/// - `CryptoError::Encryption` if sealing fails
pub fn wrap_private_key(
    key: &PrivateKey,
    password: &[u8],
    params: &Pbkdf2Params,
) -> Result<WrappedKeyMaterial, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::KeyGeneration(format!("CSPRNG fill failed: {e}")))?;
    let iv = symmetric::random_nonce()?;

    let kek = kdf::derive(password, &salt, params)?;
    let pkcs8 = key.to_pkcs8_der()?;
    let ciphertext = symmetric::seal(pkcs8.expose(), kek.expose(), &iv)?;

    Ok(WrappedKeyMaterial {
        ciphertext,
        salt,
        iv,
    })
}

/// Re-derive the KEK from `password` and recover the private key.
///
/// `params` must match the ones used at wrap time.
///
/// # Errors
///
/// - `CryptoError::Decryption` on a wrong password or tampered material
/// - `CryptoError::InvalidKeyMaterial` if authentic bytes are not a P-256 PKCS8 key
/// - `CryptoError::KeyDerivation` for invalid `params`
pub fn unwrap_private_key(
    wrapped: &WrappedKeyMaterial,
    password: &[u8],
    params: &Pbkdf2Params,
) -> Result<PrivateKey, CryptoError> {
    let kek = kdf::derive(password, &wrapped.salt, params)?;
    let pkcs8 = symmetric::open(&wrapped.ciphertext, kek.expose(), &wrapped.iv)?;
    PrivateKey::from_pkcs8_der(pkcs8.expose())
}

//! AES-256-GCM sealing shared by the key wrapper and the hybrid cipher.
//!
//! Output layout is `ciphertext || tag` with the nonce carried separately,
//! matching what WebCrypto's `AES-GCM` produces. No associated data is bound.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use zeroize::Zeroize;

/// AES-256-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Draw a fresh random nonce from the OS CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::KeyGeneration` if the CSPRNG is unavailable.
pub fn random_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::KeyGeneration(format!("CSPRNG fill failed: {e}")))?;
    Ok(nonce)
}

fn less_safe_key(key: &[u8; KEY_LEN]) -> Result<aead::LessSafeKey, CryptoError> {
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt `plaintext`, returning `ciphertext || tag`.
///
/// The nonce must never be reused with the same key.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the underlying seal fails.
pub fn seal(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let key = less_safe_key(key)?;
    let nonce = aead::Nonce::assume_unique_for_key(*nonce);

    let mut in_out = Vec::with_capacity(plaintext.len().saturating_add(TAG_LEN));
    in_out.extend_from_slice(plaintext);
    if key
        .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
        .is_err()
    {
        in_out.zeroize();
        return Err(CryptoError::Encryption(
            "AES-256-GCM encryption failed".into(),
        ));
    }
    Ok(in_out)
}

/// Authenticate and decrypt `ciphertext || tag`.
///
/// Tag comparison is constant-time (performed inside `ring`).
///
/// # Errors
///
/// Returns `CryptoError::Decryption` on any authentication failure, including
/// input shorter than the tag.
pub fn open(
    sealed: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<SecretBuffer, CryptoError> {
    let key = less_safe_key(key)?;
    let nonce = aead::Nonce::assume_unique_for_key(*nonce);

    let mut in_out = sealed.to_vec();
    let plaintext_len = match key.open_in_place(nonce, aead::Aad::empty(), &mut in_out) {
        Ok(plaintext) => plaintext.len(),
        Err(_) => {
            in_out.zeroize();
            return Err(CryptoError::Decryption);
        }
    };
    in_out.truncate(plaintext_len);
    Ok(SecretBuffer::from_vec(in_out))
}

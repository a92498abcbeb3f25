//! PBKDF2-HMAC-SHA256 password key derivation.
//!
//! This module provides:
//! - [`derive`]: derive a 256-bit key-encryption key from a password + salt
//! - [`Pbkdf2Params`]: the iteration count, carried alongside wrapped keys
//!
//! The derived key is never persisted. Callers use it for exactly one
//! AES-256-GCM operation and let it drop.

use std::num::NonZeroU32;

use crate::error::CryptoError;
use crate::memory::SecretBytes;
use ring::pbkdf2;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Output length of the KDF in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Salt length produced by the key wrapper. Shorter salts are rejected.
pub const SALT_LEN: usize = 16;

/// Work factor used by every payload that does not state its own.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// PBKDF2 parameter set. The hash is fixed to HMAC-SHA256.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pbkdf2Params {
    /// Number of HMAC iterations. Must be non-zero.
    pub iterations: u32,
}

impl Pbkdf2Params {
    #[must_use]
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// `true` when these are the legacy defaults (100,000 iterations).
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.iterations == DEFAULT_ITERATIONS
    }
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

// ---------------------------------------------------------------------------
// Core KDF
// ---------------------------------------------------------------------------

/// Derive a 256-bit key from `password` and `salt`.
///
/// Deterministic: the same inputs always yield the same key. Any password,
/// including the empty one, is accepted; strength policy belongs to callers.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` if the salt is shorter than 16 bytes
/// or the iteration count is zero.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    params: &Pbkdf2Params,
) -> Result<SecretBytes<KEY_LEN>, CryptoError> {
    if salt.len() < SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {SALT_LEN})",
            salt.len()
        )));
    }
    let iterations = NonZeroU32::new(params.iterations)
        .ok_or_else(|| CryptoError::KeyDerivation("iteration count must be non-zero".into()))?;

    let mut output = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password,
        &mut output,
    );

    let key = SecretBytes::new(output);
    output.zeroize();
    Ok(key)
}

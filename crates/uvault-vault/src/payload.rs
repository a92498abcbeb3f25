//! Transport payload: the JSON object a vault hands to external storage.
//!
//! ```text
//! {
//!   "public_key_pem":      "-----BEGIN PUBLIC KEY-----\n...",
//!   "wrapped_private_key": base64(PKCS8 ciphertext ‖ tag),
//!   "salt":                base64(16 bytes),
//!   "iv":                  base64(12 bytes),
//!   "kdf_iterations":      number   // only when not 100,000
//! }
//! ```
//!
//! A payload produced with default KDF parameters is byte-identical to one
//! without the `kdf_iterations` field, and a missing field reads as 100,000.
//! Declared counts outside [`ACCEPTED_KDF_ITERATIONS`] are rejected before
//! any key derivation runs.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uvault_crypto_core::codec::{decode_base64, encode_base64};
use uvault_crypto_core::kdf::{Pbkdf2Params, DEFAULT_ITERATIONS, SALT_LEN};
use uvault_crypto_core::keypair::PublicKey;
use uvault_crypto_core::symmetric::NONCE_LEN;
use uvault_crypto_core::wrap::WrappedKeyMaterial;
use uvault_crypto_core::{CryptoError, FormatError};

/// Upper bound on a PBKDF2 iteration count, declared or configured.
pub const MAX_KDF_ITERATIONS: u32 = 1_000_000;

/// Iteration counts a payload may declare and a config may request.
pub const ACCEPTED_KDF_ITERATIONS: RangeInclusive<u32> = DEFAULT_ITERATIONS..=MAX_KDF_ITERATIONS;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Serialized vault key material. All fields are plain strings so the
/// payload can be stored by any JSON-capable backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub public_key_pem: String,
    pub wrapped_private_key: String,
    pub salt: String,
    pub iv: String,
    /// PBKDF2 iteration count, present only when it differs from the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_iterations: Option<u32>,
}

/// Typed contents of an [`ExportPayload`].
#[derive(Debug, Clone)]
pub struct DecodedPayload {
    pub public_key: PublicKey,
    pub wrapped: WrappedKeyMaterial,
    pub params: Pbkdf2Params,
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

impl ExportPayload {
    /// Assemble a payload from a public key and freshly wrapped material.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyMaterial` if the public key cannot be
    /// SPKI-encoded.
    pub fn from_parts(
        public_key: &PublicKey,
        wrapped: &WrappedKeyMaterial,
        params: &Pbkdf2Params,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            public_key_pem: public_key.to_pem()?,
            wrapped_private_key: encode_base64(&wrapped.ciphertext),
            salt: encode_base64(&wrapped.salt),
            iv: encode_base64(&wrapped.iv),
            kdf_iterations: (!params.is_default()).then_some(params.iterations),
        })
    }

    /// KDF parameters this payload was wrapped with.
    #[must_use]
    pub fn params(&self) -> Pbkdf2Params {
        self.kdf_iterations
            .map_or_else(Pbkdf2Params::default, Pbkdf2Params::new)
    }

    /// Decode every field into typed parts.
    ///
    /// # Errors
    ///
    /// - `CryptoError::Format` for bad PEM, bad base64, a salt/iv of the
    ///   wrong length, or an iteration count outside
    ///   [`ACCEPTED_KDF_ITERATIONS`]
    /// - `CryptoError::InvalidKeyMaterial` if the PEM body is not a P-256 SPKI
    pub fn decode(&self) -> Result<DecodedPayload, CryptoError> {
        self.decode_in(&ACCEPTED_KDF_ITERATIONS)
    }

    /// [`Self::decode`] with an explicit accepted iteration range.
    ///
    /// # Errors
    ///
    /// Same as [`Self::decode`], with `allowed` in place of
    /// [`ACCEPTED_KDF_ITERATIONS`].
    pub fn decode_in(&self, allowed: &RangeInclusive<u32>) -> Result<DecodedPayload, CryptoError> {
        let params = self.params();
        if !allowed.contains(&params.iterations) {
            return Err(FormatError::KdfIterationsOutOfRange {
                iterations: params.iterations,
                min: *allowed.start(),
                max: *allowed.end(),
            }
            .into());
        }

        let public_key = PublicKey::from_pem(&self.public_key_pem)?;
        let ciphertext = decode_base64("wrapped_private_key", &self.wrapped_private_key)?;
        let salt: [u8; SALT_LEN] = fixed_length("salt", &self.salt)?;
        let iv: [u8; NONCE_LEN] = fixed_length("iv", &self.iv)?;

        Ok(DecodedPayload {
            public_key,
            wrapped: WrappedKeyMaterial {
                ciphertext,
                salt,
                iv,
            },
            params,
        })
    }

    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] if serialization fails.
    pub fn to_json(&self) -> Result<String, FormatError> {
        serde_json::to_string(self).map_err(|e| FormatError::InvalidJson(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`FormatError::InvalidJson`] for malformed JSON or missing fields.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        serde_json::from_str(json).map_err(|e| FormatError::InvalidJson(e.to_string()))
    }
}

fn fixed_length<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N], FormatError> {
    let bytes = decode_base64(field, text)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| FormatError::InvalidLength {
        field,
        expected: N,
        actual,
    })
}

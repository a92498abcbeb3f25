//! Cryptographic error types for `uvault-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PBKDF2 parameter validation failed (short salt, zero iterations).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// AES-256-GCM sealing failure.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication tag verification failed: ciphertext tampered or wrong key.
    #[error("decryption failed: authentication tag mismatch")]
    Decryption,

    /// Invalid key material (not a P-256 point, malformed SPKI/PKCS8).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Key pair or nonce generation failed (CSPRNG unavailable).
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Malformed transport encoding (base64, PEM, blob framing).
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Malformed input at the transport boundary.
///
/// Decoders return one of these instead of a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A field is not valid padded standard base64.
    #[error("invalid base64 in {field}")]
    InvalidBase64 {
        /// Name of the offending field.
        field: &'static str,
    },

    /// PEM text is missing the expected `BEGIN`/`END` lines.
    #[error("missing or mismatched PEM armor for {label}")]
    MissingPemArmor {
        /// Expected PEM label, e.g. `PUBLIC KEY`.
        label: &'static str,
    },

    /// A PEM body line exceeds 64 characters.
    #[error("PEM body line {line} is {len} characters (maximum 64)")]
    PemLineTooLong {
        /// 1-based line number within the body.
        line: usize,
        /// Observed line length.
        len: usize,
    },

    /// PEM armor present but the body is empty.
    #[error("PEM body is empty")]
    EmptyPemBody,

    /// Encrypted blob does not start with the `uv:` tag.
    #[error("encrypted blob is missing the format prefix")]
    MissingBlobPrefix,

    /// Encrypted blob is too short to hold ephemeral key, iv and tag.
    #[error("encrypted blob truncated: {len} bytes (minimum {min})")]
    TruncatedBlob {
        /// Decoded frame length.
        len: usize,
        /// Minimum valid frame length.
        min: usize,
    },

    /// Decoded field has the wrong byte length.
    #[error("{field} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Name of the offending field.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// Declared PBKDF2 iteration count falls outside the accepted range.
    #[error("kdf iterations {iterations} outside accepted range {min}..={max}")]
    KdfIterationsOutOfRange {
        /// Declared count.
        iterations: u32,
        /// Smallest accepted count.
        min: u32,
        /// Largest accepted count.
        max: u32,
    },

    /// Decrypted text field is not valid UTF-8.
    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8,

    /// Transport payload is not valid JSON for its schema.
    #[error("invalid payload JSON: {0}")]
    InvalidJson(String),
}

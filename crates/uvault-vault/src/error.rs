//! Vault error types for `uvault-vault`.

use thiserror::Error;
use uvault_crypto_core::{CryptoError, FormatError};

/// Errors produced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Operation requires a private key (or, for encryption, a public key)
    /// that the vault does not currently hold.
    #[error("vault is locked")]
    Locked,

    /// Wrong password, tampered wrapped key, or a public key that does not
    /// belong to the recovered private key. Deliberately undifferentiated.
    #[error("unlock failed")]
    UnlockFailed,

    /// A blob failed authentication under the held private key.
    #[error("decryption failed")]
    Decryption,

    /// Malformed base64, PEM, blob framing, or payload JSON.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Password change recovered the key but could not re-wrap it. The vault
    /// is Unlocked without wrapping metadata; retry with `Vault::wrap`.
    #[error("re-wrap under new password failed: {0}")]
    RewrapFailed(#[source] CryptoError),

    /// Fatal primitive failure (CSPRNG, key encoding).
    #[error(transparent)]
    Crypto(CryptoError),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Whether the caller may retry the failed step without re-authenticating.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RewrapFailed(_))
    }
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Format(format) => Self::Format(format),
            CryptoError::Decryption => Self::Decryption,
            other => Self::Crypto(other),
        }
    }
}

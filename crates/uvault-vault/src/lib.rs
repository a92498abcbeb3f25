//! `uvault-vault`: Vault state machine for uvault.
//!
//! Owns the lock/unlock lifecycle of a single P-256 key pair, the JSON
//! transport payload that carries the password-wrapped private key, and
//! the on-disk configuration. Cryptography is delegated to
//! `uvault-crypto-core`; persistence of the payload is left to the caller.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod payload;

pub use config::VaultConfig;
pub use error::VaultError;
pub use lifecycle::{Vault, VaultState};
pub use payload::{DecodedPayload, ExportPayload, ACCEPTED_KDF_ITERATIONS, MAX_KDF_ITERATIONS};
pub use uvault_crypto_core::hybrid::{is_encrypted, EncryptedBlob};

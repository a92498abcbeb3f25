//! `uvault-crypto-core`: Cryptographic primitives for uvault.
//!
//! P-256 key pairs, PBKDF2 password wrapping of the private key, and the
//! `uv:` hybrid encryption format (ephemeral ECDH + AES-256-GCM). Zero
//! network, zero async, zero filesystem access; state and persistence live
//! in `uvault-vault`.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod codec;
pub mod kdf;
pub mod symmetric;

pub mod keypair;

pub mod hybrid;
pub mod wrap;

pub use codec::{
    decode_base64, decode_pem, encode_base64, encode_pem, BlobFrame, PemLabel, BLOB_PREFIX,
    MIN_BLOB_LEN, PEM_LINE_WIDTH,
};
pub use error::{CryptoError, FormatError};
pub use hybrid::{decrypt, decrypt_text, encrypt, encrypt_text, is_encrypted, EncryptedBlob};
pub use kdf::{Pbkdf2Params, DEFAULT_ITERATIONS, SALT_LEN};
pub use keypair::{generate_keypair, KeyPair, PrivateKey, PublicKey, PUBLIC_KEY_LEN};
pub use memory::{SecretBuffer, SecretBytes};
pub use symmetric::{NONCE_LEN, TAG_LEN};
pub use wrap::{unwrap_private_key, wrap_private_key, WrappedKeyMaterial};

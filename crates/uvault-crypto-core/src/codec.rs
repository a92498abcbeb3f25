//! Transport encodings: base64, PEM armor, and the `uv:` blob frame.
//!
//! This module provides:
//! - [`encode_base64`] / [`decode_base64`]: RFC 4648 standard alphabet, padded, strict
//! - [`encode_pem`] / [`decode_pem`]: RFC 7468 armor with 64-character body lines
//! - [`BlobFrame`]: `uv:` + base64(ephemeral public key ‖ iv ‖ ciphertext+tag)
//!
//! Every decoder fails with a [`FormatError`] rather than returning partial data.
//!
//! # Blob Layout
//!
//! ```text
//! "uv:" base64( ephemeral P-256 point (65 B) | iv (12 B) | ciphertext + tag (≥ 16 B) )
//! ```
//!
//! Offsets are fixed for P-256 and AES-GCM. Changing either requires a new prefix.

use crate::error::FormatError;
use crate::keypair::PUBLIC_KEY_LEN;
use crate::symmetric::{NONCE_LEN, TAG_LEN};
use data_encoding::BASE64;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format/version tag that starts every encrypted blob.
pub const BLOB_PREFIX: &str = "uv:";

/// Maximum PEM body line length.
pub const PEM_LINE_WIDTH: usize = 64;

/// Smallest decodable frame: ephemeral key + iv + tag of an empty message.
pub const MIN_BLOB_LEN: usize = PUBLIC_KEY_LEN + NONCE_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// Base64
// ---------------------------------------------------------------------------

#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode padded standard base64. `field` names the value in the error.
///
/// # Errors
///
/// Returns [`FormatError::InvalidBase64`] on bad characters, missing padding,
/// or non-canonical trailing bits.
pub fn decode_base64(field: &'static str, text: &str) -> Result<Vec<u8>, FormatError> {
    BASE64
        .decode(text.as_bytes())
        .map_err(|_| FormatError::InvalidBase64 { field })
}

// ---------------------------------------------------------------------------
// PEM
// ---------------------------------------------------------------------------

/// PEM labels used for exported key material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PemLabel {
    /// SPKI-encoded public key.
    PublicKey,
    /// PKCS8-encoded private key.
    PrivateKey,
}

impl PemLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublicKey => "PUBLIC KEY",
            Self::PrivateKey => "PRIVATE KEY",
        }
    }

    fn begin_line(self) -> String {
        format!("-----BEGIN {}-----", self.as_str())
    }

    fn end_line(self) -> String {
        format!("-----END {}-----", self.as_str())
    }
}

/// Armor `der` under `label`, wrapping the base64 body at 64 characters.
///
/// The result has no trailing newline.
#[must_use]
pub fn encode_pem(label: PemLabel, der: &[u8]) -> String {
    let body = encode_base64(der);
    let lines: Vec<String> = body
        .as_bytes()
        .chunks(PEM_LINE_WIDTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    format!(
        "{}\n{}\n{}",
        label.begin_line(),
        lines.join("\n"),
        label.end_line()
    )
}

/// Strip `label` armor and decode the body.
///
/// Surrounding whitespace and CRLF line endings are tolerated.
///
/// # Errors
///
/// - [`FormatError::MissingPemArmor`] if the `BEGIN`/`END` lines are absent or
///   carry a different label
/// - [`FormatError::EmptyPemBody`] if nothing sits between them
/// - [`FormatError::PemLineTooLong`] if a body line exceeds 64 characters
/// - [`FormatError::InvalidBase64`] if the body does not decode
pub fn decode_pem(label: PemLabel, pem: &str) -> Result<Vec<u8>, FormatError> {
    let missing = FormatError::MissingPemArmor {
        label: label.as_str(),
    };
    let lines: Vec<&str> = pem.trim().lines().map(str::trim_end).collect();

    let (first, rest) = lines.split_first().ok_or_else(|| missing.clone())?;
    if *first != label.begin_line() {
        return Err(missing);
    }
    let (last, body) = rest.split_last().ok_or_else(|| missing.clone())?;
    if *last != label.end_line() {
        return Err(missing);
    }

    let mut encoded = String::new();
    for (index, line) in body.iter().enumerate() {
        if line.len() > PEM_LINE_WIDTH {
            return Err(FormatError::PemLineTooLong {
                line: index.saturating_add(1),
                len: line.len(),
            });
        }
        encoded.push_str(line);
    }
    if encoded.is_empty() {
        return Err(FormatError::EmptyPemBody);
    }

    decode_base64(label.as_str(), &encoded)
}

// ---------------------------------------------------------------------------
// Blob frame
// ---------------------------------------------------------------------------

/// Parsed contents of an encrypted blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobFrame {
    /// Uncompressed SEC1 point of the sender's ephemeral key.
    pub ephemeral_public: [u8; PUBLIC_KEY_LEN],
    /// AES-GCM nonce.
    pub iv: [u8; NONCE_LEN],
    /// Ciphertext followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
}

impl BlobFrame {
    /// Serialize to the `uv:`-prefixed wire string.
    #[must_use]
    pub fn encode(&self) -> String {
        let capacity = PUBLIC_KEY_LEN
            .saturating_add(NONCE_LEN)
            .saturating_add(self.ciphertext.len());
        let mut raw = Vec::with_capacity(capacity);
        raw.extend_from_slice(&self.ephemeral_public);
        raw.extend_from_slice(&self.iv);
        raw.extend_from_slice(&self.ciphertext);
        format!("{BLOB_PREFIX}{}", encode_base64(&raw))
    }

    /// Parse a wire string, slicing at the fixed offsets.
    ///
    /// Only framing is checked here. Whether the ephemeral bytes form a valid
    /// curve point is decided during decryption.
    ///
    /// # Errors
    ///
    /// - [`FormatError::MissingBlobPrefix`] without the `uv:` tag
    /// - [`FormatError::InvalidBase64`] for a bad body
    /// - [`FormatError::TruncatedBlob`] below [`MIN_BLOB_LEN`] decoded bytes
    pub fn decode(blob: &str) -> Result<Self, FormatError> {
        let body = blob
            .strip_prefix(BLOB_PREFIX)
            .ok_or(FormatError::MissingBlobPrefix)?;
        let raw = decode_base64("encrypted blob", body)?;
        if raw.len() < MIN_BLOB_LEN {
            return Err(FormatError::TruncatedBlob {
                len: raw.len(),
                min: MIN_BLOB_LEN,
            });
        }

        let (point, rest) = raw.split_at(PUBLIC_KEY_LEN);
        let (iv, ciphertext) = rest.split_at(NONCE_LEN);

        let mut ephemeral_public = [0u8; PUBLIC_KEY_LEN];
        ephemeral_public.copy_from_slice(point);
        let mut iv_bytes = [0u8; NONCE_LEN];
        iv_bytes.copy_from_slice(iv);

        Ok(Self {
            ephemeral_public,
            iv: iv_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

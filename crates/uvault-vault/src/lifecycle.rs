//! Vault lifecycle: generate, wrap, unlock, lock, change password.
//!
//! The vault holds at most one P-256 key pair. State lives behind a single
//! `Mutex`, held for the full duration of every transition:
//!
//! - `Locked`: no private key; the public key may still be known
//! - `Unlocked`: private key held, optionally with the wrapped material it
//!   was recovered from or last wrapped into
//!
//! Dropping the session (on `lock`, `generate`, or a successful `unlock`
//! that replaces it) zeroizes the private scalar.

use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use uvault_crypto_core::hybrid::{self, EncryptedBlob};
use uvault_crypto_core::kdf::Pbkdf2Params;
use uvault_crypto_core::keypair::{generate_keypair, PrivateKey, PublicKey};
use uvault_crypto_core::memory::SecretBuffer;
use uvault_crypto_core::wrap::{self, WrappedKeyMaterial};
use uvault_crypto_core::CryptoError;
use zeroize::Zeroizing;

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::payload::{ExportPayload, ACCEPTED_KDF_ITERATIONS};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Externally visible lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Locked,
    Unlocked,
}

impl VaultState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

/// Key material held while Unlocked.
struct Session {
    private: PrivateKey,
    /// Wrapped form of `private` under the current password, if known.
    wrapped: Option<WrappedKeyMaterial>,
}

#[derive(Default)]
struct VaultInner {
    /// Retained across `lock()`; not secret.
    public: Option<PublicKey>,
    /// `None` = Locked, `Some` = Unlocked.
    session: Option<Session>,
}

/// A client-held key vault.
///
/// `Vault` is `Send + Sync`; share it across threads with `Arc`.
pub struct Vault {
    config: VaultConfig,
    /// Iteration counts `unlock` will run PBKDF2 with.
    accepted_iterations: RangeInclusive<u32>,
    inner: Mutex<VaultInner>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self {
            config: VaultConfig::default(),
            accepted_iterations: ACCEPTED_KDF_ITERATIONS,
            inner: Mutex::new(VaultInner::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Construction & queries
// ---------------------------------------------------------------------------

impl Vault {
    /// Create an empty, Locked vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if `config` fails validation.
    pub fn new(config: VaultConfig) -> Result<Self, VaultError> {
        config.validate()?;
        Ok(Self {
            config,
            accepted_iterations: ACCEPTED_KDF_ITERATIONS,
            inner: Mutex::new(VaultInner::default()),
        })
    }

    /// Vault wrapping with `iterations` and accepting any count up to the
    /// maximum, so tests can use a low work factor.
    #[cfg(test)]
    pub(crate) fn with_kdf_iterations(iterations: u32) -> Self {
        Self {
            config: VaultConfig {
                kdf_iterations: iterations,
            },
            accepted_iterations: 1..=crate::payload::MAX_KDF_ITERATIONS,
            inner: Mutex::new(VaultInner::default()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Every state assignment is a single move, so a poisoned guard still
    /// holds a consistent value.
    fn guard(&self) -> MutexGuard<'_, VaultInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> VaultState {
        if self.guard().session.is_some() {
            VaultState::Unlocked
        } else {
            VaultState::Locked
        }
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.state() == VaultState::Unlocked
    }

    /// `true` when Unlocked and the held key has a known wrapped form.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.guard()
            .session
            .as_ref()
            .is_some_and(|s| s.wrapped.is_some())
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

impl Vault {
    /// Replace any held key with a freshly generated key pair. Ends Unlocked
    /// and unwrapped.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Crypto`] if the CSPRNG fails; state is unchanged.
    pub fn generate(&self) -> Result<(), VaultError> {
        let mut inner = self.guard();
        let keypair = generate_keypair()?;
        let fingerprint = keypair.public.fingerprint();

        inner.public = Some(keypair.public);
        inner.session = Some(Session {
            private: keypair.private,
            wrapped: None,
        });
        info!(fingerprint = %fingerprint, "vault key pair generated");
        Ok(())
    }

    /// Wrap the held private key under `password` with fresh salt and iv.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Locked`] if no private key is held
    /// - [`VaultError::Crypto`] if salt/iv generation or sealing fails
    pub fn wrap(&self, password: &[u8]) -> Result<ExportPayload, VaultError> {
        let mut inner = self.guard();
        let VaultInner { public, session } = &mut *inner;
        let (Some(public), Some(session)) = (public.as_ref(), session.as_mut()) else {
            return Err(VaultError::Locked);
        };

        let payload = wrap_session(session, public, password, &self.config.kdf_params())?;
        info!(fingerprint = %public.fingerprint(), "vault key wrapped");
        Ok(payload)
    }

    /// Recover the private key from `payload` using `password`.
    ///
    /// On any failure the vault is left exactly as it was before the call.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Format`] if the payload is malformed or declares an
    ///   iteration count outside [`ACCEPTED_KDF_ITERATIONS`]
    /// - [`VaultError::UnlockFailed`] for a wrong password, tampered material,
    ///   or a public key that does not match the recovered private key
    pub fn unlock(&self, password: &[u8], payload: &ExportPayload) -> Result<(), VaultError> {
        let mut inner = self.guard();
        unlock_into(&mut inner, password, payload, &self.accepted_iterations)
    }

    /// Drop the private key and any wrapping metadata. Idempotent.
    pub fn lock(&self) {
        let mut inner = self.guard();
        if inner.session.take().is_none() {
            debug!("lock requested on an already locked vault");
            return;
        }
        let fingerprint = inner.public.as_ref().map(PublicKey::fingerprint);
        info!(fingerprint = ?fingerprint, "vault locked");
    }

    /// Unlock with `old_password`, then re-wrap under `new_password`, without
    /// releasing the vault between the two steps.
    ///
    /// Existing blobs stay decryptable: the key pair does not change.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Format`] / [`VaultError::UnlockFailed`] as for
    ///   [`Self::unlock`]; no state change
    /// - [`VaultError::RewrapFailed`] if re-wrapping fails; the vault stays
    ///   Unlocked without wrapping metadata and [`Self::wrap`] may be retried
    pub fn change_password(
        &self,
        old_password: &[u8],
        new_password: &[u8],
        payload: &ExportPayload,
    ) -> Result<ExportPayload, VaultError> {
        let mut inner = self.guard();
        unlock_into(&mut inner, old_password, payload, &self.accepted_iterations)?;

        let VaultInner { public, session } = &mut *inner;
        let (Some(public), Some(session)) = (public.as_ref(), session.as_mut()) else {
            return Err(VaultError::Locked);
        };

        match wrap_session(session, public, new_password, &self.config.kdf_params()) {
            Ok(payload) => {
                info!(fingerprint = %public.fingerprint(), "vault password changed");
                Ok(payload)
            }
            Err(err) => {
                session.wrapped = None;
                warn!(
                    fingerprint = %public.fingerprint(),
                    error = %err,
                    "re-wrap after password change failed"
                );
                Err(VaultError::RewrapFailed(err))
            }
        }
    }
}

/// Wrap `session.private`, record the material, and build the payload.
///
/// On error `session.wrapped` is left untouched.
fn wrap_session(
    session: &mut Session,
    public: &PublicKey,
    password: &[u8],
    params: &Pbkdf2Params,
) -> Result<ExportPayload, CryptoError> {
    let wrapped = wrap::wrap_private_key(&session.private, password, params)?;
    let payload = ExportPayload::from_parts(public, &wrapped, params)?;
    session.wrapped = Some(wrapped);
    Ok(payload)
}

fn unlock_into(
    inner: &mut VaultInner,
    password: &[u8],
    payload: &ExportPayload,
    accepted_iterations: &RangeInclusive<u32>,
) -> Result<(), VaultError> {
    let decoded = payload.decode_in(accepted_iterations).map_err(|err| match err {
        CryptoError::Format(format) => VaultError::Format(format),
        _ => VaultError::UnlockFailed,
    })?;

    let private = match wrap::unwrap_private_key(&decoded.wrapped, password, &decoded.params) {
        Ok(private) => private,
        Err(err) => {
            warn!(error = %err, "vault unlock failed");
            return Err(VaultError::UnlockFailed);
        }
    };
    if private.public_key() != decoded.public_key {
        warn!("vault unlock failed: payload public key does not match private key");
        return Err(VaultError::UnlockFailed);
    }

    let fingerprint = decoded.public_key.fingerprint();
    inner.public = Some(decoded.public_key);
    inner.session = Some(Session {
        private,
        wrapped: Some(decoded.wrapped),
    });
    info!(fingerprint = %fingerprint, "vault unlocked");
    Ok(())
}

// ---------------------------------------------------------------------------
// Key export
// ---------------------------------------------------------------------------

impl Vault {
    fn public_key(&self) -> Result<PublicKey, VaultError> {
        self.guard().public.clone().ok_or(VaultError::Locked)
    }

    /// SPKI PEM of the vault's public key. Available while Locked once a key
    /// has been generated or unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Locked`] if no key has ever been held.
    pub fn export_public_key_pem(&self) -> Result<String, VaultError> {
        Ok(self.public_key()?.to_pem()?)
    }

    /// PKCS8 PEM of the private key.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Locked`] unless Unlocked.
    pub fn export_private_key_pem(&self) -> Result<Zeroizing<String>, VaultError> {
        let inner = self.guard();
        let session = inner.session.as_ref().ok_or(VaultError::Locked)?;
        Ok(session.private.to_pem()?)
    }

    /// Short BLAKE3 fingerprint of the public key, safe to log or display.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Locked`] if no key has ever been held.
    pub fn public_key_fingerprint(&self) -> Result<String, VaultError> {
        Ok(self.public_key()?.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

impl Vault {
    /// Encrypt `message` to the vault's own public key.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Locked`] if no public key is known
    /// - [`VaultError::Crypto`] if the CSPRNG or sealing fails
    pub fn encrypt(&self, message: &[u8]) -> Result<EncryptedBlob, VaultError> {
        let public = self.public_key()?;
        Ok(hybrid::encrypt(message, &public)?)
    }

    /// Decrypt a `uv:` blob with the held private key.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Locked`] unless Unlocked
    /// - [`VaultError::Format`] if `blob` is not a well-framed `uv:` value
    /// - [`VaultError::Decryption`] on an invalid ephemeral key or tag failure
    pub fn decrypt(&self, blob: &str) -> Result<SecretBuffer, VaultError> {
        let inner = self.guard();
        let session = inner.session.as_ref().ok_or(VaultError::Locked)?;
        let blob: EncryptedBlob = blob.parse()?;
        Ok(hybrid::decrypt(&blob, &session.private)?)
    }

    /// Encrypt a text field value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encrypt`].
    pub fn encrypt_text(&self, text: &str) -> Result<EncryptedBlob, VaultError> {
        self.encrypt(text.as_bytes())
    }

    /// Decrypt a text field value produced by [`Self::encrypt_text`]. The
    /// returned text is wiped when dropped.
    ///
    /// # Errors
    ///
    /// Same as [`Self::decrypt`], plus [`VaultError::Format`] if the plaintext
    /// is not UTF-8.
    pub fn decrypt_text(&self, blob: &str) -> Result<Zeroizing<String>, VaultError> {
        let inner = self.guard();
        let session = inner.session.as_ref().ok_or(VaultError::Locked)?;
        let blob: EncryptedBlob = blob.parse()?;
        Ok(hybrid::decrypt_text(&blob, &session.private)?)
    }
}

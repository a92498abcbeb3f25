//! Vault configuration: stored as plain JSON next to the wrapped payload.
//!
//! Holds only non-sensitive tuning values, so it can be read before any
//! password is entered.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uvault_crypto_core::kdf::{Pbkdf2Params, DEFAULT_ITERATIONS};

use crate::error::VaultError;
use crate::payload::{ACCEPTED_KDF_ITERATIONS, MAX_KDF_ITERATIONS};

// ── Configuration ──────────────────────────────────────────────────

/// Vault tuning parameters.
///
/// Persisted to `{dir}/vault-config.json`. Every field has a default via
/// [`Default`], so partial or missing files load cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// PBKDF2 iteration count for new wraps. Unwrapping always uses the
    /// count recorded in the payload being opened.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: default_kdf_iterations(),
        }
    }
}

const fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl VaultConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if `kdf_iterations` is below the
    /// default count or above [`MAX_KDF_ITERATIONS`].
    pub fn validate(&self) -> Result<(), VaultError> {
        if !ACCEPTED_KDF_ITERATIONS.contains(&self.kdf_iterations) {
            return Err(VaultError::Config(format!(
                "kdfIterations must be between {DEFAULT_ITERATIONS} and {MAX_KDF_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        Ok(())
    }

    /// KDF parameters for new wraps.
    #[must_use]
    pub const fn kdf_params(&self) -> Pbkdf2Params {
        Pbkdf2Params::new(self.kdf_iterations)
    }
}

// ── File I/O ───────────────────────────────────────────────────────

const CONFIG_FILE: &str = "vault-config.json";

impl VaultConfig {
    /// Load configuration from `{dir}/vault-config.json`.
    ///
    /// Returns [`Default::default()`] when the file is missing or
    /// contains invalid JSON (corrupt-file recovery).
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        fs::read_to_string(&path).map_or_else(
            |_| Self::default(),
            |contents| serde_json::from_str(&contents).unwrap_or_default(),
        )
    }

    /// Persist configuration to `{dir}/vault-config.json`.
    ///
    /// Writes to a `.tmp` sibling first, then renames over the target.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Config`] if the configuration fails [`Self::validate`]
    /// - [`VaultError::Io`] if the directory does not exist or the write or
    ///   rename is rejected
    pub fn save(&self, dir: &Path) -> Result<(), VaultError> {
        self.validate()?;

        let path = dir.join(CONFIG_FILE);
        let tmp = dir.join(".vault-config.json.tmp");

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&tmp, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, &path)?;

        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_uses_legacy_iteration_count() {
        let config = VaultConfig::default();
        assert_eq!(config.kdf_iterations, 100_000);
        assert!(config.kdf_params().is_default());
    }

    #[test]
    fn default_json_shape() {
        let config = VaultConfig::default();
        insta::assert_json_snapshot!(config, @r###"
        {
          "kdfIterations": 100000
        }
        "###);
    }

    #[test]
    fn load_returns_default_on_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(VaultConfig::load(dir.path()), VaultConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig {
            kdf_iterations: 250_000,
        };
        config.save(dir.path()).unwrap();
        assert_eq!(VaultConfig::load(dir.path()), config);
    }

    #[test]
    fn load_recovers_from_corrupt_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(VaultConfig::load(dir.path()), VaultConfig::default());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        assert_eq!(VaultConfig::load(dir.path()).kdf_iterations, 100_000);
    }

    #[test]
    fn validate_rejects_iterations_below_default() {
        for kdf_iterations in [0, 1, 99_999] {
            let config = VaultConfig { kdf_iterations };
            assert!(matches!(config.validate(), Err(VaultError::Config(_))));
        }
    }

    #[test]
    fn validate_rejects_iterations_above_maximum() {
        for kdf_iterations in [MAX_KDF_ITERATIONS + 1, u32::MAX] {
            let config = VaultConfig { kdf_iterations };
            assert!(matches!(config.validate(), Err(VaultError::Config(_))));
        }
    }

    #[test]
    fn validate_accepts_range_bounds() {
        for kdf_iterations in [DEFAULT_ITERATIONS, MAX_KDF_ITERATIONS] {
            assert!(VaultConfig { kdf_iterations }.validate().is_ok());
        }
    }

    #[test]
    fn save_refuses_invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig { kdf_iterations: 1 };
        assert!(matches!(config.save(dir.path()), Err(VaultError::Config(_))));
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn save_is_atomic_via_tmp_file() {
        let dir = TempDir::new().unwrap();
        VaultConfig::default().save(dir.path()).unwrap();
        assert!(!dir.path().join(".vault-config.json.tmp").exists());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        VaultConfig::default().save(dir.path()).unwrap();
        let mode = fs::metadata(dir.path().join(CONFIG_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

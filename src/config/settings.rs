use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{KdfParams, MIN_ITERATIONS};
use crate::errors::{KeychainError, Result};
use crate::keychain::{KeychainConfig, MAX_DECOY_BUCKET};

/// Project-level configuration, loaded from `.keychain.toml`.
///
/// Every field has a default, so the `keychain` binary works without a
/// config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Keychain file, relative to the project directory.
    #[serde(default = "default_keychain_file")]
    pub keychain_file: String,

    /// Out-of-band record of the last checksum and integrity tag.
    #[serde(default = "default_seal_file")]
    pub seal_file: String,

    /// PBKDF2 iteration count (default and minimum: 100 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Pad the stored entry count to a multiple of this (0 = off).
    #[serde(default)]
    pub decoy_bucket: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_keychain_file() -> String {
    "keychain.json".to_string()
}

fn default_seal_file() -> String {
    "keychain.seal".to_string()
}

fn default_pbkdf2_iterations() -> u32 {
    MIN_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            keychain_file: default_keychain_file(),
            seal_file: default_seal_file(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            decoy_bucket: 0,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project directory.
    pub const FILE_NAME: &'static str = ".keychain.toml";

    /// Load settings from `<project_dir>/.keychain.toml`.
    ///
    /// A missing file yields defaults.  A file that cannot be parsed, or
    /// that asks for fewer than the minimum PBKDF2 iterations, is an error.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeychainError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.pbkdf2_iterations < MIN_ITERATIONS {
            return Err(KeychainError::ConfigError(format!(
                "pbkdf2_iterations = {} is below the minimum of {MIN_ITERATIONS}",
                settings.pbkdf2_iterations
            )));
        }

        if settings.decoy_bucket > MAX_DECOY_BUCKET {
            return Err(KeychainError::ConfigError(format!(
                "decoy_bucket = {} exceeds the maximum of {MAX_DECOY_BUCKET}",
                settings.decoy_bucket
            )));
        }

        Ok(settings)
    }

    /// Full path to the keychain file.
    pub fn keychain_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.keychain_file)
    }

    /// Full path to the seal file.
    pub fn seal_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.seal_file)
    }

    /// Convert into the core keychain configuration.
    pub fn keychain_config(&self) -> KeychainConfig {
        KeychainConfig {
            kdf: KdfParams {
                iterations: self.pbkdf2_iterations,
            },
            decoy_bucket: self.decoy_bucket,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.keychain_file, "keychain.json");
        assert_eq!(s.seal_file, "keychain.seal");
        assert_eq!(s.pbkdf2_iterations, 100_000);
        assert_eq!(s.decoy_bucket, 0);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
keychain_file = "vault/passwords.json"
seal_file = "vault/passwords.seal"
pbkdf2_iterations = 250000
decoy_bucket = 8
"#;
        fs::write(tmp.path().join(".keychain.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.keychain_file, "vault/passwords.json");
        assert_eq!(settings.seal_file, "vault/passwords.seal");
        assert_eq!(settings.pbkdf2_iterations, 250_000);
        assert_eq!(settings.decoy_bucket, 8);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keychain.toml"), "decoy_bucket = 4\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.decoy_bucket, 4);
        assert_eq!(settings.keychain_file, "keychain.json");
        assert_eq!(settings.pbkdf2_iterations, 100_000);
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keychain.toml"), "this is not [valid toml").unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, KeychainError::ConfigError(_)));
    }

    #[test]
    fn load_rejects_weak_iterations() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".keychain.toml"),
            "pbkdf2_iterations = 1000\n",
        )
        .unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("below the minimum"));
    }

    #[test]
    fn load_rejects_oversized_decoy_bucket() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".keychain.toml"),
            "decoy_bucket = 1000000000000\n",
        )
        .unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, KeychainError::ConfigError(_)));
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn load_accepts_largest_decoy_bucket() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keychain.toml"), "decoy_bucket = 1024\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.decoy_bucket, MAX_DECOY_BUCKET);
    }

    #[test]
    fn paths_are_relative_to_project_dir() {
        let s = Settings::default();
        let dir = Path::new("/work");
        assert_eq!(s.keychain_path(dir), Path::new("/work/keychain.json"));
        assert_eq!(s.seal_path(dir), Path::new("/work/keychain.seal"));
    }

    #[test]
    fn converts_into_keychain_config() {
        let s = Settings {
            pbkdf2_iterations: 150_000,
            decoy_bucket: 3,
            ..Settings::default()
        };
        let config = s.keychain_config();
        assert_eq!(config.kdf.iterations, 150_000);
        assert_eq!(config.decoy_bucket, 3);
    }
}

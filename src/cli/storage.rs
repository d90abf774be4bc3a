//! Keychain files on disk.
//!
//! The core `Keychain` never touches the filesystem; this module is where
//! the `keychain` binary reads and writes its two files:
//!
//! - the keychain file (the output of `Keychain::dump`)
//! - the seal file, a small JSON record of the checksum and integrity tag
//!   of the last dump this tool wrote
//!
//! The seal is the out-of-band reference: on open, its checksum is the
//! trusted checksum and its tag is the rollback reference.  Restoring an
//! older keychain file without the matching seal is therefore detected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::output;
use crate::config::Settings;
use crate::errors::{KeychainError, Result};
use crate::keychain::{IntegrityTag, Keychain, LoadChecks};

/// Out-of-band record of the last written keychain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Seal {
    pub checksum: String,
    pub integrity_tag: IntegrityTag,
}

/// Serialize `keychain` and write both files.
///
/// The keychain file is written first.  If the process dies between the
/// two writes the next open fails its checksum check instead of silently
/// accepting an unsealed file.
pub fn save(keychain: &Keychain, settings: &Settings, project_dir: &Path) -> Result<Seal> {
    let (bytes, checksum) = keychain.dump()?;
    let seal = Seal {
        checksum,
        integrity_tag: keychain.integrity_tag()?,
    };
    let seal_bytes = serde_json::to_vec_pretty(&seal)
        .map_err(|e| KeychainError::FormatError(format!("seal: {e}")))?;

    write_atomic(&settings.keychain_path(project_dir), &bytes)?;
    write_atomic(&settings.seal_path(project_dir), &seal_bytes)?;

    debug!(checksum = seal.checksum.get(..8).unwrap_or_default(), "keychain saved");
    Ok(seal)
}

/// Read and unlock the keychain with every available check.
pub fn open(password: &str, settings: &Settings, project_dir: &Path) -> Result<Keychain> {
    let path = settings.keychain_path(project_dir);
    if !path.exists() {
        return Err(KeychainError::CommandFailed(format!(
            "no keychain at {} (run `keychain init` first)",
            path.display()
        )));
    }
    let bytes = fs::read(&path)?;

    let seal = read_seal(&settings.seal_path(project_dir))?;
    if seal.is_none() {
        output::warning("No seal file found: rollback to an older keychain cannot be detected.");
    }

    let mut keychain = Keychain::with_config(settings.keychain_config());
    keychain.load_with(
        password,
        &bytes,
        LoadChecks {
            checksum: seal.as_ref().map(|s| s.checksum.as_str()),
            reference_tag: seal.as_ref().map(|s| &s.integrity_tag),
        },
    )?;
    Ok(keychain)
}

/// Read the seal file, if it exists.
pub fn read_seal(path: &Path) -> Result<Option<Seal>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let seal = serde_json::from_slice(&bytes).map_err(|e| {
        KeychainError::FormatError(format!("seal file {}: {e}", path.display()))
    })?;
    Ok(Some(seal))
}

/// Write `bytes` to `path` via a temp file in the same directory and a
/// rename, so readers never see a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes)?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

//! Key separation using HKDF-SHA256.
//!
//! PBKDF2 runs once per initialization and yields a single master secret.
//! From it we expand two independent sub-keys:
//! - the **encryption key** used by AES-256-GCM for every entry;
//! - the **integrity key** used for domain HMACs and the store tag.
//!
//! Knowing one sub-key reveals nothing about the other, so an attacker
//! who somehow obtains the encryption key still cannot forge tags.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_master_secret, KdfParams};
use crate::errors::{KeychainError, Result};

/// Length of derived sub-keys (256 bits).
pub const KEY_LEN: usize = 32;

const ENCRYPTION_INFO: &[u8] = b"keychain-encryption-key";
const INTEGRITY_INFO: &[u8] = b"keychain-integrity-key";

/// The pair of symmetric keys protecting one keychain.
///
/// Both keys are wiped from memory when the set is dropped.  `Debug`
/// output never includes key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySet {
    encryption: [u8; KEY_LEN],
    integrity: [u8; KEY_LEN],
}

impl KeySet {
    /// Run the full derivation: PBKDF2 over (password, salt), then HKDF
    /// expansion into the two sub-keys.
    pub fn derive(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<Self> {
        let master = derive_master_secret(password, salt, params)?;
        Self::from_master(master.as_ref())
    }

    /// Expand both sub-keys from an already derived master secret.
    pub fn from_master(master: &[u8]) -> Result<Self> {
        Ok(Self {
            encryption: hkdf_expand(master, ENCRYPTION_INFO)?,
            integrity: hkdf_expand(master, INTEGRITY_INFO)?,
        })
    }

    /// Key for entry encryption.
    pub fn encryption_key(&self) -> &[u8; KEY_LEN] {
        &self.encryption
    }

    /// Key for domain indexing and the aggregate integrity tag.
    pub fn integrity_key(&self) -> &[u8; KEY_LEN] {
        &self.integrity
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("encryption", &"[REDACTED]")
            .field("integrity", &"[REDACTED]")
            .finish()
    }
}

/// Run HKDF-SHA256 expand with the given `info`.
///
/// The master secret already has full entropy (it came from PBKDF2), so
/// the extract step runs with HKDF's default zero salt.
fn hkdf_expand(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| KeychainError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

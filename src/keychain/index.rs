//! Domain-name hiding.
//!
//! Domains never reach the store: each one is replaced by
//! HMAC-SHA256(integrity key, domain) in hex.  The mapping is
//! deterministic, so lookups and overwrites find the same slot, and
//! without the key the storage keys reveal nothing about the domains.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::entry::StorageKey;
use crate::errors::{KeychainError, Result};

/// Map `domain` to its storage key under `integrity_key`.
pub fn index(domain: &str, integrity_key: &[u8]) -> Result<StorageKey> {
    if domain.is_empty() {
        return Err(KeychainError::InvalidInput("domain cannot be empty".into()));
    }
    mac_key(integrity_key, domain.as_bytes())
}

/// Storage key for a decoy entry, derived from random `seed` bytes.
///
/// Decoy keys come out of the same HMAC as real ones, so the two are
/// indistinguishable in the serialized store.
pub fn decoy_index(seed: &[u8], integrity_key: &[u8]) -> Result<StorageKey> {
    mac_key(integrity_key, seed)
}

fn mac_key(integrity_key: &[u8], input: &[u8]) -> Result<StorageKey> {
    let mut mac = Hmac::<Sha256>::new_from_slice(integrity_key)
        .map_err(|e| KeychainError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(input);
    Ok(StorageKey::from_mac(&mac.finalize().into_bytes()))
}

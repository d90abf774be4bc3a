//! Whole-store integrity tag.
//!
//! The tag is HMAC-SHA256 under the integrity key over the canonical
//! serialization of the entry mapping: compact JSON of a map ordered by
//! storage key.  Two mappings with the same contents always produce the
//! same bytes, regardless of insertion order.
//!
//! Every mutation path and every load goes through `compute_tag` /
//! `verify`; nothing else in the crate computes this MAC.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use super::entry::{Entry, IntegrityTag, StorageKey, MAC_LEN};
use crate::errors::{KeychainError, Result};

/// Canonical byte representation of an entry mapping.
pub fn canonical_bytes(entries: &BTreeMap<StorageKey, Entry>) -> Result<Vec<u8>> {
    serde_json::to_vec(entries)
        .map_err(|e| KeychainError::FormatError(format!("entries: {e}")))
}

/// Compute the integrity tag for `entries`.
pub fn compute_tag(entries: &BTreeMap<StorageKey, Entry>, integrity_key: &[u8]) -> Result<IntegrityTag> {
    let mac = mac_over(entries, integrity_key)?;
    let mut bytes = [0u8; MAC_LEN];
    bytes.copy_from_slice(&mac.finalize().into_bytes());
    Ok(IntegrityTag::from_bytes(bytes))
}

/// Verify that `expected` is the correct tag for `entries`.
///
/// When `reference` is given (a tag the caller trusts from an
/// out-of-band record), the stored tag must also equal it; otherwise a
/// replayed, validly tagged older snapshot would be accepted.
///
/// Comparisons are constant-time.
pub fn verify(
    entries: &BTreeMap<StorageKey, Entry>,
    integrity_key: &[u8],
    expected: &IntegrityTag,
    reference: Option<&IntegrityTag>,
) -> Result<()> {
    let mac = mac_over(entries, integrity_key)?;
    if mac.verify_slice(expected.as_bytes()).is_err() {
        warn!("integrity tag mismatch");
        return Err(KeychainError::tampering());
    }

    if let Some(reference) = reference {
        if reference != expected {
            warn!("integrity tag does not match the trusted reference");
            return Err(KeychainError::tampering());
        }
    }

    Ok(())
}

fn mac_over(entries: &BTreeMap<StorageKey, Entry>, integrity_key: &[u8]) -> Result<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(integrity_key)
        .map_err(|e| KeychainError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(&canonical_bytes(entries)?);
    Ok(mac)
}

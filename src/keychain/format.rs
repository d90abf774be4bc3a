//! On-disk keychain representation and content checksum.
//!
//! A keychain file is a single JSON object:
//!
//! ```text
//! {
//!   "checksum": "<sha256-hex of the canonical `data` bytes>",
//!   "data": {
//!     "salt": "<hex>",
//!     "entries": { "<storageKey>": { "nonce", "authTag", "ciphertext" }, ... },
//!     "integrityTag": "<hex>"
//!   }
//! }
//! ```
//!
//! - **checksum**: SHA-256 over the compact JSON of `data`.  It has no key,
//!   so it only catches accidental corruption; it is checked before any
//!   key derivation so a damaged file fails fast.
//! - **integrityTag**: the keyed HMAC from `integrity`, which is what
//!   actually detects tampering.
//!
//! Decoding here covers parsing and checksum verification only; key
//! derivation and tag verification happen in `Keychain::load_with`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::entry::{Entry, IntegrityTag, StorageKey};
use crate::crypto::padding::BLOCK_LEN;
use crate::crypto::SALT_LEN;
use crate::errors::{KeychainError, Result};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The persisted contents of a keychain (everything except the checksum).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeychainData {
    /// KDF salt; not secret.
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode_array")]
    pub salt: [u8; SALT_LEN],

    /// Opaque storage keys to encrypted entries, in key order.
    pub entries: BTreeMap<StorageKey, Entry>,

    /// HMAC over `entries`.
    pub integrity_tag: IntegrityTag,
}

/// The full file envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeychainFile {
    checksum: String,
    data: KeychainData,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// SHA-256 hex checksum of the canonical `data` bytes.
pub fn checksum(data: &KeychainData) -> Result<String> {
    let canonical = serde_json::to_vec(data)
        .map_err(|e| KeychainError::FormatError(format!("data: {e}")))?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

/// Serialize `data` into file bytes.
///
/// Returns the bytes and the checksum (the same value embedded in the
/// file) so callers can record it separately.
pub fn encode(data: &KeychainData) -> Result<(Vec<u8>, String)> {
    let checksum = checksum(data)?;
    let file = KeychainFile {
        checksum: checksum.clone(),
        data: data.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&file)
        .map_err(|e| KeychainError::FormatError(format!("file: {e}")))?;
    Ok((bytes, checksum))
}

/// Parse file bytes and verify checksums.
///
/// 1. Malformed JSON, unknown fields, bad hex or wrong field lengths
///    fail with `FormatError`.
/// 2. The embedded checksum must match the content; if the caller supplies
///    a `trusted` checksum, it must match too.  Either mismatch fails with
///    `ChecksumError`.
pub fn decode(bytes: &[u8], trusted: Option<&str>) -> Result<KeychainData> {
    let file: KeychainFile = serde_json::from_slice(bytes)
        .map_err(|e| KeychainError::FormatError(format!("keychain JSON: {e}")))?;

    for (key, entry) in &file.data.entries {
        if entry.ciphertext.len() != BLOCK_LEN {
            return Err(KeychainError::FormatError(format!(
                "entry {} has a {}-byte ciphertext, expected {BLOCK_LEN}",
                key.short(),
                entry.ciphertext.len()
            )));
        }
    }

    let actual = checksum(&file.data)?;
    if !checksums_match(&actual, &file.checksum) {
        warn!("embedded checksum does not match keychain contents");
        return Err(KeychainError::ChecksumError);
    }
    if let Some(trusted) = trusted {
        if !checksums_match(&actual, trusted) {
            warn!("keychain contents do not match the trusted checksum");
            return Err(KeychainError::ChecksumError);
        }
    }

    debug!(entries = file.data.entries.len(), "keychain file decoded");
    Ok(file.data)
}

fn checksums_match(actual: &str, claimed: &str) -> bool {
    let claimed = claimed.trim().to_ascii_lowercase();
    actual.as_bytes().ct_eq(claimed.as_bytes()).into()
}

// ---------------------------------------------------------------------------
// Serde helpers for hex-encoded byte fields
// ---------------------------------------------------------------------------

pub(crate) fn hex_encode<T, S>(data: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(data.as_ref()))
}

pub(crate) fn hex_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    hex::decode(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn hex_decode_array<'de, D, const N: usize>(
    deserializer: D,
) -> std::result::Result<[u8; N], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let mut out = [0u8; N];
    hex::decode_to_slice(&s, &mut out).map_err(serde::de::Error::custom)?;
    Ok(out)
}

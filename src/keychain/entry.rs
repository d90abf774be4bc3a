//! Value types stored in (and serialized from) a keychain.
//!
//! - `Entry`: one encrypted password (nonce, auth tag, ciphertext).
//! - `StorageKey`: the opaque hex map key that replaces the domain name.
//! - `IntegrityTag`: the HMAC over the whole entry mapping.
//!
//! Binary fields serialize as lowercase hex strings in JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::format::{hex_decode, hex_decode_array, hex_encode};
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::errors::{KeychainError, Result};

/// Length of an HMAC-SHA256 output in bytes.
pub const MAC_LEN: usize = 32;

/// A single encrypted password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Entry {
    /// Random 96-bit AES-GCM nonce, unique under the encryption key.
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode_array")]
    pub nonce: [u8; NONCE_LEN],

    /// 128-bit GCM authentication tag.
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode_array")]
    pub auth_tag: [u8; TAG_LEN],

    /// Encrypted padded block.
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode")]
    pub ciphertext: Vec<u8>,
}

/// Opaque map key derived from a domain name.
///
/// Always 64 lowercase hex characters (an HMAC-SHA256 output).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    pub(crate) fn from_mac(mac: &[u8]) -> Self {
        Self(hex::encode(mac))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl TryFrom<String> for StorageKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let well_formed = value.len() == MAC_LEN * 2
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(format!(
                "storage key must be {} lowercase hex characters",
                MAC_LEN * 2
            ));
        }
        Ok(Self(value))
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HMAC-SHA256 tag over the canonical serialization of all entries.
///
/// Equality is constant-time.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityTag(
    #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode_array")] [u8; MAC_LEN],
);

impl IntegrityTag {
    pub fn from_bytes(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a tag from its hex form (surrounding whitespace is ignored).
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; MAC_LEN];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| KeychainError::FormatError(format!("integrity tag: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }
}

impl PartialEq for IntegrityTag {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for IntegrityTag {}

impl fmt::Debug for IntegrityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityTag({})", self.to_hex())
    }
}

impl fmt::Display for IntegrityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_rejects_malformed_input() {
        assert!(StorageKey::try_from("abc".to_string()).is_err());
        assert!(StorageKey::try_from("G".repeat(64)).is_err());
        assert!(StorageKey::try_from("A".repeat(64)).is_err());
        assert!(StorageKey::try_from("a".repeat(64)).is_ok());
    }

    #[test]
    fn entry_serializes_as_hex_fields() {
        let entry = Entry {
            nonce: [0x01; NONCE_LEN],
            auth_tag: [0xff; TAG_LEN],
            ciphertext: vec![0xab, 0xcd],
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["nonce"], "010101010101010101010101");
        assert_eq!(json["authTag"], "ffffffffffffffffffffffffffffffff");
        assert_eq!(json["ciphertext"], "abcd");

        let back: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn entry_rejects_short_nonce() {
        let json = r#"{"nonce":"0101","authTag":"ffffffffffffffffffffffffffffffff","ciphertext":"ab"}"#;
        assert!(serde_json::from_str::<Entry>(json).is_err());
    }

    #[test]
    fn tag_hex_roundtrip_and_equality() {
        let tag = IntegrityTag::from_bytes([0x3c; MAC_LEN]);
        let parsed = IntegrityTag::from_hex(&format!("  {}\n", tag.to_hex())).unwrap();
        assert_eq!(tag, parsed);
        assert_ne!(tag, IntegrityTag::from_bytes([0x3d; MAC_LEN]));
        assert!(IntegrityTag::from_hex("zz").is_err());
    }
}

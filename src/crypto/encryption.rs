//! AES-256-GCM authenticated encryption of single keychain entries.
//!
//! The plaintext is always a padded block (see `padding`), so every
//! ciphertext has the same length.  Unlike a flat `nonce || ciphertext`
//! blob, the three parts are kept apart in an `Entry` because the file
//! format stores them as separate fields:
//!
//! ```text
//! Entry { nonce: 12 bytes, auth_tag: 16 bytes, ciphertext: BLOCK_LEN bytes }
//! ```
//!
//! Nonces are supplied by the caller (see `nonce::NonceRegistry`), which
//! is what lets the keychain refuse to ever reuse one under a key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use super::keys::KEY_LEN;
use super::padding;
use crate::errors::{KeychainError, Result};
use crate::keychain::Entry;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Pad and encrypt a password.
pub fn encrypt(key: &[u8; KEY_LEN], nonce: [u8; NONCE_LEN], password: &str) -> Result<Entry> {
    let block = padding::pad(password)?;
    encrypt_block(key, nonce, &block)
}

/// Encrypt an already padded block.
pub fn encrypt_block(key: &[u8; KEY_LEN], nonce: [u8; NONCE_LEN], block: &[u8]) -> Result<Entry> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| KeychainError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let mut ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), block)
        .map_err(|e| KeychainError::EncryptionFailed(format!("encryption error: {e}")))?;

    // aes-gcm appends the tag; the file format stores it on its own.
    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);
    let auth_tag: [u8; TAG_LEN] = tag
        .try_into()
        .map_err(|_| KeychainError::EncryptionFailed("unexpected tag length".into()))?;

    Ok(Entry {
        nonce,
        auth_tag,
        ciphertext,
    })
}

/// Decrypt an entry and strip its padding.
///
/// Any authentication failure (wrong key, flipped bit in nonce, tag or
/// ciphertext) is reported as an `IntegrityError`.
pub fn decrypt(key: &[u8; KEY_LEN], entry: &Entry) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| KeychainError::decryption())?;

    let mut sealed = Vec::with_capacity(entry.ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(&entry.ciphertext);
    sealed.extend_from_slice(&entry.auth_tag);

    let block = cipher
        .decrypt(Nonce::from_slice(&entry.nonce), sealed.as_ref())
        .map_err(|_| KeychainError::decryption())?;

    padding::unpad(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::padding::BLOCK_LEN;

    const KEY: [u8; KEY_LEN] = [0xABu8; KEY_LEN];

    #[test]
    fn roundtrip() {
        let entry = encrypt(&KEY, [1u8; NONCE_LEN], "pw123").unwrap();
        assert_eq!(decrypt(&KEY, &entry).unwrap(), "pw123");
    }

    #[test]
    fn ciphertext_length_is_constant() {
        let short = encrypt(&KEY, [1u8; NONCE_LEN], "a").unwrap();
        let long = encrypt(&KEY, [2u8; NONCE_LEN], &"b".repeat(60)).unwrap();
        assert_eq!(short.ciphertext.len(), BLOCK_LEN);
        assert_eq!(long.ciphertext.len(), BLOCK_LEN);
    }

    #[test]
    fn wrong_key_is_integrity_error() {
        let entry = encrypt(&KEY, [3u8; NONCE_LEN], "secret").unwrap();
        let err = decrypt(&[0x11u8; KEY_LEN], &entry).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn flipped_tag_is_integrity_error() {
        let mut entry = encrypt(&KEY, [4u8; NONCE_LEN], "secret").unwrap();
        entry.auth_tag[0] ^= 0x01;
        assert!(decrypt(&KEY, &entry).unwrap_err().is_integrity());
    }

    #[test]
    fn flipped_nonce_is_integrity_error() {
        let mut entry = encrypt(&KEY, [5u8; NONCE_LEN], "secret").unwrap();
        entry.nonce[11] ^= 0x80;
        assert!(decrypt(&KEY, &entry).unwrap_err().is_integrity());
    }
}

//! Integration tests for the keychain crypto module.

use keychain::crypto::encryption::encrypt_block;
use keychain::crypto::padding::{empty_block, BLOCK_LEN};
use keychain::crypto::{
    decrypt, derive_master_secret, encrypt, generate_salt, KdfParams, KeySet, NonceRegistry,
    SystemRandom, MAX_PASSWORD_LEN,
};
use keychain::errors::KeychainError;

fn salt() -> [u8; 16] {
    generate_salt(&mut SystemRandom).expect("salt")
}

// ---------------------------------------------------------------------------
// Entry encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let mut nonces = NonceRegistry::new();

    let entry = encrypt(&key, nonces.issue(&mut SystemRandom).expect("nonce"), "hunter2")
        .expect("encrypt should succeed");
    assert_eq!(entry.ciphertext.len(), BLOCK_LEN);

    let recovered = decrypt(&key, &entry).expect("decrypt should succeed");
    assert_eq!(recovered, "hunter2");
}

#[test]
fn fresh_nonces_give_different_ciphertexts() {
    let key = [0xCDu8; 32];
    let mut nonces = NonceRegistry::new();

    let e1 = encrypt(&key, nonces.issue(&mut SystemRandom).expect("n1"), "same").expect("1");
    let e2 = encrypt(&key, nonces.issue(&mut SystemRandom).expect("n2"), "same").expect("2");

    assert_ne!(
        e1.ciphertext, e2.ciphertext,
        "two encryptions of the same password must differ"
    );
    assert_eq!(nonces.len(), 2);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let entry = encrypt(&[0x11u8; 32], [1u8; 12], "TOP_SECRET").expect("encrypt");
    let err = decrypt(&[0x22u8; 32], &entry).unwrap_err();
    assert!(err.is_integrity(), "decryption with the wrong key must fail");
}

#[test]
fn decrypt_with_corrupted_ciphertext_fails() {
    let key = [0xBBu8; 32];
    let mut entry = encrypt(&key, [2u8; 12], "abc").expect("encrypt");
    entry.ciphertext[3] ^= 0xFF;

    let err = decrypt(&key, &entry).unwrap_err();
    assert!(err.is_integrity(), "corrupted ciphertext must fail auth check");
}

#[test]
fn decoy_block_decrypts_to_empty_string() {
    let key = [0x3Cu8; 32];
    let entry = encrypt_block(&key, [3u8; 12], &empty_block()).expect("encrypt");
    assert_eq!(entry.ciphertext.len(), BLOCK_LEN);
    assert_eq!(decrypt(&key, &entry).expect("decrypt"), "");
}

#[test]
fn longest_password_fits_and_longer_is_rejected() {
    let key = [0x01u8; 32];
    let longest = "z".repeat(MAX_PASSWORD_LEN);
    let entry = encrypt(&key, [4u8; 12], &longest).expect("max length");
    assert_eq!(decrypt(&key, &entry).expect("decrypt"), longest);

    let err = encrypt(&key, [5u8; 12], &"z".repeat(MAX_PASSWORD_LEN + 1)).unwrap_err();
    assert!(matches!(err, KeychainError::InputTooLong { .. }));
}

// ---------------------------------------------------------------------------
// Key derivation (PBKDF2-HMAC-SHA256)
// ---------------------------------------------------------------------------

#[test]
fn derive_master_secret_same_inputs_same_output() {
    let salt = salt();
    let params = KdfParams::default();

    let k1 = derive_master_secret(b"my-secure-passphrase", &salt, &params).expect("derive 1");
    let k2 = derive_master_secret(b"my-secure-passphrase", &salt, &params).expect("derive 2");

    assert_eq!(*k1, *k2, "same password + salt must produce the same key");
}

#[test]
fn derive_master_secret_different_salts_different_keys() {
    let params = KdfParams::default();

    let k1 = derive_master_secret(b"same-password", &salt(), &params).expect("derive 1");
    let k2 = derive_master_secret(b"same-password", &salt(), &params).expect("derive 2");

    assert_ne!(*k1, *k2, "different salts must produce different keys");
}

#[test]
fn derive_master_secret_different_passwords_different_keys() {
    let salt = salt();
    let params = KdfParams::default();

    let k1 = derive_master_secret(b"password-one", &salt, &params).expect("derive 1");
    let k2 = derive_master_secret(b"password-two", &salt, &params).expect("derive 2");

    assert_ne!(*k1, *k2, "different passwords must produce different keys");
}

// ---------------------------------------------------------------------------
// HKDF key separation
// ---------------------------------------------------------------------------

#[test]
fn encryption_and_integrity_keys_differ() {
    let keys = KeySet::derive(b"hunter2", &salt(), &KdfParams::default()).expect("keys");
    assert_ne!(keys.encryption_key(), keys.integrity_key());
}

#[test]
fn key_set_matches_manual_pipeline() {
    let salt = salt();
    let params = KdfParams::default();

    let master = derive_master_secret(b"hunter2", &salt, &params).expect("master");
    let manual = KeySet::from_master(&master[..]).expect("from master");
    let direct = KeySet::derive(b"hunter2", &salt, &params).expect("derive");

    assert_eq!(manual.encryption_key(), direct.encryption_key());
    assert_eq!(manual.integrity_key(), direct.integrity_key());
}

// ---------------------------------------------------------------------------
// End-to-end: password -> keys -> encrypt/decrypt
// ---------------------------------------------------------------------------

#[test]
fn full_crypto_pipeline() {
    let salt = salt();
    let keys = KeySet::derive(b"hunter2", &salt, &KdfParams::default()).expect("keys");
    let mut nonces = NonceRegistry::new();

    let nonce = nonces.issue(&mut SystemRandom).expect("nonce");
    let entry = encrypt(keys.encryption_key(), nonce, "postgres-pass").expect("encrypt");

    // A second derivation from the same inputs opens the entry.
    let again = KeySet::derive(b"hunter2", &salt, &KdfParams::default()).expect("keys again");
    assert_eq!(
        decrypt(again.encryption_key(), &entry).expect("decrypt"),
        "postgres-pass"
    );

    // The integrity key is not an encryption key for the same entries.
    assert!(decrypt(keys.integrity_key(), &entry).is_err());
}

//! Cryptographic primitives for the keychain.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - HKDF separation into encryption and integrity keys (`keys`)
//! - Fixed-length password padding (`padding`)
//! - AES-256-GCM entry encryption and decryption (`encryption`)
//! - Nonce-reuse bookkeeping (`nonce`)
//! - The pluggable randomness source (`random`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod nonce;
pub mod padding;
pub mod random;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, KeySet, ...};
pub use encryption::{decrypt, encrypt, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_master_secret, generate_salt, KdfParams, SALT_LEN};
pub use keys::{KeySet, KEY_LEN};
pub use nonce::NonceRegistry;
pub use padding::MAX_PASSWORD_LEN;
pub use random::{RandomSource, SystemRandom};

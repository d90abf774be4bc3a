//! The keychain: hidden-domain storage of encrypted passwords.
//!
//! This module provides:
//! - Entry, storage-key and integrity-tag types (`entry`)
//! - Domain hiding via HMAC (`index`)
//! - The in-memory entry mapping (`store`)
//! - The whole-store integrity tag (`integrity`)
//! - The on-disk JSON format and checksum (`format`)
//! - The `Keychain` facade tying it all together (`manager`)
//! - A mutex-protected handle for multi-threaded hosts (`shared`)

pub mod entry;
pub mod format;
pub mod index;
pub mod integrity;
pub mod manager;
pub mod shared;
pub mod store;

pub use entry::{Entry, IntegrityTag, StorageKey};
pub use format::KeychainData;
pub use manager::{Keychain, KeychainConfig, LoadChecks, MAX_DECOY_BUCKET};
pub use shared::SharedKeychain;
pub use store::KeyValueStore;

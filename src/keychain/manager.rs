//! High-level keychain operations.
//!
//! `Keychain` owns everything an unlocked keychain needs (master
//! password, derived keys, salt, entry store, integrity tag, nonce
//! registry) as instance state.  Several independent keychains can live
//! in one process.
//!
//! Every mutation goes through `commit`, which snapshots the store,
//! applies the change, rebalances decoys and refreshes the integrity tag.
//! If any step fails the snapshot is restored, so callers never observe
//! a half-applied change or a stale tag.

use std::collections::BTreeSet;

use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::entry::{IntegrityTag, StorageKey, MAC_LEN};
use super::format::{self, KeychainData};
use super::index::{decoy_index, index};
use super::integrity;
use super::store::KeyValueStore;
use crate::crypto::random::random_array;
use crate::crypto::{
    encryption, generate_salt, padding, KdfParams, KeySet, NonceRegistry, RandomSource,
    SystemRandom, SALT_LEN,
};
use crate::errors::{KeychainError, Result};

/// Largest accepted `decoy_bucket`.
pub const MAX_DECOY_BUCKET: usize = 1024;

/// Tunable parameters of a keychain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeychainConfig {
    /// PBKDF2 parameters.
    pub kdf: KdfParams,
    /// Pad the number of stored entries up to a multiple of this value
    /// with decoys (0 disables decoys).
    pub decoy_bucket: usize,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            decoy_bucket: 0,
        }
    }
}

impl KeychainConfig {
    /// Reject parameters the keychain cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.decoy_bucket > MAX_DECOY_BUCKET {
            return Err(KeychainError::InvalidInput(format!(
                "decoy bucket {} exceeds the maximum of {MAX_DECOY_BUCKET}",
                self.decoy_bucket
            )));
        }
        Ok(())
    }
}

/// Optional checks applied when loading a serialized keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadChecks<'a> {
    /// Expected SHA-256 checksum of the file contents.
    pub checksum: Option<&'a str>,
    /// Integrity tag the caller trusts from an out-of-band record.  A file
    /// whose tag differs (e.g. a replayed older dump) is rejected.
    pub reference_tag: Option<&'a IntegrityTag>,
}

/// State of an initialized keychain.
struct Session {
    password: Zeroizing<String>,
    salt: [u8; SALT_LEN],
    keys: KeySet,
    store: KeyValueStore,
    decoys: BTreeSet<StorageKey>,
    tag: IntegrityTag,
    nonces: NonceRegistry,
}

impl Session {
    fn verify(&self) -> Result<()> {
        integrity::verify(self.store.entries(), self.keys.integrity_key(), &self.tag, None)
    }

    fn refresh_tag(&mut self) -> Result<()> {
        self.tag = integrity::compute_tag(self.store.entries(), self.keys.integrity_key())?;
        Ok(())
    }

    fn real_len(&self) -> usize {
        self.store.len() - self.decoys.len()
    }

    /// Add or drop decoys so the total entry count is a multiple of `bucket`.
    fn rebalance_decoys(&mut self, bucket: usize, rng: &mut dyn RandomSource) -> Result<()> {
        let target = decoy_target(self.real_len(), bucket);

        while self.decoys.len() > target {
            match self.decoys.pop_first() {
                Some(key) => {
                    self.store.remove(&key);
                }
                None => break,
            }
        }
        while self.decoys.len() < target {
            self.add_decoy(rng)?;
        }
        Ok(())
    }

    fn add_decoy(&mut self, rng: &mut dyn RandomSource) -> Result<()> {
        let seed: [u8; 32] = random_array(rng)?;
        let key = decoy_index(&seed, self.keys.integrity_key())?;
        if self.store.contains(&key) {
            return Err(KeychainError::RandomSource(
                "random source repeated a decoy seed".into(),
            ));
        }

        let nonce = self.nonces.issue(rng)?;
        let entry =
            encryption::encrypt_block(self.keys.encryption_key(), nonce, &padding::empty_block())?;
        self.store.upsert(key.clone(), entry);
        self.decoys.insert(key);
        Ok(())
    }
}

/// Number of decoys needed so `real + decoys` fills whole buckets
/// (at least one).
fn decoy_target(real: usize, bucket: usize) -> usize {
    if bucket == 0 {
        return 0;
    }
    let buckets = (real / bucket + usize::from(real % bucket != 0)).max(1);
    buckets.saturating_mul(bucket).saturating_sub(real)
}

/// An encrypted, integrity-protected password keychain.
///
/// Create one with `Keychain::new`, then either `init` it with a fresh
/// master password or `load` a serialized keychain.
pub struct Keychain {
    config: KeychainConfig,
    rng: Box<dyn RandomSource>,
    session: Option<Session>,
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keychain")
            .field("config", &self.config)
            .field("initialized", &self.session.is_some())
            .field("stored_entries", &self.session.as_ref().map(|s| s.store.len()))
            .finish_non_exhaustive()
    }
}

impl Keychain {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// An uninitialized keychain with default settings and the OS RNG.
    pub fn new() -> Self {
        Self::with_config(KeychainConfig::default())
    }

    pub fn with_config(config: KeychainConfig) -> Self {
        Self::with_random(config, SystemRandom)
    }

    /// Use a caller-provided source of random bytes.
    pub fn with_random(config: KeychainConfig, rng: impl RandomSource + 'static) -> Self {
        Self {
            config,
            rng: Box::new(rng),
            session: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create an empty keychain protected by `password`.
    ///
    /// Generates a fresh salt and runs the key derivation once.
    pub fn init(&mut self, password: &str) -> Result<()> {
        if self.session.is_some() {
            return Err(KeychainError::AlreadyInitialized);
        }
        self.config.validate()?;

        let salt = generate_salt(self.rng.as_mut())?;
        let keys = KeySet::derive(password.as_bytes(), &salt, &self.config.kdf)?;

        // The tag is computed by `refresh_tag` once decoys are in place.
        let mut session = Session {
            password: Zeroizing::new(password.to_owned()),
            salt,
            keys,
            store: KeyValueStore::new(),
            decoys: BTreeSet::new(),
            tag: IntegrityTag::from_bytes([0; MAC_LEN]),
            nonces: NonceRegistry::new(),
        };
        session.rebalance_decoys(self.config.decoy_bucket, self.rng.as_mut())?;
        session.refresh_tag()?;

        debug!(decoys = session.decoys.len(), "keychain initialized");
        self.session = Some(session);
        Ok(())
    }

    /// Replace the keychain state with a serialized keychain.
    ///
    /// Works whether or not this instance is initialized.  On any error
    /// the current state is left untouched.
    pub fn load(&mut self, password: &str, repr: &[u8], checksum: Option<&str>) -> Result<()> {
        self.load_with(
            password,
            repr,
            LoadChecks {
                checksum,
                reference_tag: None,
            },
        )
    }

    /// `load` using the master password this instance was initialized with.
    pub fn reload(&mut self, repr: &[u8], checksum: Option<&str>) -> Result<()> {
        let password = self.session()?.password.clone();
        self.load(&password, repr, checksum)
    }

    /// `load` with every optional check.
    ///
    /// Steps, in order: parse, checksum, key derivation from the
    /// persisted salt, integrity tag (and reference tag) verification.
    /// Only when all pass does the loaded store replace the live one.
    pub fn load_with(&mut self, password: &str, repr: &[u8], checks: LoadChecks<'_>) -> Result<()> {
        let data = format::decode(repr, checks.checksum)?;

        let keys = KeySet::derive(password.as_bytes(), &data.salt, &self.config.kdf)?;
        integrity::verify(
            &data.entries,
            keys.integrity_key(),
            &data.integrity_tag,
            checks.reference_tag,
        )?;

        let mut nonces = NonceRegistry::new();
        let mut decoys = BTreeSet::new();
        for (key, entry) in &data.entries {
            nonces.record(entry.nonce)?;
            let mut plaintext = encryption::decrypt(keys.encryption_key(), entry)?;
            if plaintext.is_empty() {
                decoys.insert(key.clone());
            }
            plaintext.zeroize();
        }

        let session = Session {
            password: Zeroizing::new(password.to_owned()),
            salt: data.salt,
            keys,
            store: KeyValueStore::from_entries(data.entries),
            decoys,
            tag: data.integrity_tag,
            nonces,
        };

        debug!(
            entries = session.real_len(),
            decoys = session.decoys.len(),
            "keychain loaded"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Serialize the keychain.  Returns the file bytes and their checksum.
    pub fn dump(&self) -> Result<(Vec<u8>, String)> {
        let session = self.session()?;
        session.verify()?;

        let data = KeychainData {
            salt: session.salt,
            entries: session.store.entries().clone(),
            integrity_tag: session.tag,
        };
        let out = format::encode(&data)?;
        debug!(stored = data.entries.len(), "keychain dumped");
        Ok(out)
    }

    /// Wipe the store and all key material.  The instance returns to the
    /// uninitialized state.
    pub fn clear(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.store.clear();
            session.decoys.clear();
            session.nonces.clear();
            // Dropping the session zeroizes the password and both keys.
            debug!("keychain cleared");
        }
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Store `password` for `domain`, replacing any previous value.
    pub fn set(&mut self, domain: &str, password: &str) -> Result<()> {
        self.session()?.verify()?;
        padding::validate(password)?;

        self.commit(|session, rng| {
            let key = index(domain, session.keys.integrity_key())?;
            let nonce = session.nonces.issue(rng)?;
            let entry = encryption::encrypt(session.keys.encryption_key(), nonce, password)?;

            session.decoys.remove(&key);
            let replaced = session.store.upsert(key.clone(), entry).is_some();
            debug!(key = key.short(), replaced, "entry stored");
            Ok(())
        })
    }

    /// Decrypt the password stored for `domain`.
    pub fn get(&self, domain: &str) -> Result<String> {
        let session = self.session()?;
        session.verify()?;

        let key = index(domain, session.keys.integrity_key())?;
        if session.decoys.contains(&key) {
            return Err(KeychainError::NotFound);
        }
        let entry = session.store.get(&key).ok_or(KeychainError::NotFound)?;
        encryption::decrypt(session.keys.encryption_key(), entry)
    }

    /// Remove the entry for `domain`.  Returns `false` if there was none.
    pub fn remove(&mut self, domain: &str) -> Result<bool> {
        let session = self.session()?;
        session.verify()?;

        let key = index(domain, session.keys.integrity_key())?;
        if !session.store.contains(&key) || session.decoys.contains(&key) {
            debug!(key = key.short(), "remove: no such entry");
            return Ok(false);
        }

        self.commit(|session, _| {
            session.store.remove(&key);
            debug!(key = key.short(), "entry removed");
            Ok(true)
        })
    }

    /// Returns `true` if an entry exists for `domain`.
    pub fn contains(&self, domain: &str) -> Result<bool> {
        let session = self.session()?;
        session.verify()?;
        let key = index(domain, session.keys.integrity_key())?;
        Ok(session.store.contains(&key) && !session.decoys.contains(&key))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Number of real entries (decoys excluded).
    pub fn len(&self) -> Result<usize> {
        Ok(self.session()?.real_len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of entries as they appear in a dump (decoys included).
    pub fn stored_len(&self) -> Result<usize> {
        Ok(self.session()?.store.len())
    }

    /// The current integrity tag.  Record it out of band to detect rollback
    /// on a later `load_with`.
    pub fn integrity_tag(&self) -> Result<IntegrityTag> {
        Ok(self.session()?.tag)
    }

    pub fn salt(&self) -> Result<[u8; SALT_LEN]> {
        Ok(self.session()?.salt)
    }

    pub fn config(&self) -> &KeychainConfig {
        &self.config
    }

    /// Re-check the in-memory store against its integrity tag.
    pub fn verify_integrity(&self) -> Result<()> {
        self.session()?.verify()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(KeychainError::NotInitialized)
    }

    /// Apply a mutation atomically: on error the previous store, decoy
    /// set and tag are restored.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut Session, &mut dyn RandomSource) -> Result<T>,
    ) -> Result<T> {
        self.config.validate()?;
        let bucket = self.config.decoy_bucket;
        let rng = self.rng.as_mut();
        let session = self.session.as_mut().ok_or(KeychainError::NotInitialized)?;

        let snapshot = (session.store.clone(), session.decoys.clone(), session.tag);

        let result = match op(&mut *session, &mut *rng) {
            Ok(value) => session
                .rebalance_decoys(bucket, rng)
                .and_then(|()| session.refresh_tag())
                .map(|()| value),
            Err(e) => Err(e),
        };

        if result.is_err() {
            let (store, decoys, tag) = snapshot;
            session.store = store;
            session.decoys = decoys;
            session.tag = tag;
        }
        result
    }
}

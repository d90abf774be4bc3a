//! Per-key nonce bookkeeping.
//!
//! AES-GCM loses both confidentiality and authenticity if a nonce is
//! ever repeated under the same key.  Random 96-bit nonces make that
//! astronomically unlikely, but a broken `RandomSource` would make it
//! certain, so every nonce issued or loaded under the current encryption
//! key is remembered and a repeat is a hard error.

use std::collections::HashSet;

use tracing::warn;

use super::encryption::NONCE_LEN;
use super::random::{random_array, RandomSource};
use crate::errors::{KeychainError, Result};

/// The set of nonces seen under one encryption key.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    seen: HashSet<[u8; NONCE_LEN]>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh nonce from `rng` and record it.
    pub fn issue(&mut self, rng: &mut dyn RandomSource) -> Result<[u8; NONCE_LEN]> {
        let nonce = random_array(rng)?;
        self.record(nonce)?;
        Ok(nonce)
    }

    /// Record a nonce that is already in use (e.g. from a loaded file).
    pub fn record(&mut self, nonce: [u8; NONCE_LEN]) -> Result<()> {
        if !self.seen.insert(nonce) {
            warn!("nonce collision under the current encryption key");
            return Err(KeychainError::NonceReuse);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

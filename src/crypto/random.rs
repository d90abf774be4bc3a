//! Source of cryptographically secure random bytes.
//!
//! The keychain never reaches for a global RNG on its own: salts, nonces
//! and decoy material all come from the `RandomSource` owned by the
//! `Keychain` instance.  Hosts can plug in their own source (an HSM, a
//! browser `getRandomValues` bridge, a deterministic source in tests).

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{KeychainError, Result};

/// A provider of cryptographically secure random bytes.
pub trait RandomSource: Send {
    /// Fill `dest` entirely with random bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| KeychainError::RandomSource(format!("OS RNG unavailable: {e}")))
    }
}

/// Draw a fixed-size array from `rng`.
pub fn random_array<const N: usize>(rng: &mut dyn RandomSource) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    rng.fill(&mut out)?;
    Ok(out)
}

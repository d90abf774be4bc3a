//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! PBKDF2 is deliberately slow: every guess at the master password costs
//! an attacker `iterations` HMAC-SHA256 invocations.  The iteration count
//! is configurable via `KdfParams` but can never drop below
//! `MIN_ITERATIONS`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::random::{random_array, RandomSource};
use crate::errors::{KeychainError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived master secret in bytes (256 bits).
pub const MASTER_LEN: usize = 32;

/// Minimum accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Configurable PBKDF2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of PBKDF2 rounds (default: 100 000).
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }
}

/// Derive the 32-byte master secret from a password and salt.
///
/// The same password + salt + params always produce the same secret.
/// The result is wrapped in `Zeroizing` so it is wiped when dropped.
pub fn derive_master_secret(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; MASTER_LEN]>> {
    if password.is_empty() {
        return Err(KeychainError::InvalidInput(
            "master password cannot be empty".into(),
        ));
    }
    if params.iterations < MIN_ITERATIONS {
        return Err(KeychainError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }
    if salt.len() != SALT_LEN {
        return Err(KeychainError::KeyDerivationFailed(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut secret = Zeroizing::new([0u8; MASTER_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, params.iterations, secret.as_mut());
    Ok(secret)
}

/// Generate a random 16-byte salt.
pub fn generate_salt(rng: &mut dyn RandomSource) -> Result<[u8; SALT_LEN]> {
    random_array(rng)
}

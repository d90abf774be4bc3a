use thiserror::Error;

/// All errors that can occur in the keychain.
#[derive(Debug, Error)]
pub enum KeychainError {
    // --- Input errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password is too long ({len} bytes, maximum is {max})")]
    InputTooLong { len: usize, max: usize },

    #[error("No entry found for this domain")]
    NotFound,

    // --- Integrity errors ---
    #[error("Integrity check failed: {0}")]
    IntegrityError(&'static str),

    #[error("Checksum mismatch: the keychain file is corrupted")]
    ChecksumError,

    #[error("Invalid keychain format: {0}")]
    FormatError(String),

    #[error("Nonce reuse detected under the current encryption key")]
    NonceReuse,

    // --- Lifecycle errors ---
    #[error("Keychain is already initialized")]
    AlreadyInitialized,

    #[error("Keychain is not initialized")]
    NotInitialized,

    #[error("Keychain lock poisoned by a panicking thread")]
    Poisoned,

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Random source failed: {0}")]
    RandomSource(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl KeychainError {
    /// Authentication tag mismatch on a single entry.
    pub(crate) fn decryption() -> Self {
        Self::IntegrityError("decryption/authentication failed")
    }

    /// Aggregate tag mismatch, or a stale tag relative to a trusted reference.
    pub(crate) fn tampering() -> Self {
        Self::IntegrityError("tampering or rollback detected")
    }

    /// Returns `true` for failures that indicate tampering, rollback, or a
    /// wrong master password.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::IntegrityError(_))
    }
}

/// Convenience type alias for keychain results.
pub type Result<T> = std::result::Result<T, KeychainError>;

//! Fixed-length padding for stored passwords.
//!
//! Every password is right-padded with NUL bytes to `BLOCK_LEN` before
//! encryption, so all ciphertexts have the same length and the stored
//! file does not reveal how long each password is.  NUL is rejected in
//! input, which makes the padding unambiguous to strip.

use zeroize::{Zeroize, Zeroizing};

use crate::errors::{KeychainError, Result};

/// Maximum password length in bytes, and the size of every padded block.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Size of the padded plaintext block.
pub const BLOCK_LEN: usize = MAX_PASSWORD_LEN;

const PAD: u8 = 0;

/// Check that `password` can be stored.
pub fn validate(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(KeychainError::InvalidInput("password cannot be empty".into()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(KeychainError::InputTooLong {
            len: password.len(),
            max: MAX_PASSWORD_LEN,
        });
    }
    if password.as_bytes().contains(&PAD) {
        return Err(KeychainError::InvalidInput(
            "password cannot contain NUL characters".into(),
        ));
    }
    Ok(())
}

/// Pad `password` to exactly `BLOCK_LEN` bytes.
pub fn pad(password: &str) -> Result<Zeroizing<Vec<u8>>> {
    validate(password)?;
    let mut block = Zeroizing::new(Vec::with_capacity(BLOCK_LEN));
    block.extend_from_slice(password.as_bytes());
    block.resize(BLOCK_LEN, PAD);
    Ok(block)
}

/// A block containing nothing but padding.  Used for decoy entries.
pub fn empty_block() -> Zeroizing<Vec<u8>> {
    Zeroizing::new(vec![PAD; BLOCK_LEN])
}

/// Strip padding from a decrypted block and return the password.
///
/// An all-padding block yields the empty string.
pub fn unpad(mut block: Vec<u8>) -> Result<String> {
    if block.len() != BLOCK_LEN {
        let len = block.len();
        block.zeroize();
        return Err(KeychainError::FormatError(format!(
            "decrypted block is {len} bytes, expected {BLOCK_LEN}"
        )));
    }

    let end = block.iter().rposition(|&b| b != PAD).map_or(0, |i| i + 1);
    block.truncate(end);

    String::from_utf8(block).map_err(|e| {
        let mut bad = e.into_bytes();
        bad.zeroize();
        KeychainError::FormatError("decrypted password is not valid UTF-8".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_block_length() {
        let block = pad("pw123").unwrap();
        assert_eq!(block.len(), BLOCK_LEN);
        assert_eq!(&block[..5], b"pw123");
        assert!(block[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn unpad_restores_original() {
        let block = pad("héllo wörld").unwrap();
        assert_eq!(unpad(block.to_vec()).unwrap(), "héllo wörld");
    }

    #[test]
    fn max_length_fits_exactly() {
        let pw = "x".repeat(MAX_PASSWORD_LEN);
        let block = pad(&pw).unwrap();
        assert_eq!(unpad(block.to_vec()).unwrap(), pw);
    }

    #[test]
    fn rejects_too_long() {
        let pw = "x".repeat(MAX_PASSWORD_LEN + 1);
        assert!(matches!(
            pad(&pw),
            Err(KeychainError::InputTooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn rejects_nul_and_empty() {
        assert!(matches!(pad("a\0b"), Err(KeychainError::InvalidInput(_))));
        assert!(matches!(pad(""), Err(KeychainError::InvalidInput(_))));
    }

    #[test]
    fn empty_block_unpads_to_empty_string() {
        assert_eq!(unpad(empty_block().to_vec()).unwrap(), "");
    }

    #[test]
    fn unpad_rejects_wrong_size() {
        assert!(matches!(unpad(vec![b'a'; 10]), Err(KeychainError::FormatError(_))));
    }
}

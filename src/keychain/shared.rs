//! Thread-safe handle to a single keychain.
//!
//! `Keychain` operations take `&mut self` for mutations, so concurrent
//! callers serialize through a mutex.  A caller never observes a
//! half-applied mutation because each one runs to completion under the
//! lock.

use std::sync::{Arc, Mutex};

use super::manager::Keychain;
use crate::errors::{KeychainError, Result};

/// A cloneable, lock-protected `Keychain`.
#[derive(Debug, Clone)]
pub struct SharedKeychain {
    inner: Arc<Mutex<Keychain>>,
}

impl SharedKeychain {
    pub fn new(keychain: Keychain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(keychain)),
        }
    }

    /// Run `f` with exclusive access to the keychain.
    ///
    /// Fails with `Poisoned` if another thread panicked while holding the
    /// lock; the keychain may then be mid-mutation and is not handed out.
    pub fn with<T>(&self, f: impl FnOnce(&mut Keychain) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.lock().map_err(|_| KeychainError::Poisoned)?;
        f(&mut guard)
    }

    pub fn set(&self, domain: &str, password: &str) -> Result<()> {
        self.with(|kc| kc.set(domain, password))
    }

    pub fn get(&self, domain: &str) -> Result<String> {
        self.with(|kc| kc.get(domain))
    }

    pub fn remove(&self, domain: &str) -> Result<bool> {
        self.with(|kc| kc.remove(domain))
    }

    pub fn dump(&self) -> Result<(Vec<u8>, String)> {
        self.with(|kc| kc.dump())
    }
}

impl From<Keychain> for SharedKeychain {
    fn from(keychain: Keychain) -> Self {
        Self::new(keychain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_sets_all_land() {
        let mut kc = Keychain::new();
        kc.init("master").unwrap();
        let shared = SharedKeychain::new(kc);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .set(&format!("site{i}.com"), &format!("pw{i}"))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..4 {
            assert_eq!(shared.get(&format!("site{i}.com")).unwrap(), format!("pw{i}"));
        }
        assert!(shared.with(|kc| kc.verify_integrity()).is_ok());
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let mut kc = Keychain::new();
        kc.init("master").unwrap();
        let shared = SharedKeychain::new(kc);

        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _: Result<()> = poisoner.with(|_| panic!("boom"));
        })
        .join();

        assert!(matches!(shared.get("a.com"), Err(KeychainError::Poisoned)));
    }
}

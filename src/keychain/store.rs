//! In-memory key-value store: `StorageKey -> Entry`.
//!
//! No I/O and no crypto happens here.  A `BTreeMap` keeps iteration in
//! storage-key order, which is the order the integrity tag and the
//! serializer rely on.

use std::collections::BTreeMap;

use super::entry::{Entry, StorageKey};

/// The mapping of opaque storage keys to encrypted entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueStore {
    entries: BTreeMap<StorageKey, Entry>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping (e.g. one read from disk).
    pub fn from_entries(entries: BTreeMap<StorageKey, Entry>) -> Self {
        Self { entries }
    }

    /// Insert or replace an entry.  Returns the previous entry, if any.
    pub fn upsert(&mut self, key: StorageKey, entry: Entry) -> Option<Entry> {
        self.entries.insert(key, entry)
    }

    pub fn get(&self, key: &StorageKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Remove an entry.  Returns `true` if it was present.
    pub fn remove(&mut self, key: &StorageKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries, ordered by storage key.
    pub fn entries(&self) -> &BTreeMap<StorageKey, Entry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> StorageKey {
        StorageKey::try_from(c.to_string().repeat(64)).unwrap()
    }

    fn entry(b: u8) -> Entry {
        Entry {
            nonce: [b; 12],
            auth_tag: [b; 16],
            ciphertext: vec![b; 4],
        }
    }

    #[test]
    fn upsert_replaces_existing() {
        let mut store = KeyValueStore::new();
        assert!(store.upsert(key('a'), entry(1)).is_none());
        let previous = store.upsert(key('a'), entry(2));
        assert_eq!(previous, Some(entry(1)));
        assert_eq!(store.get(&key('a')), Some(&entry(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = KeyValueStore::new();
        store.upsert(key('b'), entry(1));
        assert!(store.remove(&key('b')));
        assert!(!store.remove(&key('b')));
        assert!(store.is_empty());
    }

    #[test]
    fn entries_are_ordered_by_key() {
        let mut store = KeyValueStore::new();
        store.upsert(key('f'), entry(1));
        store.upsert(key('0'), entry(2));
        store.upsert(key('a'), entry(3));
        let order: Vec<_> = store.entries().keys().map(|k| &k.as_str()[..1]).collect();
        assert_eq!(order, ["0", "a", "f"]);
    }

    #[test]
    fn clear_empties_store() {
        let mut store = KeyValueStore::new();
        store.upsert(key('c'), entry(1));
        store.clear();
        assert!(store.is_empty());
    }
}

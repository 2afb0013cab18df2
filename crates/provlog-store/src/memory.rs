//! In-memory implementation of the ChainStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use provlog_core::ChainEntry;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::ChainStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<u64, ChainEntry>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries, bypassing append checks.
    ///
    /// Later entries replace earlier ones with the same index. Useful for
    /// loading fixtures, including deliberately corrupted chains.
    pub fn from_entries(entries: impl IntoIterator<Item = ChainEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.index, e)).collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<u64, ChainEntry>>> {
        self.entries
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<u64, ChainEntry>>> {
        self.entries
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl ChainStore for MemoryStore {
    fn append(&self, entry: &ChainEntry) -> Result<()> {
        let mut entries = self.write()?;
        if entries.contains_key(&entry.index) {
            return Err(StoreError::DuplicateIndex(entry.index));
        }
        entries.insert(entry.index, entry.clone());
        debug!(index = entry.index, "appended entry to memory store");
        Ok(())
    }

    fn get_by_index(&self, index: u64) -> Result<Option<ChainEntry>> {
        Ok(self.read()?.get(&index).cloned())
    }

    fn get_latest(&self) -> Result<Option<ChainEntry>> {
        Ok(self.read()?.values().next_back().cloned())
    }

    fn get_all(&self) -> Result<Vec<ChainEntry>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }

    fn contains(&self, index: u64) -> Result<bool> {
        Ok(self.read()?.contains_key(&index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provlog_core::{hash_bytes, EntryBuilder, KeyPair};

    fn make_test_entry(keypair: &KeyPair, index: u64, previous_hash: &str) -> ChainEntry {
        EntryBuilder::new(index)
            .timestamp("2025-01-14T12:00:00.000Z")
            .artifact(hash_bytes(format!("frame {}", index).as_bytes()), format!("/frames/{}.jpg", index))
            .previous_hash(previous_hash)
            .sign(keypair)
    }

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let keypair = KeyPair::from_seed(&[1; 32]);

        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get_latest().unwrap().is_none());

        let e0 = make_test_entry(&keypair, 0, "");
        let e1 = make_test_entry(&keypair, 1, &e0.entry_hash);
        store.append(&e0).unwrap();
        store.append(&e1).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_by_index(0).unwrap(), Some(e0.clone()));
        assert_eq!(store.get_latest().unwrap(), Some(e1.clone()));
        assert_eq!(store.get_all().unwrap(), vec![e0, e1]);
        assert!(store.get_by_index(7).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let store = MemoryStore::new();
        let keypair = KeyPair::from_seed(&[1; 32]);
        let original = make_test_entry(&keypair, 0, "");
        store.append(&original).unwrap();

        let mut rival = make_test_entry(&keypair, 0, "");
        rival.artifact_ref = "/frames/other.jpg".into();
        let err = store.append(&rival).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIndex(0)));

        // The original is untouched
        assert_eq!(store.get_by_index(0).unwrap(), Some(original));
    }

    #[test]
    fn test_get_all_is_index_ordered() {
        let keypair = KeyPair::from_seed(&[1; 32]);
        let entries: Vec<_> = [3, 0, 2, 1]
            .into_iter()
            .map(|i| make_test_entry(&keypair, i, ""))
            .collect();
        let store = MemoryStore::from_entries(entries);

        let indices: Vec<u64> = store.get_all().unwrap().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(store.get_latest().unwrap().unwrap().index, 3);
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a signing key, an in-memory
//! store, and a temporary directory for artifact files.

use std::fs;
use std::path::PathBuf;

use provlog::{FsArtifacts, Ledger, MetadataSource, StaticMetadata, Verifier};
use provlog_core::{ChainEntry, KeyPair, Metadata};
use provlog_store::{ChainStore, MemoryStore};
use tempfile::TempDir;

/// A keypair, a memory store, and a scratch directory for artifacts.
pub struct TestChain {
    pub keypair: KeyPair,
    pub store: MemoryStore,
    dir: TempDir,
}

impl TestChain {
    /// Create a fixture with a fixed keypair.
    pub fn new() -> Self {
        Self::with_seed([0x42; 32])
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: KeyPair::from_seed(&seed),
            store: MemoryStore::new(),
            dir: tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {}", e)),
        }
    }

    /// A ledger over the fixture's store.
    pub fn ledger(&self) -> Ledger<'_, MemoryStore> {
        Ledger::new(&self.store, self.keypair.clone())
    }

    /// A verifier over the fixture's store and artifact directory.
    pub fn verifier(&self) -> Verifier<'_, MemoryStore, FsArtifacts> {
        self.verifier_for(&self.store)
    }

    /// A verifier over another store, resolving artifacts in this fixture.
    pub fn verifier_for<'s, S: ChainStore + ?Sized>(
        &self,
        store: &'s S,
    ) -> Verifier<'s, S, FsArtifacts> {
        Verifier::new(store, self.keypair.verify_key(), FsArtifacts::new())
    }

    /// Write an artifact file and return its path.
    pub fn write_artifact(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {}", path.display(), e));
        path
    }

    /// Write an artifact and record it with the given metadata.
    pub fn record_with(
        &self,
        name: &str,
        content: &[u8],
        source: &dyn MetadataSource,
    ) -> ChainEntry {
        let path = self.write_artifact(name, content);
        self.ledger()
            .record_artifact(&path, source)
            .unwrap_or_else(|e| panic!("record {}: {}", name, e))
    }

    /// Write an artifact and record it with empty metadata.
    pub fn record(&self, name: &str, content: &[u8]) -> ChainEntry {
        self.record_with(name, content, &StaticMetadata::new())
    }

    /// Record `count` artifacts named `frame_NNNN.jpg`.
    pub fn record_frames(&self, count: usize) -> Vec<ChainEntry> {
        (0..count)
            .map(|i| {
                let name = format!("frame_{:04}.jpg", i);
                self.record(&name, format!("frame {} pixels", i).as_bytes())
            })
            .collect()
    }

    /// A copy of the stored chain with `edit` applied, as a new store.
    ///
    /// Simulates an attacker with write access to the storage backend.
    pub fn tampered(&self, edit: impl FnOnce(&mut Vec<ChainEntry>)) -> MemoryStore {
        let mut entries = self
            .store
            .get_all()
            .unwrap_or_else(|e| panic!("read chain: {}", e));
        edit(&mut entries);
        MemoryStore::from_entries(entries)
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a metadata object from JSON text. Panics on invalid input.
pub fn metadata(json: &str) -> Metadata {
    serde_json::from_str(json).unwrap_or_else(|e| panic!("metadata {}: {}", json, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_chain() {
        let fixture = TestChain::new();
        let entries = fixture.record_frames(3);

        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[1].previous_hash, entries[0].entry_hash);
        assert_eq!(entries[2].previous_hash, entries[1].entry_hash);
        assert!(fixture.verifier().verify_full_chain().unwrap().is_valid());
    }

    #[test]
    fn test_tampered_copy_leaves_original() {
        let fixture = TestChain::new();
        fixture.record_frames(2);

        let forged = fixture.tampered(|entries| entries[1].timestamp = "1999".into());
        assert_eq!(forged.get_by_index(1).unwrap().unwrap().timestamp, "1999");
        assert_ne!(
            fixture.store.get_by_index(1).unwrap().unwrap().timestamp,
            "1999"
        );
    }

    #[test]
    fn test_metadata_helper() {
        let m = metadata(r#"{"b":1,"a":{"c":[true]}}"#);
        assert_eq!(m.len(), 2);
        assert_eq!(m["a"]["c"][0], true);
    }
}

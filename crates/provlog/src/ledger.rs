//! The Ledger: the single writer of the chain.
//!
//! Every new entry extends the current head. The ledger reads the latest
//! entry, signs the next one over it, and appends. The store's uniqueness
//! constraint on index is what keeps two writers from forking the chain.

use std::path::Path;

use provlog_core::{
    load_signing_key, now_timestamp, sign_entry, ChainEntry, KeyPair, KeyPaths,
    Metadata, VerifyKey,
};
use provlog_store::{ChainStore, StoreError};
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactResolver, FsArtifacts};
use crate::error::{Error, Result};
use crate::metadata::MetadataSource;

/// Appends signed entries to a borrowed store.
pub struct Ledger<'s, S: ChainStore + ?Sized> {
    store: &'s S,
    keypair: KeyPair,
}

impl<'s, S: ChainStore + ?Sized> Ledger<'s, S> {
    /// Create a ledger that signs with `keypair`.
    pub fn new(store: &'s S, keypair: KeyPair) -> Self {
        Self { store, keypair }
    }

    /// Create a ledger with the signing key loaded from disk.
    pub fn open(store: &'s S, keys: &KeyPaths) -> Result<Self> {
        let keypair = load_signing_key(&keys.private_key)?;
        info!(key = %keypair.verify_key(), "loaded signing key");
        Ok(Self::new(store, keypair))
    }

    /// The verification half of the signing key.
    pub fn verify_key(&self) -> VerifyKey {
        self.keypair.verify_key()
    }

    /// Sign and append a new entry stamped with the current time.
    pub fn record_entry(
        &self,
        artifact_hash: &str,
        artifact_ref: &str,
        metadata: Metadata,
    ) -> Result<ChainEntry> {
        self.record_entry_at(&now_timestamp(), artifact_hash, artifact_ref, metadata)
    }

    /// Sign and append a new entry with an explicit timestamp.
    ///
    /// A [`StoreError::DuplicateIndex`] on append means another writer took
    /// the index first. It surfaces as [`Error::ConcurrentAppendConflict`]
    /// and nothing is retried.
    pub fn record_entry_at(
        &self,
        timestamp: &str,
        artifact_hash: &str,
        artifact_ref: &str,
        metadata: Metadata,
    ) -> Result<ChainEntry> {
        let (index, previous_hash) = match self.store.get_latest()? {
            Some(latest) => {
                let index = latest.index.checked_add(1).ok_or(Error::IndexExhausted {
                    latest: latest.index,
                })?;
                (index, latest.entry_hash)
            }
            None => (0, String::new()),
        };

        let entry = sign_entry(
            &self.keypair,
            index,
            timestamp,
            artifact_hash,
            artifact_ref,
            &previous_hash,
            metadata,
        );

        match self.store.append(&entry) {
            Ok(()) => {}
            Err(StoreError::DuplicateIndex(index)) => {
                warn!(index, "append lost to a concurrent writer");
                return Err(Error::ConcurrentAppendConflict { index });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            index = entry.index,
            artifact = %entry.artifact_ref,
            entry_hash = %entry.entry_hash,
            "recorded entry"
        );
        Ok(entry)
    }

    /// Hash an artifact file and record it with metadata from `source`.
    ///
    /// The path text becomes the entry's `artifact_ref`, resolved against the
    /// working directory.
    pub fn record_artifact(
        &self,
        path: impl AsRef<Path>,
        source: &dyn MetadataSource,
    ) -> Result<ChainEntry> {
        let artifact_ref = path.as_ref().to_string_lossy();
        self.record_resolved(&FsArtifacts::new(), &artifact_ref, source)
    }

    /// Record the artifact `artifact_ref` names under `artifacts`.
    ///
    /// The digest is taken through the resolver a verifier would use, so the
    /// stored reference resolves to the same content on verification.
    pub fn record_resolved(
        &self,
        artifacts: &dyn ArtifactResolver,
        artifact_ref: &str,
        source: &dyn MetadataSource,
    ) -> Result<ChainEntry> {
        let artifact_hash = artifacts.digest(artifact_ref)?;
        debug!(artifact_ref, %artifact_hash, "hashed artifact");

        self.record_entry(&artifact_hash, artifact_ref, source.collect())
    }

    pub fn get_by_index(&self, index: u64) -> Result<Option<ChainEntry>> {
        Ok(self.store.get_by_index(index)?)
    }

    pub fn get_latest(&self) -> Result<Option<ChainEntry>> {
        Ok(self.store.get_latest()?)
    }

    pub fn get_all(&self) -> Result<Vec<ChainEntry>> {
        Ok(self.store.get_all()?)
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.store.count()?)
    }
}

//! Chain entries: the unit of the provenance log.
//!
//! An entry is immutable once signed. Its signature covers the canonical JSON
//! form of every field except `signature` and `entry_hash`; its entry hash
//! covers the canonical form followed by the hex signature text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;
use crate::crypto::{KeyPair, VerifyKey};

/// Free-form metadata attached to an entry. Signed, never interpreted.
pub type Metadata = serde_json::Map<String, Value>;

/// Field names of the signed form.
mod keys {
    pub const INDEX: &str = "index";
    pub const TIMESTAMP: &str = "timestamp";
    pub const ARTIFACT_HASH: &str = "artifact_hash";
    pub const ARTIFACT_REF: &str = "artifact_ref";
    pub const PREVIOUS_HASH: &str = "previous_hash";
    pub const METADATA: &str = "metadata";
}

/// A signed, hash-linked log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Position in the chain, 0 for genesis.
    pub index: u64,

    /// UTC capture time, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub timestamp: String,

    /// Opaque reference to the artifact (a file path).
    pub artifact_ref: String,

    /// Hex SHA-256 of the artifact content.
    pub artifact_hash: String,

    /// `entry_hash` of the predecessor, empty for genesis.
    pub previous_hash: String,

    #[serde(default)]
    pub metadata: Metadata,

    /// Hex Ed25519 signature over the canonical form.
    pub signature: String,

    /// Hex SHA-256 of canonical form followed by the signature hex.
    pub entry_hash: String,
}

impl ChainEntry {
    /// Whether this entry claims to be the chain's first.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Canonical bytes of the signed fields.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        signable_bytes(
            self.index,
            &self.timestamp,
            &self.artifact_hash,
            &self.artifact_ref,
            &self.previous_hash,
            &self.metadata,
        )
    }

    /// Recompute the entry hash from the stored fields.
    pub fn compute_entry_hash(&self) -> String {
        compute_entry_hash(&self.canonical_bytes(), &self.signature)
    }
}

/// Builder for signing a new entry.
#[derive(Debug, Clone, Default)]
pub struct EntryBuilder {
    index: u64,
    timestamp: String,
    artifact_hash: String,
    artifact_ref: String,
    previous_hash: String,
    metadata: Metadata,
}

impl EntryBuilder {
    /// Start an entry at the given chain position.
    pub fn new(index: u64) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the artifact digest and its external reference.
    pub fn artifact(mut self, hash: impl Into<String>, reference: impl Into<String>) -> Self {
        self.artifact_hash = hash.into();
        self.artifact_ref = reference.into();
        self
    }

    pub fn previous_hash(mut self, previous_hash: impl Into<String>) -> Self {
        self.previous_hash = previous_hash.into();
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sign the entry and derive its entry hash.
    pub fn sign(self, keypair: &KeyPair) -> ChainEntry {
        let canonical = signable_bytes(
            self.index,
            &self.timestamp,
            &self.artifact_hash,
            &self.artifact_ref,
            &self.previous_hash,
            &self.metadata,
        );
        let signature = keypair.sign_hex(&canonical);
        let entry_hash = compute_entry_hash(&canonical, &signature);

        ChainEntry {
            index: self.index,
            timestamp: self.timestamp,
            artifact_ref: self.artifact_ref,
            artifact_hash: self.artifact_hash,
            previous_hash: self.previous_hash,
            metadata: self.metadata,
            signature,
            entry_hash,
        }
    }
}

/// Build, sign, and hash a new entry.
pub fn sign_entry(
    keypair: &KeyPair,
    index: u64,
    timestamp: &str,
    artifact_hash: &str,
    artifact_ref: &str,
    previous_hash: &str,
    metadata: Metadata,
) -> ChainEntry {
    EntryBuilder::new(index)
        .timestamp(timestamp)
        .artifact(artifact_hash, artifact_ref)
        .previous_hash(previous_hash)
        .metadata(metadata)
        .sign(keypair)
}

/// Check the entry's signature against its canonical form.
pub fn verify_signature(key: &VerifyKey, entry: &ChainEntry) -> bool {
    key.verify(&entry.canonical_bytes(), &entry.signature)
}

/// Check that the stored entry hash matches the recomputed one.
pub fn verify_entry_hash(entry: &ChainEntry) -> bool {
    entry.compute_entry_hash() == entry.entry_hash
}

/// Hash of `canonical || utf8(signature_hex)`.
///
/// The signature enters the hash as its hex text, not as raw bytes.
pub fn compute_entry_hash(canonical: &[u8], signature_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    hasher.update(signature_hex.as_bytes());
    hex::encode(hasher.finalize())
}

/// The signed field set as a JSON object.
pub fn signable_value(
    index: u64,
    timestamp: &str,
    artifact_hash: &str,
    artifact_ref: &str,
    previous_hash: &str,
    metadata: &Metadata,
) -> Value {
    let mut fields = serde_json::Map::with_capacity(6);
    fields.insert(keys::INDEX.into(), Value::from(index));
    fields.insert(keys::TIMESTAMP.into(), Value::from(timestamp));
    fields.insert(keys::ARTIFACT_HASH.into(), Value::from(artifact_hash));
    fields.insert(keys::ARTIFACT_REF.into(), Value::from(artifact_ref));
    fields.insert(keys::PREVIOUS_HASH.into(), Value::from(previous_hash));
    fields.insert(keys::METADATA.into(), Value::Object(metadata.clone()));
    Value::Object(fields)
}

fn signable_bytes(
    index: u64,
    timestamp: &str,
    artifact_hash: &str,
    artifact_ref: &str,
    previous_hash: &str,
    metadata: &Metadata,
) -> Vec<u8> {
    canonicalize(&signable_value(
        index,
        timestamp,
        artifact_hash,
        artifact_ref,
        previous_hash,
        metadata,
    ))
}

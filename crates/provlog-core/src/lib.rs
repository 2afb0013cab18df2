//! # provlog core
//!
//! Pure primitives for the provenance log: keypairs, content hashing,
//! canonical JSON, and signed chain entries.
//!
//! This crate performs no storage and no networking. The only I/O is reading
//! artifacts to hash them and reading or writing key files.
//!
//! ## Key Types
//!
//! - [`ChainEntry`] - A signed, hash-linked log record
//! - [`KeyPair`] / [`VerifyKey`] - Ed25519 signing and verification halves
//! - [`EntryBuilder`] - Assembles and signs a new entry
//!
//! ## Canonicalization
//!
//! Entries are signed over sorted-key, whitespace-free JSON. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod timestamp;

pub use canonical::{canonical_string, canonicalize};
pub use crypto::{
    generate_keypair, hash_bytes, hash_file, hash_reader, load_signing_key, load_verify_key,
    KeyPair, KeyPaths, VerifyKey, HASH_CHUNK_SIZE, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE,
};
pub use entry::{
    compute_entry_hash, sign_entry, verify_entry_hash, verify_signature, ChainEntry, EntryBuilder,
    Metadata,
};
pub use error::{CoreError, Result};
pub use timestamp::{format_timestamp, now_timestamp, TIMESTAMP_FORMAT};

//! # provlog
//!
//! A tamper-evident, append-only provenance log. Each entry attests that an
//! artifact with a given SHA-256 digest existed at a given time, is signed
//! with Ed25519, and is hash-linked to its predecessor.
//!
//! ## Overview
//!
//! - [`Ledger`] appends new entries on top of the current chain head
//! - [`Verifier`] re-derives every signature, hash, and link of a stored chain
//! - [`Config`] locates keys, the database, and artifacts
//! - [`MetadataSource`] supplies the context signed into each entry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provlog::{Config, Ledger, StaticMetadata, Verifier};
//! use provlog::core::load_verify_key;
//! use provlog::store::SqliteStore;
//!
//! let config = Config::default();
//! let store = SqliteStore::open(&config.database).unwrap();
//!
//! let ledger = Ledger::open(&store, &config.key_paths()).unwrap();
//! let metadata = StaticMetadata::new().with("camera", "usb0");
//! ledger.record_artifact("frames/frame_0000.jpg", &metadata).unwrap();
//!
//! let key = load_verify_key(&config.key_paths().public_key).unwrap();
//! let report = Verifier::new(&store, key, config.artifacts())
//!     .verify_full_chain()
//!     .unwrap();
//! assert!(report.is_valid());
//! ```
//!
//! ## Re-exports
//!
//! - `provlog::core` - Keys, hashing, canonical JSON, entries
//! - `provlog::store` - Storage trait, SQLite and in-memory backends

pub mod artifact;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod verifier;

pub use provlog_core as core;
pub use provlog_store as store;

pub use artifact::{ArtifactResolver, FsArtifacts};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use metadata::{CompositeMetadata, MetadataSource, StaticMetadata};
pub use verifier::{verify_linkage, Failure, FailureKind, VerificationReport, Verifier};

pub use provlog_core::{ChainEntry, KeyPair, KeyPaths, Metadata, VerifyKey};
pub use provlog_store::{ChainStore, MemoryStore, SqliteStore};

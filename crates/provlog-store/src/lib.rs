//! # provlog store
//!
//! Storage abstraction for the provenance log. Provides a trait-based
//! interface for entry persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store abstracts entry storage behind the [`ChainStore`] trait, so the
//! ledger and verifier are storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for tests and embedding.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - Append-only, index-ordered entry storage
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ImportReport`] - Result of importing an exported chain
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provlog_store::{ChainStore, SqliteStore};
//!
//! let store = SqliteStore::open("data/chain.db").unwrap();
//! if let Some(latest) = store.get_latest().unwrap() {
//!     println!("chain head is entry {}", latest.index);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only**: There is no update or delete
//! - **Unique index**: Appending an existing index fails with `DuplicateIndex`
//! - **Opaque crypto**: Hashes and signatures are stored as given

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;
pub mod transfer;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::ChainStore;
pub use transfer::{export_file, export_json, import_file, import_json, ImportReport};

//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entry already occupies this index. Entries are never overwritten.
    #[error("an entry with index {0} already exists")]
    DuplicateIndex(u64),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entry serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the store was poisoned by a panicking thread.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    /// Whether this error is a uniqueness violation on the entry index.
    pub fn is_duplicate_index(&self) -> bool {
        matches!(self, StoreError::DuplicateIndex(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

//! ChainStore trait: the minimal interface for entry persistence.
//!
//! The store treats hashes and signatures as opaque strings. It enforces one
//! rule only: an index is written at most once.

use provlog_core::ChainEntry;

use crate::error::Result;

/// Append-only, index-ordered storage for chain entries.
///
/// Implementations can be in-memory or SQLite. The ledger and verifier only
/// need these operations; there is deliberately no update or delete.
pub trait ChainStore: Send + Sync {
    /// Persist a new entry.
    ///
    /// Fails with [`StoreError::DuplicateIndex`](crate::StoreError::DuplicateIndex)
    /// if an entry with the same index exists. All fields are committed
    /// together or not at all.
    fn append(&self, entry: &ChainEntry) -> Result<()>;

    /// Get the entry at `index`.
    fn get_by_index(&self, index: u64) -> Result<Option<ChainEntry>>;

    /// Get the entry with the highest index.
    fn get_latest(&self) -> Result<Option<ChainEntry>>;

    /// Get every entry, ordered by ascending index.
    fn get_all(&self) -> Result<Vec<ChainEntry>>;

    /// Number of stored entries.
    fn count(&self) -> Result<u64>;

    /// Whether an entry exists at `index`.
    fn contains(&self, index: u64) -> Result<bool> {
        Ok(self.get_by_index(index)?.is_some())
    }
}

impl<S: ChainStore + ?Sized> ChainStore for &S {
    fn append(&self, entry: &ChainEntry) -> Result<()> {
        (**self).append(entry)
    }

    fn get_by_index(&self, index: u64) -> Result<Option<ChainEntry>> {
        (**self).get_by_index(index)
    }

    fn get_latest(&self) -> Result<Option<ChainEntry>> {
        (**self).get_latest()
    }

    fn get_all(&self) -> Result<Vec<ChainEntry>> {
        (**self).get_all()
    }

    fn count(&self) -> Result<u64> {
        (**self).count()
    }

    fn contains(&self, index: u64) -> Result<bool> {
        (**self).contains(index)
    }
}

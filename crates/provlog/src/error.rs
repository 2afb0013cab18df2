//! Error types for the ledger and verifier.

use provlog_core::CoreError;
use provlog_store::StoreError;
use thiserror::Error;

/// Errors raised by ledger, verifier, and configuration operations.
///
/// Integrity problems found while verifying are not errors; they are
/// collected into a [`VerificationReport`](crate::VerificationReport).
#[derive(Debug, Error)]
pub enum Error {
    /// Key, hashing, or encoding error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Another writer appended the same index first.
    #[error("concurrent append conflict: index {index} was taken by another writer")]
    ConcurrentAppendConflict { index: u64 },

    /// The chain head already holds the largest representable index.
    #[error("chain index space exhausted after index {latest}")]
    IndexExhausted { latest: u64 },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for ledger and verifier operations.
pub type Result<T> = std::result::Result<T, Error>;

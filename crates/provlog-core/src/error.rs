//! Error types for the provenance log core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by key handling, hashing, and encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key file does not exist at the configured location.
    #[error("key not found: {path}")]
    KeyNotFound { path: PathBuf },

    /// A key was present but could not be decoded.
    #[error("malformed key in {origin}: {reason}")]
    KeyFormat { origin: String, reason: String },

    /// The OS entropy source failed while generating a keypair.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The referenced artifact is missing or unreadable.
    #[error("artifact missing or unreadable: {path}: {source}")]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while persisting keys.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

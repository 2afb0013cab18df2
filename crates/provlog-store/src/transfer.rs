//! Export and import of whole chains as JSON.
//!
//! The interchange format is a JSON array of entry records ordered by index.
//! Import never overwrites: entries whose index is already present are
//! skipped and counted.

use std::fs;
use std::path::Path;

use provlog_core::ChainEntry;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::traits::ChainStore;

/// Report from an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries written to the target store.
    pub imported: usize,
    /// Entries whose index already existed in the target store.
    pub skipped: usize,
}

/// Serialize every stored entry as a pretty-printed JSON array.
pub fn export_json<S: ChainStore + ?Sized>(store: &S) -> Result<String> {
    let entries = store.get_all()?;
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Write the chain to `path` as JSON. Returns the number of entries written.
pub fn export_file<S: ChainStore + ?Sized>(store: &S, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let entries = store.get_all()?;
    let json = serde_json::to_string_pretty(&entries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;

    info!(path = %path.display(), entries = entries.len(), "exported chain");
    Ok(entries.len())
}

/// Append entries from a JSON array, skipping indices already present.
///
/// Entries are applied in ascending index order. Nothing is re-signed or
/// verified here; run the verifier afterwards.
pub fn import_json<S: ChainStore + ?Sized>(store: &S, json: &str) -> Result<ImportReport> {
    let mut entries: Vec<ChainEntry> = serde_json::from_str(json)?;
    entries.sort_by_key(|e| e.index);

    let mut report = ImportReport::default();
    for entry in &entries {
        if store.contains(entry.index)? {
            report.skipped += 1;
            continue;
        }
        match store.append(entry) {
            Ok(()) => report.imported += 1,
            // Same index repeated within the file
            Err(StoreError::DuplicateIndex(index)) => {
                debug!(index, "skipping duplicate index in import");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Import a chain previously written by [`export_file`].
pub fn import_file<S: ChainStore + ?Sized>(
    store: &S,
    path: impl AsRef<Path>,
) -> Result<ImportReport> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let report = import_json(store, &json)?;
    info!(
        path = %path.display(),
        imported = report.imported,
        skipped = report.skipped,
        "imported chain"
    );
    Ok(report)
}

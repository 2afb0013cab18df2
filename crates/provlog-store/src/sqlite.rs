//! SQLite implementation of the ChainStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite.
//! File databases run in WAL mode so readers only ever observe committed rows
//! while the writer appends.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use provlog_core::{canonical_string, ChainEntry, Metadata};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::ChainStore;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "entry_index, timestamp, artifact_ref, artifact_hash, \
     previous_hash, metadata, signature, entry_hash";

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex around the single connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and its parent directories) and runs migrations if
    /// it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        migration::migrate(&mut conn)?;

        info!(path = %path.display(), journal_mode = %mode, "opened chain database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

/// Raw column values of one `chain_entries` row.
struct EntryRow {
    index: i64,
    timestamp: String,
    artifact_ref: String,
    artifact_hash: String,
    previous_hash: String,
    metadata: String,
    signature: String,
    entry_hash: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            index: row.get("entry_index")?,
            timestamp: row.get("timestamp")?,
            artifact_ref: row.get("artifact_ref")?,
            artifact_hash: row.get("artifact_hash")?,
            previous_hash: row.get("previous_hash")?,
            metadata: row.get("metadata")?,
            signature: row.get("signature")?,
            entry_hash: row.get("entry_hash")?,
        })
    }

    fn into_entry(self) -> Result<ChainEntry> {
        let index = u64::try_from(self.index).map_err(|_| {
            StoreError::InvalidData(format!("negative entry index {}", self.index))
        })?;
        let metadata: Metadata = serde_json::from_str(&self.metadata)?;

        Ok(ChainEntry {
            index,
            timestamp: self.timestamp,
            artifact_ref: self.artifact_ref,
            artifact_hash: self.artifact_hash,
            previous_hash: self.previous_hash,
            metadata,
            signature: self.signature,
            entry_hash: self.entry_hash,
        })
    }
}

fn to_sql_index(index: u64) -> Result<i64> {
    i64::try_from(index)
        .map_err(|_| StoreError::InvalidData(format!("entry index {} exceeds SQLite range", index)))
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl ChainStore for SqliteStore {
    fn append(&self, entry: &ChainEntry) -> Result<()> {
        let index = to_sql_index(entry.index)?;
        let metadata = canonical_string(&Value::Object(entry.metadata.clone()));

        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO chain_entries (
                    entry_index, timestamp, artifact_ref, artifact_hash,
                    previous_hash, metadata, signature, entry_hash
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    index,
                    entry.timestamp,
                    entry.artifact_ref,
                    entry.artifact_hash,
                    entry.previous_hash,
                    metadata,
                    entry.signature,
                    entry.entry_hash,
                ],
            );

            match inserted {
                Ok(_) => {
                    debug!(index = entry.index, "appended entry to sqlite store");
                    Ok(())
                }
                Err(e) if is_primary_key_violation(&e) => {
                    Err(StoreError::DuplicateIndex(entry.index))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_by_index(&self, index: u64) -> Result<Option<ChainEntry>> {
        let Ok(index) = i64::try_from(index) else {
            return Ok(None);
        };

        let row = self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM chain_entries WHERE entry_index = ?1",
                    SELECT_COLUMNS
                ),
                params![index],
                EntryRow::from_row,
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        row.map(EntryRow::into_entry).transpose()
    }

    fn get_latest(&self) -> Result<Option<ChainEntry>> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM chain_entries ORDER BY entry_index DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                [],
                EntryRow::from_row,
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        row.map(EntryRow::into_entry).transpose()
    }

    fn get_all(&self) -> Result<Vec<ChainEntry>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM chain_entries ORDER BY entry_index ASC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], EntryRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    fn count(&self) -> Result<u64> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM chain_entries", [], |row| row.get(0))
                .map_err(StoreError::from)
        })?;
        Ok(count as u64)
    }

    fn contains(&self, index: u64) -> Result<bool> {
        let Ok(index) = i64::try_from(index) else {
            return Ok(false);
        };
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT entry_index FROM chain_entries WHERE entry_index = ?1",
                    params![index],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

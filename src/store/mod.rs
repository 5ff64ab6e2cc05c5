//! SQLite-backed metrics store
//!
//! Two append-only tables: `performance_metrics` (one row per benchmark
//! observation) and `regression_alerts` (derived). Writes that touch more than
//! one row run inside an RAII transaction, which rolls back if dropped before
//! `commit()`.
//!
//! Concurrent CI jobs writing the same database are serialized by SQLite
//! itself (WAL + busy timeout); the store does no locking of its own.

mod alerts;
mod metrics;
mod retention;
mod schema;

pub use metrics::StoreStats;
pub use retention::PruneReport;

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent store of metric records and alerts
pub struct MetricsStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl MetricsStore {
    /// Open (creating if needed) the database at `path` and apply migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StorageError::sqlite("open database"))?;
        schema::apply_pragmas(&conn, true)?;
        schema::migrate(&conn)?;

        tracing::debug!("opened metrics store at {}", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(StorageError::sqlite("open in-memory database"))?;
        schema::apply_pragmas(&conn, false)?;
        schema::migrate(&conn)?;

        Ok(Self { conn, path: None })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        schema::user_version(&self.conn)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(column: &'static str, ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| StorageError::CorruptRow {
        column,
        detail: format!("timestamp {} ms out of range", ms),
    })
}

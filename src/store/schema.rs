//! Schema and migrations
//!
//! Migrations are additive only. `PRAGMA user_version` records the last one
//! applied.

use crate::error::StorageError;
use rusqlite::Connection;

pub(crate) const SCHEMA_VERSION: i64 = 1;

const V001_INITIAL: &str = r#"
CREATE TABLE IF NOT EXISTS performance_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    benchmark_name TEXT NOT NULL,
    platform TEXT NOT NULL,
    execution_time_ns REAL NOT NULL,
    memory_usage REAL NOT NULL,
    quality_score REAL NOT NULL,
    timestamp INTEGER NOT NULL,
    commit_hash TEXT NOT NULL,
    branch TEXT NOT NULL,
    pr_number INTEGER,
    environment_info TEXT
);

CREATE TABLE IF NOT EXISTS regression_alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    benchmark_name TEXT NOT NULL,
    platform TEXT NOT NULL,
    severity TEXT NOT NULL,
    current_value REAL NOT NULL,
    baseline_value REAL NOT NULL,
    change_percent REAL NOT NULL,
    statistical_significance REAL NOT NULL,
    baseline_sample_size INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    commit_hash TEXT NOT NULL,
    recommendation TEXT NOT NULL,
    resolved INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

-- Baseline lookups: key equality + timestamp range.
CREATE INDEX IF NOT EXISTS idx_metrics_benchmark_platform
    ON performance_metrics(benchmark_name, platform, timestamp);

-- Alert listing: unresolved by recency, optionally per severity.
CREATE INDEX IF NOT EXISTS idx_alerts_severity
    ON regression_alerts(severity, resolved, created_at);
"#;

pub(crate) fn apply_pragmas(conn: &Connection, on_disk: bool) -> Result<(), StorageError> {
    let pragmas = if on_disk {
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;"
    } else {
        "PRAGMA busy_timeout = 5000;"
    };

    conn.execute_batch(pragmas)
        .map_err(StorageError::sqlite("apply pragmas"))
}

pub(crate) fn user_version(conn: &Connection) -> Result<i64, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(StorageError::sqlite("read schema version"))
}

pub(crate) fn migrate(conn: &Connection) -> Result<(), StorageError> {
    let current = user_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(StorageError::sqlite("begin migration"))?;

    if current < 1 {
        tx.execute_batch(V001_INITIAL)
            .map_err(StorageError::sqlite("migration v001"))?;
    }

    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(StorageError::sqlite("write schema version"))?;
    tx.commit().map_err(StorageError::sqlite("commit migration"))?;

    tracing::info!(
        "migrated metrics store from schema v{} to v{}",
        current,
        SCHEMA_VERSION
    );
    Ok(())
}

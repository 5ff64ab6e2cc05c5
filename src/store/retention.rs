//! Retention for the metrics store
//!
//! Metrics are aged by their observation `timestamp`, alerts by `created_at`.
//! Both deletes share one transaction. The optional optimize pass afterwards
//! is best effort: its failures are logged and never fail the prune.

use super::{to_millis, MetricsStore};
use crate::error::StorageError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

/// What a prune removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub metrics_removed: u64,
    pub alerts_removed: u64,
    pub duration_ms: u64,
}

impl PruneReport {
    pub fn total_removed(&self) -> u64 {
        self.metrics_removed + self.alerts_removed
    }
}

fn delete_older_than(
    conn: &Connection,
    table: &str,
    time_column: &str,
    cutoff_ms: i64,
) -> Result<u64, StorageError> {
    // table/column names are fixed strings from this module
    let sql = format!("DELETE FROM {table} WHERE {time_column} < ?1");
    let deleted = conn
        .execute(&sql, params![cutoff_ms])
        .map_err(StorageError::sqlite("retention delete"))?;
    Ok(deleted as u64)
}

impl MetricsStore {
    /// Delete everything older than `now - horizon`
    ///
    /// A zero (or negative) horizon removes every row, including rows stamped
    /// at or after `now`. A horizon too large to subtract from `now` removes
    /// nothing.
    pub fn prune(&self, horizon: Duration, now: DateTime<Utc>) -> Result<PruneReport, StorageError> {
        let start = std::time::Instant::now();

        let cutoff_ms = if horizon <= Duration::zero() {
            i64::MAX
        } else {
            match now.checked_sub_signed(horizon) {
                Some(cutoff) => to_millis(cutoff),
                None => {
                    tracing::debug!("retention horizon exceeds representable time, nothing to prune");
                    return Ok(PruneReport::default());
                }
            }
        };

        // RAII transaction: rolls back on drop unless committed
        let tx = self
            .conn()
            .unchecked_transaction()
            .map_err(StorageError::sqlite("begin prune"))?;

        let metrics_removed = delete_older_than(&tx, "performance_metrics", "timestamp", cutoff_ms)?;
        let alerts_removed = delete_older_than(&tx, "regression_alerts", "created_at", cutoff_ms)?;

        tx.commit().map_err(StorageError::sqlite("commit prune"))?;

        let report = PruneReport {
            metrics_removed,
            alerts_removed,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "pruned {} metrics and {} alerts with a {} day horizon",
            report.metrics_removed,
            report.alerts_removed,
            horizon.num_days()
        );

        Ok(report)
    }

    /// Refresh planner statistics and compact the file
    pub fn optimize(&self, vacuum: bool) -> Result<(), StorageError> {
        self.conn()
            .execute_batch("ANALYZE; PRAGMA optimize;")
            .map_err(StorageError::sqlite("analyze"))?;

        if vacuum {
            self.conn()
                .execute_batch("VACUUM;")
                .map_err(StorageError::sqlite("vacuum"))?;
        }

        Ok(())
    }

    /// `prune` followed by a best-effort `optimize`
    pub fn prune_and_optimize(
        &self,
        horizon: Duration,
        now: DateTime<Utc>,
        vacuum: bool,
    ) -> Result<PruneReport, StorageError> {
        let report = self.prune(horizon, now)?;

        if let Err(e) = self.optimize(vacuum) {
            tracing::warn!("store optimization failed after prune: {}", e);
        }

        Ok(report)
    }
}

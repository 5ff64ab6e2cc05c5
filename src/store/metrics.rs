//! Queries for the performance_metrics table

use super::{from_millis, to_millis, MetricsStore};
use crate::error::StorageError;
use crate::metric::MetricRecord;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

const METRIC_COLUMNS: &str = "benchmark_name, platform, execution_time_ns, memory_usage, \
     quality_score, timestamp, commit_hash, branch, pr_number, environment_info";

/// Size and coverage of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub metrics: u64,
    pub alerts: u64,
    pub unresolved_alerts: u64,
    pub platforms: u64,
    pub benchmarks: u64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

struct MetricRow {
    benchmark_name: String,
    platform: String,
    execution_time_ns: f64,
    memory_usage: f64,
    quality_score: f64,
    timestamp_ms: i64,
    commit_hash: String,
    branch: String,
    pr_number: Option<i64>,
    environment_info: Option<String>,
}

impl MetricRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            benchmark_name: row.get(0)?,
            platform: row.get(1)?,
            execution_time_ns: row.get(2)?,
            memory_usage: row.get(3)?,
            quality_score: row.get(4)?,
            timestamp_ms: row.get(5)?,
            commit_hash: row.get(6)?,
            branch: row.get(7)?,
            pr_number: row.get(8)?,
            environment_info: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<MetricRecord, StorageError> {
        let timestamp = from_millis("timestamp", self.timestamp_ms)?;
        let environment_info = self
            .environment_info
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| StorageError::CorruptRow {
                    column: "environment_info",
                    detail: e.to_string(),
                })
            })
            .transpose()?;

        Ok(MetricRecord::from_stored(
            self.benchmark_name,
            self.platform,
            self.execution_time_ns,
            self.memory_usage,
            self.quality_score,
            timestamp,
            self.commit_hash,
            self.branch,
            self.pr_number,
            environment_info,
        ))
    }
}

impl MetricsStore {
    /// Append records in one transaction
    ///
    /// No deduplication: inserting the same record twice stores it twice.
    pub fn insert(&self, records: &[MetricRecord]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn()
            .unchecked_transaction()
            .map_err(StorageError::sqlite("begin insert metrics"))?;

        {
            let mut stmt = tx
                .prepare_cached(&format!(
                    "INSERT INTO performance_metrics ({METRIC_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ))
                .map_err(StorageError::sqlite("prepare insert metrics"))?;

            for record in records {
                let env_json = record.environment_info().map(|v| v.to_string());
                stmt.execute(params![
                    record.benchmark_name(),
                    record.platform(),
                    record.execution_time_ns(),
                    record.memory_usage(),
                    record.quality_score(),
                    to_millis(record.timestamp()),
                    record.commit_hash(),
                    record.branch(),
                    record.pr_number(),
                    env_json,
                ])
                .map_err(StorageError::sqlite("insert metric"))?;
            }
        }

        tx.commit().map_err(StorageError::sqlite("commit insert metrics"))?;

        tracing::debug!("stored {} metric records", records.len());
        Ok(records.len())
    }

    /// Stable-branch records for one key with `timestamp` in
    /// `[reference_time - lookback, reference_time)`, newest first
    pub fn query_baseline(
        &self,
        benchmark_name: &str,
        platform: &str,
        stable_branch: &str,
        lookback: Duration,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<MetricRecord>, StorageError> {
        let upper = to_millis(reference_time);
        let lower = reference_time
            .checked_sub_signed(lookback)
            .map(to_millis)
            .unwrap_or(i64::MIN);

        let mut stmt = self
            .conn()
            .prepare_cached(&format!(
                "SELECT {METRIC_COLUMNS}
                 FROM performance_metrics
                 WHERE benchmark_name = ?1 AND platform = ?2
                   AND timestamp >= ?3 AND timestamp < ?4
                   AND branch = ?5
                 ORDER BY timestamp DESC, id DESC"
            ))
            .map_err(StorageError::sqlite("prepare baseline query"))?;

        let rows = stmt
            .query_map(
                params![benchmark_name, platform, lower, upper, stable_branch],
                MetricRow::from_row,
            )
            .map_err(StorageError::sqlite("baseline query"))?;

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(StorageError::sqlite("read baseline row"))?;
            records.push(row.into_record()?);
        }

        Ok(records)
    }

    /// Total metric rows
    pub fn count_metrics(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM performance_metrics", [], |r| r.get(0))
            .map_err(StorageError::sqlite("count metrics"))?;
        Ok(count as u64)
    }

    pub fn stats(&self) -> Result<StoreStats, StorageError> {
        let conn = self.conn();

        let (metrics, platforms, benchmarks, earliest, latest): (
            i64,
            i64,
            i64,
            Option<i64>,
            Option<i64>,
        ) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT platform), COUNT(DISTINCT benchmark_name),
                        MIN(timestamp), MAX(timestamp)
                 FROM performance_metrics",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .map_err(StorageError::sqlite("metrics stats"))?;

        let (alerts, unresolved): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN resolved = 0 THEN 1 ELSE 0 END), 0)
                 FROM regression_alerts",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .map_err(StorageError::sqlite("alert stats"))?;

        Ok(StoreStats {
            metrics: metrics as u64,
            alerts: alerts as u64,
            unresolved_alerts: unresolved as u64,
            platforms: platforms as u64,
            benchmarks: benchmarks as u64,
            earliest: earliest.map(|ms| from_millis("timestamp", ms)).transpose()?,
            latest: latest.map(|ms| from_millis("timestamp", ms)).transpose()?,
        })
    }
}

//! Queries for the regression_alerts table

use super::{from_millis, to_millis, MetricsStore};
use crate::alert::{Alert, AlertId, Severity};
use crate::error::StorageError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};

const ALERT_COLUMNS: &str = "id, benchmark_name, platform, severity, current_value, \
     baseline_value, change_percent, statistical_significance, baseline_sample_size, \
     timestamp, commit_hash, recommendation, resolved, created_at";

struct AlertRow {
    id: i64,
    benchmark_name: String,
    platform: String,
    severity: String,
    current_value: f64,
    baseline_value: f64,
    change_percent: f64,
    statistical_significance: f64,
    baseline_sample_size: i64,
    timestamp_ms: i64,
    commit_hash: String,
    recommendation: String,
    resolved: bool,
    created_ms: i64,
}

impl AlertRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            benchmark_name: row.get(1)?,
            platform: row.get(2)?,
            severity: row.get(3)?,
            current_value: row.get(4)?,
            baseline_value: row.get(5)?,
            change_percent: row.get(6)?,
            statistical_significance: row.get(7)?,
            baseline_sample_size: row.get(8)?,
            timestamp_ms: row.get(9)?,
            commit_hash: row.get(10)?,
            recommendation: row.get(11)?,
            resolved: row.get(12)?,
            created_ms: row.get(13)?,
        })
    }

    fn into_alert(self) -> Result<Alert, StorageError> {
        let severity: Severity = self
            .severity
            .parse()
            .map_err(|detail| StorageError::CorruptRow {
                column: "severity",
                detail,
            })?;

        Ok(Alert {
            id: Some(self.id),
            benchmark_name: self.benchmark_name,
            platform: self.platform,
            severity,
            current_value: self.current_value,
            baseline_value: self.baseline_value,
            change_percent: self.change_percent,
            statistical_significance: self.statistical_significance,
            baseline_sample_size: self.baseline_sample_size.max(0) as usize,
            timestamp: from_millis("timestamp", self.timestamp_ms)?,
            commit_hash: self.commit_hash,
            recommendation: self.recommendation,
            resolved: self.resolved,
            created_at: from_millis("created_at", self.created_ms)?,
        })
    }
}

impl MetricsStore {
    /// Persist one alert and return its row id
    ///
    /// Alerts carrying the `none` tier are rejected; that tier never leaves
    /// the analyzer.
    pub fn insert_alert(&self, alert: &Alert) -> Result<AlertId, StorageError> {
        if !alert.severity.is_alerting() {
            return Err(StorageError::NonAlertingSeverity {
                benchmark: alert.benchmark_name.clone(),
            });
        }

        self.conn()
            .prepare_cached(
                "INSERT INTO regression_alerts
                 (benchmark_name, platform, severity, current_value, baseline_value,
                  change_percent, statistical_significance, baseline_sample_size,
                  timestamp, commit_hash, recommendation, resolved, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    alert.benchmark_name,
                    alert.platform,
                    alert.severity.as_str(),
                    alert.current_value,
                    alert.baseline_value,
                    alert.change_percent,
                    alert.statistical_significance,
                    alert.baseline_sample_size as i64,
                    to_millis(alert.timestamp),
                    alert.commit_hash,
                    alert.recommendation,
                    alert.resolved,
                    to_millis(alert.created_at),
                ])
            })
            .map_err(StorageError::sqlite("insert alert"))?;

        Ok(self.conn().last_insert_rowid())
    }

    /// Alerts created within `[now - lookback, now]`, newest first
    pub fn query_alerts(
        &self,
        unresolved_only: bool,
        lookback: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, StorageError> {
        let upper = to_millis(now);
        let lower = now
            .checked_sub_signed(lookback)
            .map(to_millis)
            .unwrap_or(i64::MIN);

        let sql = if unresolved_only {
            format!(
                "SELECT {ALERT_COLUMNS} FROM regression_alerts
                 WHERE created_at >= ?1 AND created_at <= ?2 AND resolved = 0
                 ORDER BY created_at DESC, id DESC"
            )
        } else {
            format!(
                "SELECT {ALERT_COLUMNS} FROM regression_alerts
                 WHERE created_at >= ?1 AND created_at <= ?2
                 ORDER BY created_at DESC, id DESC"
            )
        };

        let mut stmt = self
            .conn()
            .prepare_cached(&sql)
            .map_err(StorageError::sqlite("prepare alert query"))?;

        let rows = stmt
            .query_map(params![lower, upper], AlertRow::from_row)
            .map_err(StorageError::sqlite("alert query"))?;

        let mut alerts = Vec::new();
        for row in rows {
            let row = row.map_err(StorageError::sqlite("read alert row"))?;
            alerts.push(row.into_alert()?);
        }

        Ok(alerts)
    }

    /// Mark an alert resolved; returns false if no such alert exists
    pub fn resolve_alert(&self, id: AlertId) -> Result<bool, StorageError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE regression_alerts SET resolved = 1 WHERE id = ?1",
                params![id],
            )
            .map_err(StorageError::sqlite("resolve alert"))?;
        Ok(changed > 0)
    }
}

// Baseline selection
//
// Rolling window is the primary strategy: every stable-branch record for the
// key inside the lookback window that strictly precedes the current record.
// Split sample is a fallback for keys with no stored history at all, where
// the only data is a flat batch of same-run samples: first half by arrival
// order is the baseline, the mean of the second half is the current value.

use crate::config::DetectorConfig;
use crate::error::StorageError;
use crate::metric::MetricRecord;
use crate::regression::statistics::mean;
use crate::store::MetricsStore;
use chrono::Duration;
use serde::Serialize;
use std::fmt;

/// How a baseline was assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineStrategy {
    RollingWindow,
    SplitSample,
}

impl fmt::Display for BaselineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineStrategy::RollingWindow => f.write_str("rolling-window"),
            BaselineStrategy::SplitSample => f.write_str("split-sample"),
        }
    }
}

/// Historical execution times a current value is compared against
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub strategy: BaselineStrategy,
    /// Execution times (ns), newest first for rolling windows, arrival order
    /// for split samples
    pub samples: Vec<f64>,
}

impl Baseline {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One pending comparison: a current value, its provenance record and baseline
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Record the alert is attributed to
    pub record: MetricRecord,
    /// Execution time under test (ns)
    pub current_value: f64,
    pub baseline: Baseline,
}

/// Chooses baseline populations from the store or, as a fallback, the batch
#[derive(Debug, Clone)]
pub struct BaselineSelector {
    stable_branch: String,
    lookback: Duration,
    split_sample_fallback: bool,
}

impl BaselineSelector {
    pub fn new(stable_branch: impl Into<String>, lookback: Duration) -> Self {
        Self {
            stable_branch: stable_branch.into(),
            lookback,
            split_sample_fallback: true,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            stable_branch: config.stable_branch.clone(),
            lookback: config.lookback_window(),
            split_sample_fallback: config.split_sample_fallback,
        }
    }

    pub fn split_sample_fallback(&self) -> bool {
        self.split_sample_fallback
    }

    /// Rolling-window comparison for one record
    ///
    /// The window ends at the record's own timestamp (exclusive), so a
    /// baseline never contains the record itself or anything after it.
    pub fn rolling_window(
        &self,
        store: &MetricsStore,
        record: &MetricRecord,
    ) -> Result<Comparison, StorageError> {
        let history = store.query_baseline(
            record.benchmark_name(),
            record.platform(),
            &self.stable_branch,
            self.lookback,
            record.timestamp(),
        )?;

        tracing::debug!(
            "{}: {} baseline records in rolling window",
            record.key(),
            history.len()
        );

        Ok(Comparison {
            record: record.clone(),
            current_value: record.execution_time_ns(),
            baseline: Baseline {
                strategy: BaselineStrategy::RollingWindow,
                samples: history.iter().map(|r| r.execution_time_ns()).collect(),
            },
        })
    }

    /// Split a batch of same-key records (arrival order) into baseline and current
    ///
    /// With an even split, `[a, b, c, d]` compares `mean(c, d)` against
    /// `[a, b]`. A single record cannot be split and yields `None`. The
    /// comparison is attributed to the last record of the batch.
    pub fn split_sample(&self, batch: &[MetricRecord]) -> Option<Comparison> {
        if batch.len() < 2 {
            return None;
        }

        let mid = batch.len() / 2;
        let (baseline, current) = batch.split_at(mid);

        let current_times: Vec<f64> = current.iter().map(|r| r.execution_time_ns()).collect();
        let current_value = mean(&current_times)?;
        let record = current.last()?.clone();

        tracing::debug!(
            "{}: split-sample fallback ({} baseline / {} current)",
            record.key(),
            baseline.len(),
            current.len()
        );

        Some(Comparison {
            record,
            current_value,
            baseline: Baseline {
                strategy: BaselineStrategy::SplitSample,
                samples: baseline.iter().map(|r| r.execution_time_ns()).collect(),
            },
        })
    }
}

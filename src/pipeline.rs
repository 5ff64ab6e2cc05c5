//! Detection pipeline for one CI invocation
//!
//! validate -> select baselines -> insert batch -> analyze -> persist alerts
//!
//! Baselines are selected before the batch is inserted, so every record is
//! compared against the store as it was before this run. Records of the same
//! run never appear in each other's rolling-window baselines.

use crate::alert::Alert;
use crate::config::DetectorConfig;
use crate::error::{AnalysisError, StorageError, ValidationError};
use crate::metric::{MetricKey, MetricRecord, RawMetric, RunContext};
use crate::regression::{AnalysisOutcome, BaselineSelector, Comparison, RegressionAnalyzer};
use crate::store::MetricsStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Counters and alerts from one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Records that passed validation
    pub accepted: usize,
    /// Records dropped by validation
    pub rejected: usize,
    /// Rows written to the metrics table
    pub inserted: usize,
    /// Comparisons that reached classification
    pub compared: usize,
    /// Compared records faster than their baseline mean
    pub improvements: usize,
    /// Comparisons declined for lack of baseline data
    pub insufficient_data: usize,
    /// Comparisons skipped because the baseline mean was not positive
    pub undefined: usize,
    /// Keys analyzed with the split-sample fallback
    pub split_sample_keys: usize,
    /// Alerts in batch order, with store ids assigned
    pub alerts: Vec<Alert>,
}

impl RunSummary {
    pub fn has_regressions(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Turn raw loader output into validated records
///
/// Invalid entries are logged and returned separately; they never stop the
/// batch.
pub fn validate_batch(
    raws: Vec<RawMetric>,
    ctx: &RunContext,
) -> (Vec<MetricRecord>, Vec<ValidationError>) {
    let mut records = Vec::with_capacity(raws.len());
    let mut rejected = Vec::new();

    for raw in raws {
        match MetricRecord::new(raw, ctx) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("dropping invalid metric: {}", e);
                rejected.push(e);
            }
        }
    }

    (records, rejected)
}

/// Runs detection for one batch against a metrics store
pub struct DetectionPipeline<'a> {
    store: &'a MetricsStore,
    selector: BaselineSelector,
    analyzer: RegressionAnalyzer,
}

impl<'a> DetectionPipeline<'a> {
    pub fn new(
        store: &'a MetricsStore,
        selector: BaselineSelector,
        analyzer: RegressionAnalyzer,
    ) -> Self {
        Self {
            store,
            selector,
            analyzer,
        }
    }

    pub fn from_config(store: &'a MetricsStore, config: &DetectorConfig) -> Result<Self, String> {
        Ok(Self::new(
            store,
            BaselineSelector::from_config(config),
            RegressionAnalyzer::from_config(config)?,
        ))
    }

    /// Validate raw metrics and run detection on the survivors
    pub fn run(&self, raws: Vec<RawMetric>, ctx: &RunContext) -> Result<RunSummary, StorageError> {
        let (records, rejected) = validate_batch(raws, ctx);
        let mut summary = self.run_records(records, ctx)?;
        summary.rejected = rejected.len();
        Ok(summary)
    }

    /// Run detection on already validated records
    ///
    /// Only `StorageError` aborts the run. Alerts carry `ctx.commit_hash` and
    /// are stamped with `ctx.timestamp` as their creation time.
    pub fn run_records(
        &self,
        records: Vec<MetricRecord>,
        ctx: &RunContext,
    ) -> Result<RunSummary, StorageError> {
        let mut summary = RunSummary {
            accepted: records.len(),
            ..Default::default()
        };

        let comparisons = self.select_baselines(&records, &mut summary)?;

        summary.inserted = self.store.insert(&records)?;

        for comparison in &comparisons {
            match self.analyzer.analyze(comparison, &ctx.commit_hash, ctx.timestamp) {
                Ok(AnalysisOutcome::InsufficientData {
                    available,
                    required,
                    ..
                }) => {
                    tracing::debug!(
                        "{}: insufficient baseline ({} of {} samples)",
                        comparison.record.key(),
                        available,
                        required
                    );
                    summary.insufficient_data += 1;
                }
                Ok(AnalysisOutcome::NoRegression { change_percent, .. }) => {
                    tracing::debug!(
                        "{}: no regression ({:+.1}%)",
                        comparison.record.key(),
                        change_percent
                    );
                    summary.compared += 1;
                    if change_percent < 0.0 {
                        summary.improvements += 1;
                    }
                }
                Ok(AnalysisOutcome::Regression(mut alert)) => {
                    tracing::info!(
                        "{}: {} regression {:+.1}% ({})",
                        comparison.record.key(),
                        alert.severity,
                        alert.change_percent,
                        comparison.baseline.strategy
                    );
                    alert.id = Some(self.store.insert_alert(&alert)?);
                    summary.compared += 1;
                    summary.alerts.push(alert);
                }
                Err(AnalysisError::DivisionUndefined { baseline_mean }) => {
                    tracing::warn!(
                        "{}: skipping, baseline mean {} is not positive",
                        comparison.record.key(),
                        baseline_mean
                    );
                    summary.undefined += 1;
                }
            }
        }

        tracing::info!(
            "analyzed {} records: {} compared, {} insufficient data, {} improvements, {} regressions",
            summary.accepted,
            summary.compared,
            summary.insufficient_data,
            summary.improvements,
            summary.alerts.len()
        );

        Ok(summary)
    }

    /// One comparison per record, except for keys that fall back to a split
    ///
    /// A key falls back when none of its records found any rolling-window
    /// history, the fallback is enabled and the batch holds at least two of
    /// its records. The key then yields a single split-sample comparison at
    /// the position of its last record.
    fn select_baselines(
        &self,
        records: &[MetricRecord],
        summary: &mut RunSummary,
    ) -> Result<Vec<Comparison>, StorageError> {
        let mut rolling = Vec::with_capacity(records.len());
        for record in records {
            rolling.push(self.selector.rolling_window(self.store, record)?);
        }

        if !self.selector.split_sample_fallback() {
            return Ok(rolling);
        }

        let mut groups: HashMap<MetricKey, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            groups.entry(record.key()).or_default().push(i);
        }

        let mut fallback: HashMap<usize, Comparison> = HashMap::new();
        let mut folded: HashSet<usize> = HashSet::new();

        for indices in groups.values() {
            let no_history = indices.iter().all(|&i| rolling[i].baseline.is_empty());
            if !no_history || indices.len() < 2 {
                continue;
            }

            let batch: Vec<MetricRecord> = indices.iter().map(|&i| records[i].clone()).collect();
            if let Some(comparison) = self.selector.split_sample(&batch) {
                let last = indices[indices.len() - 1];
                folded.extend(indices.iter().copied());
                fallback.insert(last, comparison);
                summary.split_sample_keys += 1;
            }
        }

        Ok(rolling
            .into_iter()
            .enumerate()
            .filter_map(|(i, comparison)| match fallback.remove(&i) {
                Some(split) => Some(split),
                None if folded.contains(&i) => None,
                None => Some(comparison),
            })
            .collect())
    }
}

// Regression analysis for one comparison
//
// Steps:
//   1. decline when the baseline has fewer than min_sample_size samples
//   2. baseline mean / sample std dev
//   3. change% = (current - mean) / mean * 100, undefined for mean <= 0
//   4. change% <= 0 is never a regression
//   5. severity from the policy; `None` means compared, nothing to report
//   6. p-value from a one-sample t-test (1.0 for a zero-variance baseline)
//
// Severity depends on magnitude only. The p-value rides along as triage
// evidence and never suppresses an alert.

use crate::alert::{Alert, Severity};
use crate::config::{DetectorConfig, RecommendationHint};
use crate::error::AnalysisError;
use crate::regression::baseline::{BaselineStrategy, Comparison};
use crate::regression::recommendation::recommend;
use crate::regression::severity::SeverityPolicy;
use crate::regression::statistics::{one_sample_t_test, SampleSummary};
use chrono::{DateTime, Utc};

/// Outcome of analyzing one comparison
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Not enough baseline data to compare at all
    InsufficientData {
        available: usize,
        required: usize,
        strategy: BaselineStrategy,
    },

    /// Compared; change is an improvement or below the lowest tier
    NoRegression {
        change_percent: f64,
        strategy: BaselineStrategy,
    },

    /// Compared; degradation reached an alerting tier
    Regression(Alert),
}

impl AnalysisOutcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            AnalysisOutcome::Regression(alert) => Some(alert),
            _ => None,
        }
    }

    pub fn into_alert(self) -> Option<Alert> {
        match self {
            AnalysisOutcome::Regression(alert) => Some(alert),
            _ => None,
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AnalysisOutcome::InsufficientData { .. })
    }
}

/// Change of `current` relative to `baseline_mean`, in percent
pub fn change_percent(current: f64, baseline_mean: f64) -> Result<f64, AnalysisError> {
    if !(baseline_mean > 0.0) {
        return Err(AnalysisError::DivisionUndefined { baseline_mean });
    }
    Ok((current - baseline_mean) / baseline_mean * 100.0)
}

/// Compares current values against baselines and classifies degradations
#[derive(Debug, Clone)]
pub struct RegressionAnalyzer {
    policy: SeverityPolicy,
    min_sample_size: usize,
    hints: Vec<RecommendationHint>,
}

impl Default for RegressionAnalyzer {
    fn default() -> Self {
        Self {
            policy: SeverityPolicy::default(),
            min_sample_size: 5,
            hints: Vec::new(),
        }
    }
}

impl RegressionAnalyzer {
    pub fn new(policy: SeverityPolicy, min_sample_size: usize) -> Self {
        Self {
            policy,
            min_sample_size,
            hints: Vec::new(),
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            policy: SeverityPolicy::new(config.thresholds)?,
            min_sample_size: config.min_sample_size,
            hints: config.hints.clone(),
        })
    }

    pub fn with_hints(mut self, hints: Vec<RecommendationHint>) -> Self {
        self.hints = hints;
        self
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    pub fn min_sample_size(&self) -> usize {
        self.min_sample_size
    }

    /// Analyze one comparison
    ///
    /// `commit_hash` and `created_at` are stamped onto any alert produced.
    /// Returns `AnalysisError::DivisionUndefined` when the baseline mean is
    /// not positive; callers skip that record and continue.
    ///
    /// # Example
    /// ```
    /// use chrono::Utc;
    /// use perfwatch::metric::{MetricRecord, RawMetric, RunContext};
    /// use perfwatch::regression::{
    ///     AnalysisOutcome, Baseline, BaselineStrategy, Comparison, RegressionAnalyzer,
    /// };
    ///
    /// let ctx = RunContext::new("abc123", "main");
    /// let record = MetricRecord::new(
    ///     RawMetric {
    ///         benchmark_name: "decode".into(),
    ///         platform: "macOS".into(),
    ///         execution_time_ns: 130.0,
    ///         ..Default::default()
    ///     },
    ///     &ctx,
    /// )
    /// .unwrap();
    ///
    /// let comparison = Comparison {
    ///     current_value: record.execution_time_ns(),
    ///     record,
    ///     baseline: Baseline {
    ///         strategy: BaselineStrategy::RollingWindow,
    ///         samples: vec![100.0; 5],
    ///     },
    /// };
    ///
    /// let outcome = RegressionAnalyzer::default()
    ///     .analyze(&comparison, "abc123", Utc::now())
    ///     .unwrap();
    /// assert!(matches!(outcome, AnalysisOutcome::Regression(_)));
    /// ```
    pub fn analyze(
        &self,
        comparison: &Comparison,
        commit_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let baseline = &comparison.baseline;
        let strategy = baseline.strategy;

        if baseline.len() < self.min_sample_size {
            return Ok(AnalysisOutcome::InsufficientData {
                available: baseline.len(),
                required: self.min_sample_size,
                strategy,
            });
        }

        let Some(summary) = SampleSummary::from_samples(&baseline.samples) else {
            return Ok(AnalysisOutcome::InsufficientData {
                available: 0,
                required: self.min_sample_size,
                strategy,
            });
        };

        let current = comparison.current_value;
        let change = change_percent(current, summary.mean)?;

        if change <= 0.0 {
            return Ok(AnalysisOutcome::NoRegression {
                change_percent: change,
                strategy,
            });
        }

        let severity = self.policy.classify(change.abs());
        if severity == Severity::None {
            return Ok(AnalysisOutcome::NoRegression {
                change_percent: change,
                strategy,
            });
        }

        let statistical_significance = if summary.std_dev > 0.0 {
            one_sample_t_test(&baseline.samples, current)
                .map(|t| t.pvalue)
                .unwrap_or(1.0)
        } else {
            1.0
        };

        let record = &comparison.record;
        let recommendation = recommend(
            severity,
            record.benchmark_name(),
            &self.hints,
            summary.coefficient_of_variation(),
        );

        Ok(AnalysisOutcome::Regression(Alert {
            id: None,
            benchmark_name: record.benchmark_name().to_string(),
            platform: record.platform().to_string(),
            severity,
            current_value: current,
            baseline_value: summary.mean,
            change_percent: change,
            statistical_significance,
            baseline_sample_size: summary.count,
            timestamp: record.timestamp(),
            commit_hash: commit_hash.to_string(),
            recommendation,
            created_at,
            resolved: false,
        }))
    }
}

//! Benchmark observations
//!
//! A `MetricRecord` can only be built through [`MetricRecord::new`], which
//! validates the raw values. Everything downstream of the loader works on the
//! validated type.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance shared by every record of one CI invocation
///
/// Built once by the caller (the binary reads CI variables through clap) and
/// passed down explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub commit_hash: String,
    pub branch: String,
    pub pr_number: Option<i64>,
    /// Timestamp assigned to records that carry none of their own
    pub timestamp: DateTime<Utc>,
}

impl RunContext {
    pub fn new(commit_hash: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            branch: branch.into(),
            pr_number: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_pr_number(mut self, pr_number: Option<i64>) -> Self {
        self.pr_number = pr_number;
        self
    }
}

/// Unvalidated benchmark values as produced by a loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetric {
    pub benchmark_name: String,
    pub platform: String,
    pub execution_time_ns: f64,
    pub memory_usage: f64,
    pub quality_score: f64,
    pub environment_info: Option<serde_json::Value>,
    /// Overrides the run timestamp when present
    pub timestamp: Option<DateTime<Utc>>,
}

/// (benchmark, platform) pair that identifies a baseline population
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub benchmark_name: String,
    pub platform: String,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.benchmark_name, self.platform)
    }
}

/// One validated benchmark observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    benchmark_name: String,
    platform: String,
    execution_time_ns: f64,
    memory_usage: f64,
    quality_score: f64,
    timestamp: DateTime<Utc>,
    commit_hash: String,
    branch: String,
    pr_number: Option<i64>,
    environment_info: Option<serde_json::Value>,
}

impl MetricRecord {
    /// Validate raw values and attach run provenance
    ///
    /// Rejects empty names, non-positive or non-finite execution times,
    /// negative memory usage and quality scores outside `[0, 1]`.
    pub fn new(raw: RawMetric, ctx: &RunContext) -> Result<Self, ValidationError> {
        let benchmark_name = raw.benchmark_name.trim().to_string();
        if benchmark_name.is_empty() {
            return Err(ValidationError::EmptyBenchmarkName);
        }

        let platform = raw.platform.trim().to_string();
        if platform.is_empty() {
            return Err(ValidationError::EmptyPlatform {
                benchmark: benchmark_name,
            });
        }

        for (field, value) in [
            ("execution_time_ns", raw.execution_time_ns),
            ("memory_usage", raw.memory_usage),
            ("quality_score", raw.quality_score),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteValue {
                    benchmark: benchmark_name,
                    field,
                });
            }
        }

        if raw.execution_time_ns <= 0.0 {
            return Err(ValidationError::NonPositiveExecutionTime {
                benchmark: benchmark_name,
                value: raw.execution_time_ns,
            });
        }

        if raw.memory_usage < 0.0 {
            return Err(ValidationError::NegativeMemoryUsage {
                benchmark: benchmark_name,
                value: raw.memory_usage,
            });
        }

        if !(0.0..=1.0).contains(&raw.quality_score) {
            return Err(ValidationError::QualityScoreOutOfRange {
                benchmark: benchmark_name,
                value: raw.quality_score,
            });
        }

        Ok(Self {
            benchmark_name,
            platform,
            execution_time_ns: raw.execution_time_ns,
            memory_usage: raw.memory_usage,
            quality_score: raw.quality_score,
            timestamp: raw.timestamp.unwrap_or(ctx.timestamp),
            commit_hash: ctx.commit_hash.clone(),
            branch: ctx.branch.clone(),
            pr_number: ctx.pr_number,
            environment_info: raw.environment_info,
        })
    }

    /// Rebuild a record read back from the store (already validated on insert)
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_stored(
        benchmark_name: String,
        platform: String,
        execution_time_ns: f64,
        memory_usage: f64,
        quality_score: f64,
        timestamp: DateTime<Utc>,
        commit_hash: String,
        branch: String,
        pr_number: Option<i64>,
        environment_info: Option<serde_json::Value>,
    ) -> Self {
        Self {
            benchmark_name,
            platform,
            execution_time_ns,
            memory_usage,
            quality_score,
            timestamp,
            commit_hash,
            branch,
            pr_number,
            environment_info,
        }
    }

    pub fn benchmark_name(&self) -> &str {
        &self.benchmark_name
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn execution_time_ns(&self) -> f64 {
        self.execution_time_ns
    }

    /// Bytes; 0 means "not measured"
    pub fn memory_usage(&self) -> f64 {
        self.memory_usage
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn commit_hash(&self) -> &str {
        &self.commit_hash
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn pr_number(&self) -> Option<i64> {
        self.pr_number
    }

    pub fn environment_info(&self) -> Option<&serde_json::Value> {
        self.environment_info.as_ref()
    }

    pub fn key(&self) -> MetricKey {
        MetricKey {
            benchmark_name: self.benchmark_name.clone(),
            platform: self.platform.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> RunContext {
        RunContext::new("abc123", "main")
            .with_timestamp(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    fn raw(time_ns: f64) -> RawMetric {
        RawMetric {
            benchmark_name: "synthesis_short".to_string(),
            platform: "Ubuntu GCC".to_string(),
            execution_time_ns: time_ns,
            quality_score: 0.9,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record_takes_run_provenance() {
        let record = MetricRecord::new(raw(1_000.0), &ctx()).unwrap();
        assert_eq!(record.commit_hash(), "abc123");
        assert_eq!(record.branch(), "main");
        assert_eq!(record.timestamp(), ctx().timestamp);
        assert_eq!(record.memory_usage(), 0.0);
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut r = raw(1_000.0);
        r.timestamp = Some(ts);
        let record = MetricRecord::new(r, &ctx()).unwrap();
        assert_eq!(record.timestamp(), ts);
    }

    #[test]
    fn test_rejects_zero_and_negative_time() {
        assert!(matches!(
            MetricRecord::new(raw(0.0), &ctx()),
            Err(ValidationError::NonPositiveExecutionTime { .. })
        ));
        assert!(matches!(
            MetricRecord::new(raw(-5.0), &ctx()),
            Err(ValidationError::NonPositiveExecutionTime { .. })
        ));
    }

    #[test]
    fn test_rejects_nan_time() {
        assert!(matches!(
            MetricRecord::new(raw(f64::NAN), &ctx()),
            Err(ValidationError::NonFiniteValue {
                field: "execution_time_ns",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_empty_name() {
        let mut r = raw(10.0);
        r.benchmark_name = "   ".to_string();
        assert_eq!(
            MetricRecord::new(r, &ctx()),
            Err(ValidationError::EmptyBenchmarkName)
        );
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let mut r = raw(10.0);
        r.quality_score = 1.5;
        assert!(matches!(
            MetricRecord::new(r, &ctx()),
            Err(ValidationError::QualityScoreOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_memory() {
        let mut r = raw(10.0);
        r.memory_usage = -1.0;
        assert!(matches!(
            MetricRecord::new(r, &ctx()),
            Err(ValidationError::NegativeMemoryUsage { .. })
        ));
    }

    #[test]
    fn test_key_display() {
        let record = MetricRecord::new(raw(10.0), &ctx()).unwrap();
        assert_eq!(record.key().to_string(), "synthesis_short [Ubuntu GCC]");
    }
}

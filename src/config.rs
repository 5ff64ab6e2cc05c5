//! Detector configuration
//!
//! Loaded from `perfwatch.toml` when present. Every field has a default, so an
//! empty file (or no file) yields the standard policy.
//!
//! # Example perfwatch.toml
//!
//! ```toml
//! lookback_window_days = 14
//! min_sample_size = 8
//! stable_branch = "trunk"
//!
//! [thresholds]
//! minor = 3.0
//! moderate = 10.0
//! major = 20.0
//! critical = 40.0
//!
//! [[hints]]
//! keyword = "synthesis"
//! advice = "Check vocoder parameter settings"
//! ```

use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Lower bounds (inclusive, in percent) of each alerting severity tier
///
/// Anything below `minor` is not a regression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub minor: f64,
    pub moderate: f64,
    pub major: f64,
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            minor: 5.0,
            moderate: 15.0,
            major: 25.0,
            critical: 50.0,
        }
    }
}

impl SeverityThresholds {
    /// Boundaries must be finite, positive and strictly increasing
    pub fn validate(&self) -> Result<(), String> {
        let bounds = [
            ("minor", self.minor),
            ("moderate", self.moderate),
            ("major", self.major),
            ("critical", self.critical),
        ];

        for (name, value) in bounds {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "threshold {} must be a positive finite percentage, got {}",
                    name, value
                ));
            }
        }

        for pair in bounds.windows(2) {
            let (lower_name, lower) = pair[0];
            let (upper_name, upper) = pair[1];
            if lower >= upper {
                return Err(format!(
                    "threshold {} ({}) must be below {} ({})",
                    lower_name, lower, upper_name, upper
                ));
            }
        }

        Ok(())
    }
}

/// Extra advice attached to alerts for benchmarks whose name contains `keyword`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationHint {
    pub keyword: String,
    pub advice: String,
}

/// Configuration for baseline selection, classification and retention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Days of stable-branch history that form the baseline
    pub lookback_window_days: u32,

    /// Fewer baseline samples than this and the analyzer declines to compare
    pub min_sample_size: usize,

    /// Records older than this are removed by `prune`
    pub retention_horizon_days: u32,

    /// Only records from this branch ever enter a baseline
    pub stable_branch: String,

    /// Fall back to splitting the current batch when a key has no history
    pub split_sample_fallback: bool,

    /// Alpha used to mark p-values as significant in reports
    ///
    /// Significance never gates an alert; it is evidence for triage.
    pub significance_level: f64,

    pub thresholds: SeverityThresholds,

    pub hints: Vec<RecommendationHint>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lookback_window_days: 30,
            min_sample_size: 5,
            retention_horizon_days: 365,
            stable_branch: "main".to_string(),
            split_sample_fallback: true,
            significance_level: 0.05,
            thresholds: SeverityThresholds::default(),
            hints: Vec::new(),
        }
    }
}

impl DetectorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn lookback_window(&self) -> Duration {
        Duration::days(i64::from(self.lookback_window_days))
    }

    pub fn retention_horizon(&self) -> Duration {
        Duration::days(i64::from(self.retention_horizon_days))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.lookback_window_days == 0 {
            return Err("lookback_window_days must be > 0".to_string());
        }

        if self.retention_horizon_days == 0 {
            return Err("retention_horizon_days must be > 0".to_string());
        }

        if self.min_sample_size < 2 {
            return Err(format!(
                "min_sample_size must be >= 2 for a t-test, got {}",
                self.min_sample_size
            ));
        }

        if self.stable_branch.trim().is_empty() {
            return Err("stable_branch must not be empty".to_string());
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        self.thresholds.validate()
    }
}

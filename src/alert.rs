//! Regression alerts and severity tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity tier of a degradation, ordered from harmless to worst
///
/// `None` only exists inside the analyzer to mean "compared, nothing to
/// report". It is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    /// Tiers that produce alerts, most severe first
    pub const ALERTING: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Moderate,
        Severity::Minor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    pub fn is_alerting(&self) -> bool {
        *self != Severity::None
    }

    /// Marker used in markdown reports
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Major => "🟡",
            Severity::Moderate => "🟠",
            Severity::Minor => "🟢",
            Severity::None => "⚪",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Row id of a stored alert
pub type AlertId = i64;

/// One detected regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Row id, set once the alert has been stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AlertId>,
    pub benchmark_name: String,
    pub platform: String,
    pub severity: Severity,
    /// Execution time of the current observation (ns)
    pub current_value: f64,
    /// Baseline mean execution time (ns)
    pub baseline_value: f64,
    /// `(current - baseline) / baseline * 100`
    pub change_percent: f64,
    /// Two-sided p-value; 1.0 when the baseline has no variance
    pub statistical_significance: f64,
    pub baseline_sample_size: usize,
    pub timestamp: DateTime<Utc>,
    pub commit_hash: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl Alert {
    pub fn baseline_ms(&self) -> f64 {
        self.baseline_value / 1_000_000.0
    }

    pub fn current_ms(&self) -> f64 {
        self.current_value / 1_000_000.0
    }

    /// Whether the p-value clears `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.statistical_significance < alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Minor);
        assert!(Severity::Minor < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Major);
        assert!(Severity::Major < Severity::Critical);
    }

    #[test]
    fn test_severity_parse_roundtrip() {
        for severity in Severity::ALERTING {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_none_is_not_alerting() {
        assert!(!Severity::None.is_alerting());
        assert!(Severity::Minor.is_alerting());
    }
}

// Severity classification of a degradation magnitude
//
// One policy for the whole crate. Tiers are half-open intervals on the
// absolute change percent:
//
//   [0, minor)          none
//   [minor, moderate)   minor
//   [moderate, major)   moderate
//   [major, critical)   major
//   [critical, inf)     critical

use crate::alert::Severity;
use crate::config::SeverityThresholds;

/// Maps an absolute change percent to a severity tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityPolicy {
    thresholds: SeverityThresholds,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
        }
    }
}

impl SeverityPolicy {
    /// Build a policy from validated, strictly increasing boundaries
    pub fn new(thresholds: SeverityThresholds) -> Result<Self, String> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &SeverityThresholds {
        &self.thresholds
    }

    /// Classify `abs_change_percent`; NaN classifies as `None`
    ///
    /// # Example
    /// ```
    /// use perfwatch::alert::Severity;
    /// use perfwatch::regression::SeverityPolicy;
    ///
    /// let policy = SeverityPolicy::default();
    /// assert_eq!(policy.classify(4.9), Severity::None);
    /// assert_eq!(policy.classify(5.0), Severity::Minor);
    /// assert_eq!(policy.classify(50.0), Severity::Critical);
    /// ```
    pub fn classify(&self, abs_change_percent: f64) -> Severity {
        let x = abs_change_percent.abs();
        let t = &self.thresholds;

        if x.is_nan() {
            Severity::None
        } else if x >= t.critical {
            Severity::Critical
        } else if x >= t.major {
            Severity::Major
        } else if x >= t.moderate {
            Severity::Moderate
        } else if x >= t.minor {
            Severity::Minor
        } else {
            Severity::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let policy = SeverityPolicy::default();
        assert_eq!(policy.classify(0.0), Severity::None);
        assert_eq!(policy.classify(4.999), Severity::None);
        assert_eq!(policy.classify(5.0), Severity::Minor);
        assert_eq!(policy.classify(14.999), Severity::Minor);
        assert_eq!(policy.classify(15.0), Severity::Moderate);
        assert_eq!(policy.classify(24.999), Severity::Moderate);
        assert_eq!(policy.classify(25.0), Severity::Major);
        assert_eq!(policy.classify(49.999), Severity::Major);
        assert_eq!(policy.classify(50.0), Severity::Critical);
        assert_eq!(policy.classify(1_000.0), Severity::Critical);
        assert_eq!(policy.classify(f64::INFINITY), Severity::Critical);
    }

    #[test]
    fn test_nan_is_none() {
        assert_eq!(SeverityPolicy::default().classify(f64::NAN), Severity::None);
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = SeverityPolicy::new(SeverityThresholds {
            minor: 1.0,
            moderate: 2.0,
            major: 3.0,
            critical: 4.0,
        })
        .unwrap();
        assert_eq!(policy.classify(0.5), Severity::None);
        assert_eq!(policy.classify(2.5), Severity::Moderate);
        assert_eq!(policy.classify(4.0), Severity::Critical);
    }

    #[test]
    fn test_rejects_non_monotonic_thresholds() {
        let result = SeverityPolicy::new(SeverityThresholds {
            minor: 5.0,
            moderate: 5.0,
            major: 25.0,
            critical: 50.0,
        });
        assert!(result.is_err());
    }
}

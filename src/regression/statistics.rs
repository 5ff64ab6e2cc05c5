// Descriptive statistics and the one-sample t-test
//
// The baseline is treated as a sample from the "normal" distribution of a
// benchmark. A single current observation is tested against it with a
// two-sided one-sample Student t-test (H0: baseline mean == current value).
//
// Mean and sample standard deviation (n - 1) come from statrs. statrs yields
// NaN for empty and single-element input, so those cases are guarded here: a
// single-element baseline has zero spread.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

/// Result of a one-sample t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestResult {
    /// t-statistic of the baseline mean against the tested value
    pub statistic: f64,

    /// Two-sided p-value
    /// - p < 0.05: the current value is unlikely under the baseline
    /// - p >= 0.05: indistinguishable from baseline noise
    pub pvalue: f64,

    /// Degrees of freedom (n - 1)
    pub df: f64,
}

/// Summary of a baseline sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl SampleSummary {
    /// `None` for an empty slice
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        Some(Self {
            count: samples.len(),
            mean: mean(samples)?,
            std_dev: sample_std_dev(samples),
        })
    }

    /// Coefficient of variation (std_dev / |mean|), 0 when the mean is ~0
    ///
    /// - CV near 0: stable baseline
    /// - CV near 1: standard deviation as large as the mean
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean.abs() < f64::EPSILON {
            return 0.0;
        }
        self.std_dev / self.mean.abs()
    }
}

pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().mean())
}

/// Sample standard deviation; 0 for fewer than two samples
pub fn sample_std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    samples.iter().std_dev()
}

/// Two-sided one-sample t-test of `samples` against `value`
///
/// Returns `None` when the test is undefined: fewer than two samples or zero
/// variance.
///
/// # Example
/// ```
/// use perfwatch::regression::statistics::one_sample_t_test;
///
/// let baseline = [100.0, 101.0, 99.0, 100.5, 99.5];
/// let test = one_sample_t_test(&baseline, 130.0).unwrap();
/// assert!(test.pvalue < 0.001);
/// ```
pub fn one_sample_t_test(samples: &[f64], value: f64) -> Option<TTestResult> {
    let summary = SampleSummary::from_samples(samples)?;
    if summary.count < 2 || summary.std_dev <= 0.0 || !summary.std_dev.is_finite() {
        return None;
    }

    let df = (summary.count - 1) as f64;
    let standard_error = summary.std_dev / (summary.count as f64).sqrt();
    let statistic = (summary.mean - value) / standard_error;

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let pvalue = (2.0 * (1.0 - dist.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Some(TTestResult {
        statistic,
        pvalue,
        df,
    })
}

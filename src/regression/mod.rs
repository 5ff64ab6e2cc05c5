// Regression detection and severity classification
//
// Flow for one record:
//   BaselineSelector  -> Comparison (rolling window, or split-sample fallback)
//   RegressionAnalyzer -> AnalysisOutcome (insufficient data / none / alert)
//
// SeverityPolicy is the only place tier boundaries live. Both baseline
// strategies feed the same analyzer, so a split-sample comparison is
// classified exactly like a rolling-window one.

mod analyzer;
mod baseline;
mod recommendation;
mod severity;
pub mod statistics;

pub use analyzer::{change_percent, AnalysisOutcome, RegressionAnalyzer};
pub use baseline::{Baseline, BaselineSelector, BaselineStrategy, Comparison};
pub use recommendation::{recommend, NOISY_BASELINE_CV};
pub use severity::SeverityPolicy;
pub use statistics::{one_sample_t_test, SampleSummary, TTestResult};

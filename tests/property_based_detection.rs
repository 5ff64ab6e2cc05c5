//! Property-based tests for severity classification and analysis
//!
//! Properties:
//! 1. Severity is monotone in the change magnitude and none below 5%
//! 2. A current value at or below the baseline mean never alerts
//! 3. Alerts always carry a positive change and a p-value in [0, 1]
//! 4. Validation never admits a non-positive execution time

use chrono::Utc;
use perfwatch::alert::Severity;
use perfwatch::metric::{MetricRecord, RawMetric, RunContext};
use perfwatch::regression::{
    AnalysisOutcome, Baseline, BaselineStrategy, Comparison, RegressionAnalyzer, SeverityPolicy,
};
use proptest::prelude::*;

fn comparison(samples: Vec<f64>, current: f64) -> Comparison {
    let ctx = RunContext::new("prop", "main");
    let record = MetricRecord::new(
        RawMetric {
            benchmark_name: "prop".to_string(),
            platform: "P".to_string(),
            execution_time_ns: current,
            ..Default::default()
        },
        &ctx,
    )
    .unwrap();
    Comparison {
        record,
        current_value: current,
        baseline: Baseline {
            strategy: BaselineStrategy::RollingWindow,
            samples,
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_severity_monotone(a in 0.0f64..500.0, b in 0.0f64..500.0) {
        let policy = SeverityPolicy::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.classify(lo) <= policy.classify(hi));
    }

    #[test]
    fn prop_below_five_percent_is_none(x in 0.0f64..5.0) {
        prop_assert_eq!(SeverityPolicy::default().classify(x), Severity::None);
    }

    #[test]
    fn prop_improvement_never_alerts(
        samples in prop::collection::vec(1.0e3f64..1.0e9, 5..40),
        fraction in 0.001f64..=1.0,
    ) {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let current = mean * fraction;

        let outcome = RegressionAnalyzer::default()
            .analyze(&comparison(samples, current), "prop", Utc::now())
            .unwrap();
        prop_assert!(outcome.alert().is_none());
        let is_no_regression = matches!(outcome, AnalysisOutcome::NoRegression { .. });
        prop_assert!(is_no_regression);
    }

    #[test]
    fn prop_alerts_are_well_formed(
        samples in prop::collection::vec(1.0e3f64..1.0e9, 5..40),
        factor in 1.0f64..5.0,
    ) {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let current = mean * factor;

        let outcome = RegressionAnalyzer::default()
            .analyze(&comparison(samples.clone(), current), "prop", Utc::now())
            .unwrap();

        if let Some(alert) = outcome.alert() {
            prop_assert!(alert.change_percent > 0.0);
            prop_assert!(alert.severity.is_alerting());
            prop_assert!((0.0..=1.0).contains(&alert.statistical_significance));
            prop_assert_eq!(alert.baseline_sample_size, samples.len());
            prop_assert_eq!(
                alert.severity,
                SeverityPolicy::default().classify(alert.change_percent)
            );
        }
    }

    #[test]
    fn prop_small_baselines_are_declined(
        samples in prop::collection::vec(1.0e3f64..1.0e9, 0..5),
        current in 1.0e3f64..1.0e10,
    ) {
        let outcome = RegressionAnalyzer::default()
            .analyze(&comparison(samples, current), "prop", Utc::now())
            .unwrap();
        prop_assert!(outcome.is_insufficient_data());
    }

    #[test]
    fn prop_validation_rejects_non_positive_time(time in -1.0e9f64..=0.0) {
        let ctx = RunContext::new("prop", "main");
        let result = MetricRecord::new(
            RawMetric {
                benchmark_name: "prop".to_string(),
                platform: "P".to_string(),
                execution_time_ns: time,
                ..Default::default()
            },
            &ctx,
        );
        prop_assert!(result.is_err());
    }
}

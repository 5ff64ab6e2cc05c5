//! perfwatch - benchmark regression detection for CI
//!
//! Benchmark results are validated into [`metric::MetricRecord`]s, stored in
//! a SQLite [`store::MetricsStore`], and compared against stable-branch
//! history by the [`regression`] engine. Degradations that reach a severity
//! tier become [`alert::Alert`]s.
//!
//! # Example
//!
//! ```
//! use perfwatch::config::DetectorConfig;
//! use perfwatch::metric::{RawMetric, RunContext};
//! use perfwatch::pipeline::DetectionPipeline;
//! use perfwatch::store::MetricsStore;
//!
//! let store = MetricsStore::open_in_memory().unwrap();
//! let pipeline = DetectionPipeline::from_config(&store, &DetectorConfig::default()).unwrap();
//!
//! let ctx = RunContext::new("abc123", "main");
//! let raw = RawMetric {
//!     benchmark_name: "synthesis_short".into(),
//!     platform: "macOS".into(),
//!     execution_time_ns: 45_200_000.0,
//!     ..Default::default()
//! };
//!
//! let summary = pipeline.run(vec![raw], &ctx).unwrap();
//! assert_eq!(summary.inserted, 1);
//! assert_eq!(summary.insufficient_data, 1);
//! ```

pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod metric;
pub mod pipeline;
pub mod regression;
pub mod report;
pub mod store;

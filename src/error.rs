//! Error types for perfwatch
//!
//! Only `StorageError` is fatal for a run. Validation and analysis errors are
//! reported per record and the batch continues.

use thiserror::Error;

/// A benchmark observation that cannot become a `MetricRecord`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("benchmark name must not be empty")]
    EmptyBenchmarkName,

    #[error("platform must not be empty (benchmark {benchmark})")]
    EmptyPlatform { benchmark: String },

    #[error("execution time must be > 0 ns, got {value} (benchmark {benchmark})")]
    NonPositiveExecutionTime { benchmark: String, value: f64 },

    #[error("memory usage must be >= 0 bytes, got {value} (benchmark {benchmark})")]
    NegativeMemoryUsage { benchmark: String, value: f64 },

    #[error("quality score must be in [0, 1], got {value} (benchmark {benchmark})")]
    QualityScoreOutOfRange { benchmark: String, value: f64 },

    #[error("{field} is not a finite number (benchmark {benchmark})")]
    NonFiniteValue {
        benchmark: String,
        field: &'static str,
    },
}

/// Failure of the underlying metrics store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error during {context}: {source}")]
    Sqlite {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt row in column {column}: {detail}")]
    CorruptRow { column: &'static str, detail: String },

    #[error("refusing to store non-alerting alert for {benchmark}")]
    NonAlertingSeverity { benchmark: String },
}

impl StorageError {
    pub(crate) fn sqlite(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StorageError::Sqlite { context, source }
    }
}

/// A comparison that cannot be computed for one record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("change percent undefined for baseline mean {baseline_mean}")]
    DivisionUndefined { baseline_mean: f64 },
}

/// Benchmark input that cannot be read at all
///
/// Individual unparseable files are skipped by the loader; only a missing or
/// unwalkable input root is an error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input directory does not exist: {path}")]
    MissingInput { path: String },

    #[error("failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Invalid or unreadable detector configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

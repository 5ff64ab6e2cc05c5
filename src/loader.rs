//! Benchmark result loading
//!
//! Walks a directory tree for `*.json` files and decodes each into
//! [`RawMetric`] values. Three file shapes are accepted:
//!
//! - a single benchmark object
//! - a list of benchmark objects
//! - an object with a `results` list
//!
//! Files that fail to parse are logged and skipped. Entries with
//! `"benchmark_successful": false` are dropped. Numeric fields may also be
//! written as numeric strings. Values are not validated
//! here; that happens in [`MetricRecord::new`](crate::metric::MetricRecord::new).
//!
//! # Example
//!
//! ```no_run
//! use perfwatch::loader::load_dir;
//!
//! let batch = load_dir("benchmark-results").unwrap();
//! println!("{} metrics from {} files", batch.metrics.len(), batch.files_read);
//! ```

use crate::error::LoadError;
use crate::metric::RawMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Platform label used when the path names no known CI runner
pub const UNKNOWN_PLATFORM: &str = "Unknown Platform";

/// Raw metrics read from one input directory
#[derive(Debug, Clone, Default)]
pub struct LoadedBatch {
    pub metrics: Vec<RawMetric>,
    /// Files decoded successfully
    pub files_read: usize,
    /// Files that could not be read or decoded
    pub files_skipped: usize,
    /// Entries dropped as unsuccessful or malformed
    pub entries_skipped: usize,
}

fn default_successful() -> bool {
    true
}

/// Accept a JSON number or a string holding one, e.g. `"45200000"`
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", text))),
    }
}

/// One benchmark object as written by the benchmark harness
#[derive(Debug, Deserialize)]
struct BenchmarkEntry {
    #[serde(default)]
    benchmark_name: String,

    #[serde(default)]
    platform: Option<String>,

    #[serde(
        default,
        alias = "avg_execution_time",
        deserialize_with = "number_or_numeric_string"
    )]
    avg_execution_time_ns: f64,

    #[serde(default, deserialize_with = "number_or_numeric_string")]
    avg_memory_usage: f64,

    #[serde(
        default,
        alias = "quality_score",
        deserialize_with = "number_or_numeric_string"
    )]
    formant_preservation_score: f64,

    #[serde(default)]
    environment_info: Option<Value>,

    #[serde(default = "default_successful")]
    benchmark_successful: bool,

    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl BenchmarkEntry {
    fn into_raw(self, inferred_platform: &str) -> RawMetric {
        let platform = self
            .platform
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| inferred_platform.to_string());

        RawMetric {
            benchmark_name: self.benchmark_name,
            platform,
            execution_time_ns: self.avg_execution_time_ns,
            memory_usage: self.avg_memory_usage,
            quality_score: self.formant_preservation_score,
            environment_info: self.environment_info,
            timestamp: self.timestamp,
        }
    }
}

/// Infer a platform label from the path of a results file
///
/// Matches the artifact directory names the CI matrix produces, e.g.
/// `benchmark-results-Ubuntu-GCC/results.json` maps to `"Ubuntu GCC"`.
pub fn infer_platform(path: &Path) -> &'static str {
    let path = path.to_string_lossy();

    if path.contains("Windows") || path.contains("windows") {
        "Windows x64"
    } else if path.contains("Ubuntu") && path.contains("GCC") {
        "Ubuntu GCC"
    } else if path.contains("Ubuntu") && path.contains("Clang") {
        "Ubuntu Clang"
    } else if path.contains("macOS") {
        "macOS"
    } else {
        UNKNOWN_PLATFORM
    }
}

/// Decode the contents of one results file
///
/// Returns the metrics plus the number of entries dropped. Fails only when
/// the content is not JSON at all.
pub fn decode_results(
    content: &[u8],
    platform: &str,
) -> Result<(Vec<RawMetric>, usize), serde_json::Error> {
    let data: Value = serde_json::from_slice(content)?;

    let entries = match data {
        Value::Array(list) => list,
        Value::Object(mut map) if map.contains_key("results") => match map.remove("results") {
            Some(Value::Array(list)) => list,
            Some(other) => vec![other],
            None => Vec::new(),
        },
        other => vec![other],
    };

    let mut metrics = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match serde_json::from_value::<BenchmarkEntry>(entry) {
            Ok(entry) if !entry.benchmark_successful => {
                tracing::debug!("skipping unsuccessful benchmark {}", entry.benchmark_name);
                skipped += 1;
            }
            Ok(entry) => metrics.push(entry.into_raw(platform)),
            Err(e) => {
                tracing::warn!("skipping malformed benchmark entry: {}", e);
                skipped += 1;
            }
        }
    }

    Ok((metrics, skipped))
}

/// Load every `*.json` file under `dir`, in file-name order
///
/// Platform inference uses the path relative to `dir`, so the location of
/// the input root itself never affects the label.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<LoadedBatch, LoadError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoadError::MissingInput {
            path: dir.display().to_string(),
        });
    }

    let mut batch = LoadedBatch::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let platform = infer_platform(relative);

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                batch.files_skipped += 1;
                continue;
            }
        };

        match decode_results(&content, platform) {
            Ok((metrics, skipped)) => {
                tracing::debug!(
                    "{}: {} metrics ({}), {} skipped",
                    relative.display(),
                    metrics.len(),
                    platform,
                    skipped
                );
                batch.files_read += 1;
                batch.entries_skipped += skipped;
                batch.metrics.extend(metrics);
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
                batch.files_skipped += 1;
            }
        }
    }

    tracing::info!(
        "loaded {} metrics from {} files ({} files skipped)",
        batch.metrics.len(),
        batch.files_read,
        batch.files_skipped
    );

    Ok(batch)
}

//! Integration tests for the perfwatch binary

use chrono::{Duration, Utc};
use perfwatch::metric::{MetricRecord, RawMetric, RunContext};
use perfwatch::store::MetricsStore;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn perfwatch(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("perfwatch");
    cmd.current_dir(dir)
        .env_remove("GITHUB_SHA")
        .env_remove("GITHUB_REF_NAME")
        .env_remove("GITHUB_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Six days of stable-branch history at 45.2ms for `synthesis_short` on macOS
fn seed_history(db: &Path) {
    let store = MetricsStore::open(db).unwrap();
    for day in 1..=6 {
        let ctx = RunContext::new(format!("base{day}"), "main")
            .with_timestamp(Utc::now() - Duration::days(day));
        let record = MetricRecord::new(
            RawMetric {
                benchmark_name: "synthesis_short".to_string(),
                platform: "macOS".to_string(),
                execution_time_ns: 45_200_000.0,
                ..Default::default()
            },
            &ctx,
        )
        .unwrap();
        store.insert(&[record]).unwrap();
    }
}

/// Results directory with one macOS run at `time_ns`
fn write_results(dir: &Path, time_ns: f64) -> PathBuf {
    let input = dir.join("results");
    let platform_dir = input.join("benchmark-results-macOS");
    fs::create_dir_all(&platform_dir).unwrap();
    fs::write(
        platform_dir.join("results.json"),
        format!(
            r#"{{"results": [
                {{"benchmark_name": "synthesis_short", "avg_execution_time_ns": {time_ns},
                  "avg_memory_usage": 2048, "formant_preservation_score": 0.91}},
                {{"benchmark_name": "broken", "avg_execution_time_ns": 1,
                  "benchmark_successful": false}}
            ]}}"#
        ),
    )
    .unwrap();
    input
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    perfwatch(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("prune"))
        .stdout(predicate::str::contains("alerts"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_detect_reports_regression_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 61_020_000.0);

    perfwatch(dir.path())
        .arg("detect")
        .arg("--database")
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg("out")
        .arg("--commit-hash")
        .arg("f00d")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 performance metrics"))
        .stdout(predicate::str::contains("Detected 1 performance regressions"))
        .stdout(predicate::str::contains("synthesis_short [macOS] +35.0%"));

    let summary = fs::read_to_string(dir.path().join("out/regression_summary.md")).unwrap();
    assert!(summary.contains("### 🟡 Major Regressions"));
    assert!(summary.contains("| synthesis_short | macOS | +35.0% | 45.20ms | 61.02ms |"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/alerts.json")).unwrap())
            .unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["alerts"][0]["commit_hash"], "f00d");
}

#[test]
fn test_detect_fail_on_regression_exits_one() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 90_000_000.0);

    perfwatch(dir.path())
        .args(["detect", "--fail-on-regression", "--database"])
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Detected 1 performance regressions"));
}

#[test]
fn test_detect_no_regression() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 40_000_000.0);

    perfwatch(dir.path())
        .args(["detect", "--fail-on-regression", "--database"])
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("benchmarks faster than baseline"))
        .stdout(predicate::str::contains("No performance regressions detected"));

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("regression_analysis/alerts.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["improvements"], 1);

    let summary =
        fs::read_to_string(dir.path().join("regression_analysis/regression_summary.md")).unwrap();
    assert!(summary.contains("No performance regressions detected"));
}

#[test]
fn test_detect_writes_github_output() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 80_000_000.0);
    let gh_output = dir.path().join("gh_output");

    perfwatch(dir.path())
        .env("GITHUB_OUTPUT", &gh_output)
        .arg("detect")
        .arg("--database")
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .assert()
        .success();

    let content = fs::read_to_string(&gh_output).unwrap();
    assert_eq!(
        content,
        "regression-count=1\ncritical-regressions=1\nhas-regressions=true\n"
    );
}

#[test]
fn test_detect_feature_branch_does_not_pollute_baseline() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    let input = write_results(dir.path(), 45_200_000.0);

    for _ in 0..6 {
        perfwatch(dir.path())
            .args(["detect", "--branch", "feature/x", "--database"])
            .arg(&db)
            .arg("--input")
            .arg(&input)
            .assert()
            .success();
    }

    // Six stored feature-branch rows, still no stable baseline to compare to
    let store = MetricsStore::open(&db).unwrap();
    assert_eq!(store.count_metrics().unwrap(), 6);
    let baseline = store
        .query_baseline(
            "synthesis_short",
            "macOS",
            "main",
            Duration::days(30),
            Utc::now() + Duration::seconds(1),
        )
        .unwrap();
    assert!(baseline.is_empty());
}

#[test]
fn test_detect_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    perfwatch(dir.path())
        .args(["detect", "--input", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input directory does not exist"));
}

#[test]
fn test_detect_unusable_database_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_results(dir.path(), 45_200_000.0);
    let not_a_db = dir.path().join("db-dir");
    fs::create_dir_all(&not_a_db).unwrap();

    perfwatch(dir.path())
        .arg("detect")
        .arg("--database")
        .arg(&not_a_db)
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open metrics database"));

    assert!(!dir.path().join("regression_analysis").exists());
}

#[test]
fn test_detect_empty_input_fails() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    perfwatch(dir.path())
        .args(["detect", "--input", "empty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid benchmark data found"));
}

#[test]
fn test_alerts_and_resolve() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 60_000_000.0);

    perfwatch(dir.path())
        .arg("detect")
        .arg("--database")
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .assert()
        .success();

    let output = perfwatch(dir.path())
        .args(["alerts", "--format", "json", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());
    let alerts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["severity"], "major");
    let id = alerts[0]["id"].as_i64().unwrap();

    perfwatch(dir.path())
        .args(["resolve", &id.to_string(), "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Alert #{id} resolved")));

    perfwatch(dir.path())
        .args(["alerts", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("No alerts in the last 7 days"));

    perfwatch(dir.path())
        .args(["alerts", "--all", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("(resolved)"));
}

#[test]
fn test_resolve_unknown_alert_fails() {
    let dir = TempDir::new().unwrap();
    perfwatch(dir.path())
        .args(["resolve", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No alert with id 999"));
}

#[test]
fn test_stats_and_prune() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);

    let output = perfwatch(dir.path())
        .args(["stats", "--format", "json", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["metrics"], 6);
    assert_eq!(stats["platforms"], 1);

    perfwatch(dir.path())
        .args(["prune", "--retention-days", "3", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 4 metrics and 0 alerts"));

    perfwatch(dir.path())
        .args(["prune", "--retention-days", "0", "--vacuum", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 metrics"));

    perfwatch(dir.path())
        .args(["stats", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Metrics:           0"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("perfwatch.toml"),
        "[thresholds]\nminor = 20.0\nmoderate = 10.0\n",
    )
    .unwrap();

    perfwatch(dir.path())
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("perfwatch.toml"));
}

#[test]
fn test_config_overrides_thresholds() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("metrics.db");
    seed_history(&db);
    let input = write_results(dir.path(), 47_000_000.0);
    let config = dir.path().join("strict.toml");
    fs::write(
        &config,
        "[thresholds]\nminor = 1.0\nmoderate = 2.0\nmajor = 3.0\ncritical = 4.0\n",
    )
    .unwrap();

    // +3.98% is below the default minor tier but "major" under the strict config
    perfwatch(dir.path())
        .arg("detect")
        .arg("--config")
        .arg(&config)
        .arg("--database")
        .arg(&db)
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected 1 performance regressions"));
}

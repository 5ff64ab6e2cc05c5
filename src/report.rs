//! Report output for detected regressions
//!
//! - `regression_summary.md`: counts per severity and one table per tier
//! - `alerts.json`: machine-readable alert dump with the improvement count
//! - GitHub Actions output lines (`regression-count`, `critical-regressions`,
//!   `has-regressions`)

use crate::alert::{Alert, Severity};
use crate::pipeline::RunSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "regression_summary.md";
pub const ALERTS_FILE: &str = "alerts.json";

/// Recommendation text is cut to this many characters in tables
const RECOMMENDATION_PREVIEW: usize = 80;

/// JSON document written to `alerts.json`
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    /// Count per severity name, only tiers that occur
    pub by_severity: BTreeMap<&'static str, usize>,
    /// Benchmarks that got faster than their baseline
    pub improvements: usize,
    pub alerts: &'a [Alert],
}

impl<'a> AlertReport<'a> {
    pub fn new(summary: &'a RunSummary, generated_at: DateTime<Utc>) -> Self {
        let alerts = summary.alerts.as_slice();
        let mut by_severity = BTreeMap::new();
        for alert in alerts {
            *by_severity.entry(alert.severity.as_str()).or_insert(0) += 1;
        }

        Self {
            generated_at,
            total: alerts.len(),
            by_severity,
            improvements: summary.improvements,
            alerts,
        }
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn preview(text: &str) -> String {
    let cut: String = text.chars().take(RECOMMENDATION_PREVIEW).collect();
    format!("{}...", cut.replace('|', "/"))
}

fn count(alerts: &[Alert], severity: Severity) -> usize {
    alerts.iter().filter(|a| a.severity == severity).count()
}

/// Render the markdown summary
///
/// p-values below `significance_level` are marked significant in the tables.
pub fn render_markdown(
    summary: &RunSummary,
    significance_level: f64,
    generated_at: DateTime<Utc>,
) -> String {
    let alerts = summary.alerts.as_slice();
    let mut out = String::new();

    let _ = writeln!(out, "# 🚨 Performance Regression Detection Report\n");
    let _ = writeln!(
        out,
        "**Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if summary.improvements > 0 {
        let _ = writeln!(
            out,
            "📈 **Improvements:** {} benchmarks faster than baseline\n",
            summary.improvements
        );
    }

    if alerts.is_empty() {
        let _ = writeln!(out, "✅ **No performance regressions detected.**");
        return out;
    }

    let _ = writeln!(out, "## 📊 Summary\n");
    let _ = writeln!(out, "**Total Regressions:** {}", alerts.len());
    let _ = writeln!(out, "**Significance level:** {}\n", significance_level);

    for severity in Severity::ALERTING {
        let n = count(alerts, severity);
        if n > 0 {
            let _ = writeln!(
                out,
                "- {} **{}:** {}",
                severity.emoji(),
                title_case(severity.as_str()),
                n
            );
        }
    }

    let _ = writeln!(out, "\n## 🔍 Detailed Analysis\n");

    for severity in Severity::ALERTING {
        let tier: Vec<&Alert> = alerts.iter().filter(|a| a.severity == severity).collect();
        if tier.is_empty() {
            continue;
        }

        let _ = writeln!(
            out,
            "### {} {} Regressions\n",
            severity.emoji(),
            title_case(severity.as_str())
        );
        let _ = writeln!(
            out,
            "| Benchmark | Platform | Change | Baseline | Current | p-value | Significant | Recommendation |"
        );
        let _ = writeln!(
            out,
            "|-----------|----------|--------|----------|---------|---------|-------------|----------------|"
        );

        for alert in tier {
            let _ = writeln!(
                out,
                "| {} | {} | {:+.1}% | {:.2}ms | {:.2}ms | {:.3} | {} | {} |",
                alert.benchmark_name,
                alert.platform,
                alert.change_percent,
                alert.baseline_ms(),
                alert.current_ms(),
                alert.statistical_significance,
                if alert.is_significant(significance_level) {
                    "yes"
                } else {
                    "no"
                },
                preview(&alert.recommendation)
            );
        }
        out.push('\n');
    }

    out
}

/// GitHub Actions `key=value` output lines
pub fn github_output(alerts: &[Alert]) -> String {
    format!(
        "regression-count={}\ncritical-regressions={}\nhas-regressions={}\n",
        alerts.len(),
        count(alerts, Severity::Critical),
        !alerts.is_empty()
    )
}

/// Append the output lines to the file named by `GITHUB_OUTPUT`
pub fn append_github_output(path: &Path, alerts: &[Alert]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(github_output(alerts).as_bytes())
}

/// Write `regression_summary.md` and `alerts.json` into `out_dir`
///
/// Returns the paths written.
pub fn write_reports(
    summary: &RunSummary,
    significance_level: f64,
    out_dir: &Path,
    generated_at: DateTime<Utc>,
) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let summary_path = out_dir.join(SUMMARY_FILE);
    fs::write(
        &summary_path,
        render_markdown(summary, significance_level, generated_at),
    )?;

    let json_path = out_dir.join(ALERTS_FILE);
    let json = serde_json::to_string_pretty(&AlertReport::new(summary, generated_at))
        .map_err(io::Error::other)?;
    fs::write(&json_path, json)?;

    tracing::info!("reports written to {}", out_dir.display());
    Ok(vec![summary_path, json_path])
}

// Triage advice attached to alerts

use crate::alert::Severity;
use crate::config::RecommendationHint;

/// CV above which the baseline is flagged as noisy in the advice text
pub const NOISY_BASELINE_CV: f64 = 0.5;

fn base_advice(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Minor => &[
            "Monitor this benchmark in upcoming commits",
            "Consider profiling if regression persists",
            "Review recent algorithmic changes",
        ],
        Severity::Moderate => &[
            "Investigate recent code changes affecting this benchmark",
            "Run detailed profiling to identify bottlenecks",
            "Consider reverting recent performance-affecting commits",
        ],
        Severity::Major => &[
            "Immediate investigation required",
            "Profile the specific code paths in this benchmark",
            "Consider blocking deployment until resolved",
        ],
        Severity::Critical => &[
            "Critical performance degradation detected",
            "Block deployment immediately",
            "Emergency profiling and optimization required",
        ],
        Severity::None => &["No specific recommendation"],
    }
}

/// Build the recommendation text for one alert
///
/// Severity advice comes first, then any configured hints whose keyword
/// appears in the benchmark name (case-insensitive), then a noise note when
/// the baseline's coefficient of variation exceeds [`NOISY_BASELINE_CV`].
pub fn recommend(
    severity: Severity,
    benchmark_name: &str,
    hints: &[RecommendationHint],
    baseline_cv: f64,
) -> String {
    let mut items: Vec<String> = base_advice(severity).iter().map(|s| s.to_string()).collect();

    let name = benchmark_name.to_lowercase();
    for hint in hints {
        if !hint.keyword.is_empty() && name.contains(&hint.keyword.to_lowercase()) {
            items.push(hint.advice.clone());
        }
    }

    if baseline_cv > NOISY_BASELINE_CV {
        items.push(format!(
            "Baseline is noisy (CV {:.0}%), confirm with repeated runs",
            baseline_cv * 100.0
        ));
    }

    items.join(" • ")
}

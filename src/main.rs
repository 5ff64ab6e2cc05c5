use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use perfwatch::cli::{AlertsArgs, Cli, Command, DetectArgs, OutputFormat, PruneArgs};
use perfwatch::config::DetectorConfig;
use perfwatch::loader;
use perfwatch::metric::RunContext;
use perfwatch::pipeline::DetectionPipeline;
use perfwatch::report;
use perfwatch::store::MetricsStore;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "perfwatch.toml";

/// Initialize tracing subscriber (RUST_LOG, or TRACE with --debug)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit --config, else ./perfwatch.toml if present, else defaults
fn load_config(path: Option<&Path>) -> Result<DetectorConfig> {
    match path {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            DetectorConfig::from_file(DEFAULT_CONFIG_FILE).context("Failed to load perfwatch.toml")
        }
        None => Ok(DetectorConfig::default()),
    }
}

fn open_store(path: &Path) -> Result<MetricsStore> {
    MetricsStore::open(path)
        .with_context(|| format!("Failed to open metrics database {}", path.display()))
}

/// Returns the number of regressions found
fn run_detect(args: DetectArgs, database: &Path, mut config: DetectorConfig) -> Result<usize> {
    if let Some(days) = args.baseline_days {
        config.lookback_window_days = days;
    }
    if let Some(branch) = args.stable_branch {
        config.stable_branch = branch;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    println!("📊 Loading benchmark results from {}", args.input.display());
    let batch = loader::load_dir(&args.input)?;
    if batch.metrics.is_empty() {
        anyhow::bail!("No valid benchmark data found in {}", args.input.display());
    }
    println!("✅ Loaded {} performance metrics", batch.metrics.len());

    let store = open_store(database)?;
    let pipeline = DetectionPipeline::from_config(&store, &config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let ctx = RunContext::new(args.commit_hash, args.branch).with_pr_number(args.pr_number);

    println!("🔍 Analyzing for performance regressions...");
    let summary = pipeline
        .run(batch.metrics, &ctx)
        .context("Regression detection failed")?;

    if summary.rejected > 0 {
        println!("⚠️  Dropped {} invalid metrics", summary.rejected);
    }

    if summary.improvements > 0 {
        println!(
            "📈 {} benchmarks faster than baseline",
            summary.improvements
        );
    }

    if summary.has_regressions() {
        println!(
            "⚠️  Detected {} performance regressions",
            summary.alerts.len()
        );
        for alert in &summary.alerts {
            println!(
                "  {} {} [{}] {:+.1}% ({:.2}ms -> {:.2}ms, p={:.3})",
                alert.severity.emoji(),
                alert.benchmark_name,
                alert.platform,
                alert.change_percent,
                alert.baseline_ms(),
                alert.current_ms(),
                alert.statistical_significance
            );
        }
    } else {
        println!("✅ No performance regressions detected");
    }

    report::write_reports(&summary, config.significance_level, &args.output, Utc::now())
        .with_context(|| format!("Failed to write reports to {}", args.output.display()))?;
    println!(
        "📄 Regression summary report saved to: {}",
        args.output.join(report::SUMMARY_FILE).display()
    );

    if let Some(path) = &args.github_output {
        report::append_github_output(path, &summary.alerts)
            .with_context(|| format!("Failed to append GitHub output {}", path.display()))?;
    }

    Ok(summary.alerts.len())
}

fn run_prune(args: PruneArgs, database: &Path, config: &DetectorConfig) -> Result<()> {
    let horizon = args
        .retention_days
        .map(|days| Duration::days(i64::from(days)))
        .unwrap_or_else(|| config.retention_horizon());
    let store = open_store(database)?;

    let report = if args.no_optimize {
        store.prune(horizon, Utc::now())?
    } else {
        store.prune_and_optimize(horizon, Utc::now(), args.vacuum)?
    };

    println!(
        "🗑️  Removed {} metrics and {} alerts older than {} days",
        report.metrics_removed,
        report.alerts_removed,
        horizon.num_days()
    );
    Ok(())
}

fn run_alerts(args: AlertsArgs, database: &Path) -> Result<()> {
    let store = open_store(database)?;
    let alerts = store.query_alerts(!args.all, Duration::days(i64::from(args.days)), Utc::now())?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&alerts)?);
        }
        OutputFormat::Text => {
            if alerts.is_empty() {
                println!("No alerts in the last {} days", args.days);
            }
            for alert in &alerts {
                println!(
                    "#{} {} {} {} [{}] {:+.1}% commit {}{}",
                    alert.id.unwrap_or_default(),
                    alert.created_at.format("%Y-%m-%d %H:%M"),
                    alert.severity,
                    alert.benchmark_name,
                    alert.platform,
                    alert.change_percent,
                    alert.commit_hash,
                    if alert.resolved { " (resolved)" } else { "" }
                );
            }
        }
    }
    Ok(())
}

fn run_resolve(id: i64, database: &Path) -> Result<()> {
    let store = open_store(database)?;
    if !store.resolve_alert(id)? {
        anyhow::bail!("No alert with id {}", id);
    }
    println!("✅ Alert #{} resolved", id);
    Ok(())
}

fn run_stats(format: OutputFormat, database: &Path) -> Result<()> {
    let store = open_store(database)?;
    let stats = store.stats()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!("Metrics:           {}", stats.metrics);
            println!("Benchmarks:        {}", stats.benchmarks);
            println!("Platforms:         {}", stats.platforms);
            println!(
                "Alerts:            {} ({} unresolved)",
                stats.alerts, stats.unresolved_alerts
            );
            if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
                println!(
                    "Date range:        {} .. {}",
                    earliest.format("%Y-%m-%d"),
                    latest.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Detect(detect) => {
            let fail_on_regression = detect.fail_on_regression;
            let regressions = run_detect(detect, &args.database, config)?;
            if fail_on_regression && regressions > 0 {
                std::process::exit(1);
            }
        }
        Command::Prune(prune) => run_prune(prune, &args.database, &config)?,
        Command::Alerts(alerts) => run_alerts(alerts, &args.database)?,
        Command::Resolve { id } => run_resolve(id, &args.database)?,
        Command::Stats { format } => run_stats(format, &args.database)?,
    }

    Ok(())
}

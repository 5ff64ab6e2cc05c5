//! CLI argument parsing for perfwatch

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "perfwatch")]
#[command(version)]
#[command(about = "Benchmark regression detection against historical baselines", long_about = None)]
pub struct Cli {
    /// Path to the metrics database
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value = ".performance_db/metrics.db"
    )]
    pub database: PathBuf,

    /// Detector configuration file (defaults to ./perfwatch.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output (to stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load benchmark results, store them and report regressions
    Detect(DetectArgs),

    /// Delete metrics and alerts older than the retention horizon
    Prune(PruneArgs),

    /// List recent alerts
    Alerts(AlertsArgs),

    /// Mark an alert as resolved
    Resolve {
        /// Alert id as shown by `perfwatch alerts`
        id: i64,
    },

    /// Show store size and coverage
    Stats {
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Directory containing benchmark result JSON files
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory for regression_summary.md and alerts.json
    #[arg(
        short,
        long,
        value_name = "DIR",
        default_value = "./regression_analysis"
    )]
    pub output: PathBuf,

    /// Commit hash recorded with every metric and alert
    #[arg(long, env = "GITHUB_SHA", default_value = "unknown")]
    pub commit_hash: String,

    /// Branch the benchmarks ran on
    #[arg(long, env = "GITHUB_REF_NAME", default_value = "main")]
    pub branch: String,

    /// Pull request number, if any
    #[arg(long, value_name = "N")]
    pub pr_number: Option<i64>,

    /// Days of stable-branch history used as the baseline (overrides config)
    #[arg(long, value_name = "DAYS")]
    pub baseline_days: Option<u32>,

    /// Branch whose records form baselines (overrides config)
    #[arg(long, value_name = "BRANCH")]
    pub stable_branch: Option<String>,

    /// File to append GitHub Actions outputs to
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "PATH")]
    pub github_output: Option<PathBuf>,

    /// Exit with status 1 when any regression is found
    #[arg(long)]
    pub fail_on_regression: bool,
}

#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Retention horizon in days (overrides config)
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<u32>,

    /// Skip the ANALYZE / PRAGMA optimize pass
    #[arg(long)]
    pub no_optimize: bool,

    /// Also VACUUM the database file
    #[arg(long, conflicts_with = "no_optimize")]
    pub vacuum: bool,
}

#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Only alerts created within this many days
    #[arg(long, value_name = "DAYS", default_value = "7")]
    pub days: u32,

    /// Include resolved alerts
    #[arg(long)]
    pub all: bool,

    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_detect() {
        let cli = Cli::parse_from([
            "perfwatch",
            "detect",
            "--input",
            "results",
            "--commit-hash",
            "abc123",
            "--branch",
            "feature/x",
            "--fail-on-regression",
        ]);
        match cli.command {
            Command::Detect(args) => {
                assert_eq!(args.input, PathBuf::from("results"));
                assert_eq!(args.commit_hash, "abc123");
                assert_eq!(args.branch, "feature/x");
                assert!(args.fail_on_regression);
                assert_eq!(args.output, PathBuf::from("./regression_analysis"));
                assert!(args.baseline_days.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_database_after_subcommand() {
        let cli = Cli::parse_from(["perfwatch", "stats", "--database", "x.db", "--debug"]);
        assert_eq!(cli.database, PathBuf::from("x.db"));
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_default_database() {
        let cli = Cli::parse_from(["perfwatch", "alerts"]);
        assert_eq!(cli.database, PathBuf::from(".performance_db/metrics.db"));
        match cli.command {
            Command::Alerts(args) => {
                assert_eq!(args.days, 7);
                assert!(!args.all);
                assert_eq!(args.format, OutputFormat::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_resolve_requires_id() {
        assert!(Cli::try_parse_from(["perfwatch", "resolve"]).is_err());
        let cli = Cli::parse_from(["perfwatch", "resolve", "42"]);
        assert!(matches!(cli.command, Command::Resolve { id: 42 }));
    }

    #[test]
    fn test_cli_prune_vacuum_conflicts_with_no_optimize() {
        assert!(
            Cli::try_parse_from(["perfwatch", "prune", "--no-optimize", "--vacuum"]).is_err()
        );
    }

    #[test]
    fn test_cli_detect_requires_input() {
        assert!(Cli::try_parse_from(["perfwatch", "detect"]).is_err());
    }
}

//! RegimeLab CLI — regime analysis and indicator commands.
//!
//! Commands:
//! - `analyze` — build features, search for a valid regime clustering, and
//!   print the analysis report as JSON
//! - `indicators` — print the dated indicator table as JSON
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level) so the
//! JSON on stdout stays machine-readable.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use regimelab_core::rng::SeedPolicy;
use regimelab_runner::{load_prices, run_analysis, run_indicator_report, AnalysisConfig, DataSource};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI — market regime clustering and trading signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster market regimes and generate a long/flat trading signal.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Path to a TOML analysis config. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of regimes (2-10).
        #[arg(long)]
        n_clusters: Option<usize>,

        /// Smallest admissible cluster (at least 3).
        #[arg(long)]
        min_cluster_size: Option<usize>,

        /// Calendar days of history kept before --start (at least 60).
        #[arg(long)]
        lookback_window: Option<usize>,

        /// Clustering attempts in the search (1-100).
        #[arg(long)]
        max_attempts: Option<usize>,

        /// Master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// How attempts are seeded.
        #[arg(long, value_enum)]
        seed_policy: Option<SeedPolicyArg>,

        /// Run search attempts one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// First date of the analysis window (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Last date of the analysis window (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Pretty-print the JSON report.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Compute the indicator table for a price series.
    Indicators {
        #[command(flatten)]
        source: SourceArgs,

        /// Only report rows on or after this date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Pretty-print the JSON report.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Read prices from a CSV file.
    #[arg(long, conflicts_with_all = ["parquet", "synthetic"])]
    csv: Option<PathBuf>,

    /// Read prices from a Parquet file.
    #[arg(long, conflicts_with = "synthetic")]
    parquet: Option<PathBuf>,

    /// Generate this many business days of synthetic prices.
    #[arg(long)]
    synthetic: Option<usize>,

    /// First date of the synthetic series (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    synthetic_start: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeedPolicyArg {
    PerAttempt,
    Fixed,
}

impl From<SeedPolicyArg> for SeedPolicy {
    fn from(arg: SeedPolicyArg) -> Self {
        match arg {
            SeedPolicyArg::PerAttempt => SeedPolicy::PerAttempt,
            SeedPolicyArg::Fixed => SeedPolicy::Fixed,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            config,
            n_clusters,
            min_cluster_size,
            lookback_window,
            max_attempts,
            seed,
            seed_policy,
            sequential,
            start,
            end,
            pretty,
        } => {
            let mut config = match config {
                Some(path) => AnalysisConfig::from_file(&path)?,
                None => AnalysisConfig::default(),
            };
            if let Some(v) = n_clusters {
                config.n_clusters = v;
            }
            if let Some(v) = min_cluster_size {
                config.min_cluster_size = v;
            }
            if let Some(v) = lookback_window {
                config.lookback_window = v;
            }
            if let Some(v) = max_attempts {
                config.max_attempts = v;
            }
            if let Some(v) = seed {
                config.seed = v;
            }
            if let Some(v) = seed_policy {
                config.seed_policy = v.into();
            }
            if sequential {
                config.parallel = false;
            }
            if let Some(date) = parse_date(start.as_deref())? {
                config.start_date = Some(date);
            }
            if let Some(date) = parse_date(end.as_deref())? {
                config.end_date = Some(date);
            }

            run_analyze(&source, &config, pretty)
        }
        Commands::Indicators {
            source,
            start,
            pretty,
        } => {
            let series = load_prices(&data_source(&source)?)?;
            let report = run_indicator_report(&series, parse_date(start.as_deref())?);
            print_json(&report, pretty)
        }
    }
}

fn run_analyze(source: &SourceArgs, config: &AnalysisConfig, pretty: bool) -> Result<()> {
    let series = load_prices(&data_source(source)?)?;
    let report = run_analysis(&series, config)?;

    info!(
        current_signal = report.current_signal,
        sharpe = report.strategy_metrics.sharpe_ratio,
        trades = report.strategy_metrics.total_trades,
        status = report.strategy_metrics.status.as_str(),
        "analysis complete"
    );

    print_json(&report, pretty)
}

fn data_source(args: &SourceArgs) -> Result<DataSource> {
    if let Some(path) = &args.csv {
        return Ok(DataSource::Csv(path.clone()));
    }
    if let Some(path) = &args.parquet {
        return Ok(DataSource::Parquet(path.clone()));
    }
    if let Some(bars) = args.synthetic {
        let start = NaiveDate::parse_from_str(&args.synthetic_start, "%Y-%m-%d")
            .with_context(|| format!("invalid --synthetic-start '{}'", args.synthetic_start))?;
        return Ok(DataSource::Synthetic { bars, start });
    }
    bail!("one of --csv, --parquet or --synthetic is required");
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

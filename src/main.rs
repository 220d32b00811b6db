//! Solder Watch command line
//!
//! ```text
//! solder-watch generate --count 50          # insert synthetic readings
//! solder-watch machines                     # list machines in the store
//! solder-watch report --machine M1 --json   # run one report cycle
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use solder_watch::config::{defaults, StationConfig};
use solder_watch::pipeline::{self, ReportPipeline, ReportRequest};
use solder_watch::storage::{available_machines, ReadingStore, SledReadingStore};
use solder_watch::types::{CycleOutcome, FilterSpec};
use solder_watch::{export, ReadingGenerator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "solder-watch")]
#[command(about = "Wave-soldering telemetry classification and quality scoring")]
#[command(version)]
struct CliArgs {
    /// Station config file (default: $SOLDER_CONFIG, then ./solder_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reading store directory (overrides [storage].path)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Remove the reading store before running.
    /// WARNING: This is destructive and cannot be undone!
    #[arg(
        long,
        global = true,
        env = defaults::RESET_DB_ENV_VAR,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    reset_db: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Insert synthetic readings into the store
    Generate {
        /// Number of readings (default: [generator].batch_size)
        #[arg(long)]
        count: Option<usize>,
        /// Seed for reproducible batches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the machines available for selection
    Machines,

    /// Run one report cycle over a machine selection and date range
    Report(ReportArgs),

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Machine id to include (repeatable; default: first available machine)
    #[arg(long = "machine", value_name = "ID")]
    machines: Vec<String>,
    /// First day of the range, YYYY-MM-DD (default: end minus [report].default_lookback_days)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the range, inclusive (default: today)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Insert this many synthetic readings before querying
    #[arg(long, value_name = "N")]
    generate: Option<usize>,
    /// Generator seed used with --generate
    #[arg(long)]
    seed: Option<u64>,
    /// Write the filtered readings to this CSV file
    #[arg(long, value_name = "PATH", conflicts_with = "csv_dir")]
    csv: Option<PathBuf>,
    /// Write the filtered readings into this directory under a timestamped name
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
    /// Detailed readings listed per machine in the text report
    #[arg(long, default_value = "10")]
    rows: usize,
}

// ============================================================================
// Database Reset
// ============================================================================

/// Remove the reading store directory and all its contents.
fn reset_store(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "Reading store does not exist, nothing to reset");
        return Ok(());
    }
    warn!(path = %path.display(), "RESET_DB requested, removing reading store");
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove reading store {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Subcommands
// ============================================================================

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_generate(
    config: &StationConfig,
    store: &dyn ReadingStore,
    count: Option<usize>,
    seed: Option<u64>,
) {
    let count = count.unwrap_or(config.generator.batch_size);
    let summary = ReadingGenerator::new(&config.generator, &config.thresholds).generate_and_insert(
        store,
        count,
        Utc::now(),
        &mut rng_for(seed),
    );
    println!("{} readings inserted", summary.inserted);
    for failure in &summary.failures {
        println!("  failed: {}", failure);
    }
}

fn run_report(config: &StationConfig, store: &dyn ReadingStore, args: ReportArgs) -> Result<()> {
    let ReportArgs {
        machines,
        start,
        end,
        generate,
        seed,
        csv,
        csv_dir,
        json,
        rows,
    } = args;
    let machines = if machines.is_empty() {
        available_machines(store, &config.generator)
            .into_iter()
            .take(1)
            .collect()
    } else {
        machines
    };
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = start.unwrap_or_else(|| {
        end.checked_sub_days(Days::new(u64::from(config.report.default_lookback_days)))
            .unwrap_or(NaiveDate::MIN)
    });

    let mut request = ReportRequest::new(FilterSpec::new(machines, start, end));
    request.generate = generate;
    request.seed = seed;

    let outcome = ReportPipeline::new(config, store)
        .run(&request)
        .context("Report cycle failed")?;

    if json {
        let body = serde_json::to_string_pretty(&outcome).context("Failed to serialize report")?;
        println!("{}", body);
    } else {
        print!("{}", pipeline::render(&outcome, rows));
    }

    if let CycleOutcome::Completed(cycle) = &outcome {
        if let Some(path) = csv {
            export::export_to_file(&path, &cycle.readings)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        } else if let Some(dir) = csv_dir {
            let path = export::export_to_dir(&dir, &cycle.readings, cycle.generated_at)
                .with_context(|| format!("Failed to write CSV into {}", dir.display()))?;
            info!(path = %path.display(), "CSV export written");
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config =
        StationConfig::load(args.config.as_deref()).context("Failed to load station config")?;
    info!(
        "Station: {} | Machines: {} | Critical above {:.1} °C / {:.2} m/s²",
        config.station.name,
        config.generator.machines.join(", "),
        config.thresholds.sensor_temp_critical_c,
        config.thresholds.vibration_critical
    );

    if let SubCommand::ShowConfig = args.command {
        print!("{}", config.to_toml().context("Failed to render config")?);
        return Ok(());
    }

    let db_path = args.db.clone().unwrap_or_else(|| config.storage.path.clone());

    // Reset check BEFORE the store is opened
    if args.reset_db {
        reset_store(&db_path)?;
    }

    let store = SledReadingStore::open(&db_path)
        .with_context(|| format!("Failed to open reading store at {}", db_path.display()))?;

    match args.command {
        SubCommand::Generate { count, seed } => run_generate(&config, &store, count, seed),
        SubCommand::Machines => {
            for machine in available_machines(&store, &config.generator) {
                println!("{}", machine);
            }
        }
        SubCommand::Report(report) => run_report(&config, &store, report)?,
        SubCommand::ShowConfig => {}
    }

    store.flush().context("Failed to flush reading store")?;
    Ok(())
}

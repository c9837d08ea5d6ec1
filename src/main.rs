use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use powercurve::config::AppConfig;
use powercurve::error::{ErrorSeverity, PowerCurveError};
use powercurve::export::{self, text, ExportFormat};
use powercurve::import::read_activity_file;
use powercurve::logging::{init_logging, LogLevel};
use powercurve::models::{fit_timestamp_to_utc, AggregatePowerCurve, DateRange, FIT_EPOCH_OFFSET};
use powercurve::normalize::normalize;
use powercurve::power::PowerAnalyzer;
use powercurve::store::DirectoryStore;
use powercurve::synthetic::generate_ride;
use powercurve::PowerCurveEngine;

/// powercurve - Mean-maximal power curves from FIT activity files
///
/// Decodes stored cycling activities and reports, for a grid of durations,
/// the best average power sustained across a date range.
#[derive(Parser)]
#[command(name = "powercurve")]
#[command(version)]
#[command(about = "Power curve analysis for FIT activities", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the power curve of an athlete over a date range
    Curve {
        /// Athlete whose activities are analyzed (defaults to config)
        #[arg(short, long)]
        athlete: Option<String>,

        /// Date range start (YYYY-MM-DD)
        #[arg(short, long)]
        from: String,

        /// Date range end (YYYY-MM-DD)
        #[arg(short, long)]
        to: String,

        /// Output format (json, csv, table)
        #[arg(short = 'F', long, default_value = "json")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the activity directory
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Decode a single FIT file and show its power curve
    Inspect {
        /// FIT file to decode
        file: PathBuf,
    },

    /// Print the active duration grid
    Grid,

    /// Write a synthetic FIT activity
    Generate {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Ride length in seconds
        #[arg(short, long, default_value = "3600")]
        seconds: u32,

        /// Base power in watts
        #[arg(short, long, default_value = "220")]
        power: u16,

        /// Activity date (YYYY-MM-DD), today if omitted
        #[arg(short, long)]
        date: Option<String>,

        /// Seed for the power pattern
        #[arg(long, default_value = "0")]
        seed: u32,
    },

    /// Show or initialize the configuration file
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    run(cli).inspect_err(|err| {
        if let Some(err) = err.downcast_ref::<PowerCurveError>() {
            let message = err.user_message();
            let styled = match err.severity() {
                ErrorSeverity::Critical => message.red().bold(),
                ErrorSeverity::Error => message.red(),
                ErrorSeverity::Warning => message.yellow(),
            };
            eprintln!("{} {}", "✗".red(), styled);
        }
    })
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.logging.level = LogLevel::from_verbosity(config.logging.level, cli.verbose);
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Curve {
            athlete,
            from,
            to,
            format,
            output,
            data_dir,
        } => {
            let athlete = athlete
                .or_else(|| config.default_athlete.clone())
                .context("No athlete given and no default_athlete configured")?;
            let format: ExportFormat = format.parse()?;
            let range = DateRange::parse(&from, &to)?;

            let store = match data_dir {
                Some(dir) => DirectoryStore::new(dir)
                    .with_extensions(config.store.extensions.clone())
                    .with_progress(config.store.show_progress),
                None => config.store.directory_store(),
            };
            let engine = PowerCurveEngine::from_config(&config)?;

            eprintln!(
                "{}",
                format!("Computing power curve for {}...", athlete).blue().bold()
            );
            let report = engine.power_curve(&store, &athlete, &range)?;

            for (id, err) in report.summary.failures() {
                let err = PowerCurveError::from(err.clone());
                eprintln!("{} {}: {}", "⚠".yellow(), id, err.user_message());
            }
            if report.is_partial() {
                eprintln!("{}", "⚠ Time budget exhausted, result is partial".yellow());
            }
            eprintln!("{}", text::render_report_summary(&report).dimmed());

            let rendered = export::render(&report.curve, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("{}", format!("✓ Wrote {}", path.display()).green());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Inspect { file } => inspect(&file, &config)?,

        Commands::Grid => {
            let grid = config.grid.build()?;
            println!(
                "{}",
                format!("Duration grid ({} durations)", grid.len()).blue().bold()
            );
            let labels: Vec<String> = grid
                .durations()
                .iter()
                .map(|&d| export::format_duration(d))
                .collect();
            println!("{}", labels.join(" "));
        }

        Commands::Generate {
            output,
            seconds,
            power,
            date,
            seed,
        } => {
            let date = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", d))?,
                None => Utc::now().date_naive(),
            };
            let start = date
                .and_hms_opt(8, 0, 0)
                .context("Invalid start time")?
                .and_utc()
                .timestamp()
                - FIT_EPOCH_OFFSET;
            let time_created = u32::try_from(start).context("Date is before the FIT epoch")?;

            let bytes = generate_ride(time_created, seconds, power, seed);
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{}",
                format!(
                    "✓ Wrote {} ({} s at ~{} W, {} bytes)",
                    output.display(),
                    seconds,
                    power,
                    bytes.len()
                )
                .green()
            );
        }

        Commands::Config { show, init, force } => {
            let path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
            if init {
                if path.exists() && !force {
                    anyhow::bail!(
                        "Config file already exists: {} (use --force to overwrite)",
                        path.display()
                    );
                }
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&path)?;
                println!("{}", format!("✓ Wrote {}", path.display()).green());
            }
            if show || !init {
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn inspect(file: &Path, config: &AppConfig) -> Result<()> {
    let activity = read_activity_file(file)?;

    let sample_count = activity.samples.len();
    let powered = activity.samples.iter().filter(|s| s.power.is_some()).count();
    let first = activity.samples.iter().map(|s| s.timestamp).min();
    let last = activity.samples.iter().map(|s| s.timestamp).max();
    let date = activity.activity_date();

    let segments = normalize(activity.samples);
    let grid = config.grid.build()?;
    let curve = PowerAnalyzer::activity_curve(&segments, &grid);

    println!("{}", format!("{}", file.display()).blue().bold());
    println!("  Files in buffer: {}", activity.file_count);
    println!("  Samples: {} ({} with power)", sample_count, powered);
    println!("  Segments: {}", segments.len());
    if let Some(date) = date {
        println!("  Activity date: {}", date);
    }
    if let (Some(first), Some(last)) = (first.and_then(fit_timestamp_to_utc), last.and_then(fit_timestamp_to_utc)) {
        println!(
            "  Time span: {} to {}",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%H:%M:%S UTC")
        );
    }

    let mut aggregate = AggregatePowerCurve::new();
    aggregate.absorb(&curve);
    println!("{}", text::render_table(&aggregate));
    Ok(())
}

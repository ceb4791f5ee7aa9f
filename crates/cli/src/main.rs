//! pstat - statistics reports for host performance datasets
//!
//! Reads datasets in the JSON dataset schema and prints per-field statistics,
//! optionally scoped to a time interval, or compares one statistic across
//! several hosts.

mod commands;
mod config;
mod output;

use analysis_lib::{DataKey, Statistic, DEFAULT_GRANULARITY_MS};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{compare, report, types};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Performance statistics CLI
#[derive(Parser)]
#[command(name = "pstat")]
#[command(author, version, about = "Statistics reports for host performance datasets", long_about = None)]
pub struct Cli {
    /// Output format (defaults to the config file, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Peak sub-window in milliseconds
    #[arg(long, short, global = true, env = "PSTAT_GRANULARITY_MS")]
    pub granularity: Option<i64>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the data types and fields of a dataset
    Types {
        /// Dataset file
        file: PathBuf,
    },

    /// Show statistics for the fields of a dataset
    Report {
        /// Dataset file
        file: PathBuf,

        /// Only fields of this type
        #[arg(long = "type", short = 't')]
        type_id: Option<String>,

        /// Only this field (requires --type)
        #[arg(long)]
        field: Option<String>,

        /// Interval start in epoch milliseconds
        #[arg(long, requires = "end")]
        start: Option<i64>,

        /// Interval end in epoch milliseconds
        #[arg(long, requires = "start")]
        end: Option<i64>,

        /// Statistics to show (e.g. avg, p95, peak); all when omitted
        #[arg(long = "stat", short = 's')]
        stats: Vec<Statistic>,
    },

    /// Compare one statistic of one field across datasets
    Compare {
        /// Dataset files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Data type
        #[arg(long = "type", short = 't')]
        type_id: String,

        /// Field of the data type
        #[arg(long)]
        field: String,

        /// Statistic to compare
        #[arg(long = "stat", short = 's', default_value = "avg")]
        stat: Statistic,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load()?;
    let format = cli.format.or_else(|| config.format()).unwrap_or_default();
    let granularity_ms = cli
        .granularity
        .or(config.default_granularity_ms)
        .unwrap_or(DEFAULT_GRANULARITY_MS);

    match cli.command {
        Commands::Types { file } => {
            types::list_types(&file, format)?;
        }
        Commands::Report {
            file,
            type_id,
            field,
            start,
            end,
            stats,
        } => {
            let options = report::ReportOptions {
                type_id,
                field,
                start,
                end,
                granularity_ms,
                stats,
            };
            report::show_report(&file, options, format)?;
        }
        Commands::Compare {
            files,
            type_id,
            field,
            stat,
        } => {
            let key = DataKey::new(type_id, field)?;
            compare::compare(&files, key, stat, granularity_ms, format)?;
        }
    }

    Ok(())
}

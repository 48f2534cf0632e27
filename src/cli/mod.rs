//! Command-line parsing for the campus energy pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from ingestion and aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use crate::domain::NegativeKwhPolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "energy", version, about = "Campus energy consumption dashboard")]
pub struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a directory of meter CSV files, aggregate, and write the report artifacts.
    Run(RunArgs),
    /// Write a synthetic campus data directory to try the pipeline on.
    Demo(DemoArgs),
}

/// Options for a pipeline run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Directory of per-building CSV files.
    #[arg(long, env = "ENERGY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory the artifacts are written to (created if missing).
    #[arg(long, env = "ENERGY_OUTPUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// What to do with negative kWh readings.
    #[arg(long, value_enum, default_value_t = NegativeKwhPolicy::Keep)]
    pub negative_kwh: NegativeKwhPolicy,

    /// Rows of the daily/weekly series shown in `summary.txt`.
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// Dashboard width (pixels).
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Dashboard height (pixels).
    #[arg(long, default_value_t = 1400)]
    pub height: u32,

    /// Skip rendering `dashboard.svg`.
    #[arg(long)]
    pub no_dashboard: bool,

    /// Print an ASCII plot of the daily series.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub plot_width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub plot_height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Directory to write the sample files into.
    #[arg(long, default_value = "data")]
    pub out: PathBuf,

    /// Number of buildings (one file each).
    #[arg(long, default_value_t = 3)]
    pub buildings: usize,

    /// Days of hourly readings per building.
    #[arg(long, default_value_t = 28)]
    pub days: u32,

    /// First day of the generated data (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Also write a file without a `kwh` column and one with malformed rows.
    #[arg(long)]
    pub with_invalid: bool,
}

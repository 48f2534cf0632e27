//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by ingest and consumed by every later stage
//! - exported to CSV/JSON
//! - re-ingested from the exported files without loss

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::ValueEnum;

/// Label used when a building or month cannot be derived from a file name.
pub const UNKNOWN_LABEL: &str = "unknown";

/// One validated meter reading.
///
/// Invariant: `timestamp` parsed and `kwh` finite. Rows that cannot satisfy
/// this are dropped during ingest and never become a `RawReading`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub timestamp: NaiveDateTime,
    pub kwh: f64,
    pub building: String,
    pub month: String,
}

/// What to do with readings whose `kwh` is below zero.
///
/// Meter exports occasionally carry negative values (net metering, counter
/// corrections). They are not invalid per se, so the default keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NegativeKwhPolicy {
    /// Pass negative values through unchanged.
    #[default]
    Keep,
    /// Drop rows with `kwh < 0` like any other invalid row.
    Drop,
}

impl NegativeKwhPolicy {
    pub fn accepts(self, kwh: f64) -> bool {
        match self {
            NegativeKwhPolicy::Keep => true,
            NegativeKwhPolicy::Drop => kwh >= 0.0,
        }
    }
}

/// Pixel size of the rendered dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSize {
    pub width: u32,
    pub height: u32,
}

impl Default for DashboardSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1400,
        }
    }
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for `*.csv` meter files.
    pub data_dir: PathBuf,
    /// Directory receiving every output artifact (created if missing).
    pub output_dir: PathBuf,
    pub negative_kwh: NegativeKwhPolicy,
    /// Number of daily/weekly entries listed in the text report.
    pub head_rows: usize,
    /// Render `dashboard.svg`.
    pub dashboard: bool,
    pub dashboard_size: DashboardSize,
    /// Print an ASCII plot of the daily series.
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            negative_kwh: NegativeKwhPolicy::default(),
            head_rows: 5,
            dashboard: true,
            dashboard_size: DashboardSize::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
        }
    }
}

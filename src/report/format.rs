//! Formatted text output for the terminal and `summary.txt`.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized (important for snapshot-style tests)

use std::path::PathBuf;

use crate::aggregate::UsagePoint;
use crate::report::RunSummary;

const RULE: &str = "-------------------------------------";

/// Format the full text report written to `summary.txt`.
pub fn format_summary_report(
    run: &RunSummary,
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
    head: usize,
) -> String {
    let mut out = String::new();

    out.push_str("CAMPUS ENERGY SUMMARY REPORT\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("Total Energy Consumption: {:.2} kWh\n", run.total_kwh));
    match &run.top_consumer {
        Some(top) => out.push_str(&format!(
            "Highest Usage Building: {} ({:.2} kWh)\n",
            top.building, top.total_kwh
        )),
        None => out.push_str("Highest Usage Building: n/a\n"),
    }
    match &run.peak_load {
        Some(peak) => out.push_str(&format!(
            "Peak Load: {:.2} kWh at {} ({})\n",
            peak.kwh, peak.timestamp, peak.building
        )),
        None => out.push_str("Peak Load: n/a\n"),
    }
    out.push_str(&format!(
        "Readings: {} from {} building(s), {} of {} file(s) used\n",
        run.readings, run.buildings, run.files_used, run.files_scanned
    ));

    out.push_str("\nDaily Trend:\n");
    out.push_str(&format_series_head(daily, head));
    out.push_str("\nWeekly Trend (weeks starting Monday):\n");
    out.push_str(&format_series_head(weekly, head));

    out
}

/// The first `head` buckets of a series as an aligned two-column table.
pub fn format_series_head(series: &[UsagePoint], head: usize) -> String {
    let mut out = format!("{:<12} {:>14}\n", "period_start", "kwh");
    for p in series.iter().take(head) {
        out.push_str(&format!("{:<12} {:>14.2}\n", p.period_start.to_string(), p.kwh));
    }
    if series.len() > head {
        out.push_str(&format!("... ({} more)\n", series.len() - head));
    }
    out
}

/// Ingest diagnostics, one ` - <line>` per skipped/failed file.
///
/// Empty when nothing was skipped, so no bare header is printed.
pub fn format_logs(logs: &[String]) -> String {
    if logs.is_empty() {
        return String::new();
    }
    let mut out = String::from("LOGS:\n");
    for line in logs {
        out.push_str(&format!(" - {line}\n"));
    }
    out
}

/// Per-building report lines as produced by the registry.
pub fn format_building_reports(lines: &[String]) -> String {
    let mut out = String::from("Building Reports:\n");
    for line in lines {
        out.push_str(&format!("  {line}\n"));
    }
    out
}

/// List of artifacts written by the run.
pub fn format_artifacts(paths: &[PathBuf]) -> String {
    let mut out = String::from("Artifacts:\n");
    for p in paths {
        out.push_str(&format!("  {}\n", p.display()));
    }
    out
}

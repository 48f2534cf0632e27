//! CSV ingest and normalization.
//!
//! This module turns a directory of heterogeneous per-building meter files
//! into one ordered set of validated readings.
//!
//! Design goals:
//! - **Partial-failure tolerance**: a bad file is logged and skipped, it never
//!   aborts the run
//! - **Row-level validation**: rows without a usable `timestamp`/`kwh` are
//!   dropped and counted
//! - **Deterministic behavior**: files are processed in name order, even when
//!   read in parallel
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{NegativeKwhPolicy, PipelineConfig, RawReading, UNKNOWN_LABEL};
use crate::error::AppError;
use crate::io::export::{CLEANED_FILE, SUMMARY_CSV_FILE};

/// Extension (case-insensitive) of the files picked up from the data directory.
pub const INPUT_EXTENSION: &str = "csv";

/// A recoverable, per-file problem. The file is excluded; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileIssue {
    #[error("Skipped {file} → missing timestamp/kwh")]
    MissingColumns { file: String },

    #[error("Failed to read {file}: {reason}")]
    ReadFailure { file: String, reason: String },
}

impl FileIssue {
    fn read_failure(file: &str, reason: impl ToString) -> Self {
        FileIssue::ReadFailure {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Row counts for a file that passed schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileReport {
    /// Well-formed data rows seen.
    pub rows_read: usize,
    /// Rows kept as readings.
    pub rows_kept: usize,
    /// Well-formed rows dropped for a missing/invalid `timestamp` or `kwh`.
    pub rows_dropped: usize,
    /// Rows the CSV layer could not parse (silently skipped).
    pub rows_malformed: usize,
}

/// Result of ingesting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<FileReport, FileIssue>,
}

/// Ingest output: combined readings + per-file outcomes.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    /// File-then-row ordered readings from every file that passed validation.
    pub readings: Vec<RawReading>,
    /// One entry per candidate file, in processing order.
    pub outcomes: Vec<FileOutcome>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

impl IngestedData {
    /// Human-readable skip/failure lines, in encounter order.
    pub fn logs(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err())
            .map(FileIssue::to_string)
            .collect()
    }

    pub fn files_scanned(&self) -> usize {
        self.outcomes.len()
    }

    pub fn files_used(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Readings parsed from a single file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReadings {
    pub readings: Vec<RawReading>,
    pub report: FileReport,
}

/// Load every `*.csv` file in `config.data_dir`.
///
/// Fails only when the directory itself is unusable. An empty result (every
/// file skipped) is returned as-is; the orchestrator decides what that means.
///
/// When the output directory is the data directory, CSV artifacts written by
/// an earlier run are not read back as input.
pub fn load_directory(config: &PipelineConfig) -> Result<IngestedData, AppError> {
    let mut files = list_input_files(&config.data_dir)?;
    if same_directory(&config.data_dir, &config.output_dir) {
        files.retain(|path| {
            let own = is_pipeline_artifact(path);
            if own {
                debug!(file = %display_name(path), "ignoring previous run output");
            }
            !own
        });
        if files.is_empty() {
            return Err(AppError::Configuration(format!(
                "No CSV input files found in data folder (only previous outputs): {}",
                config.data_dir.display()
            )));
        }
    }
    info!(
        dir = %config.data_dir.display(),
        files = files.len(),
        "scanning input directory"
    );

    let policy = config.negative_kwh;
    let per_file: Vec<(String, Result<FileReadings, FileIssue>)> = files
        .par_iter()
        .map(|path| {
            let name = display_name(path);
            let result = ingest_file(path, &name, policy);
            (name, result)
        })
        .collect();

    let mut data = IngestedData::default();
    for (file_name, result) in per_file {
        let result = match result {
            Ok(parsed) => {
                debug!(
                    file = %file_name,
                    kept = parsed.report.rows_kept,
                    dropped = parsed.report.rows_dropped,
                    malformed = parsed.report.rows_malformed,
                    "ingested file"
                );
                data.rows_read += parsed.report.rows_read;
                data.rows_dropped += parsed.report.rows_dropped;
                data.readings.extend(parsed.readings);
                Ok(parsed.report)
            }
            Err(issue) => {
                // Already surfaced to the user through `IngestedData::logs`.
                info!(file = %file_name, "{issue}");
                Err(issue)
            }
        };
        data.outcomes.push(FileOutcome { file_name, result });
    }

    info!(
        readings = data.readings.len(),
        files_used = data.files_used(),
        files_scanned = data.files_scanned(),
        "ingest complete"
    );

    Ok(data)
}

/// List candidate input files, sorted by path.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.exists() {
        return Err(AppError::Configuration(format!(
            "Data folder not found: {}",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(AppError::Configuration(format!(
            "Data path is not a directory: {}",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::Configuration(format!("Failed to list data folder '{}': {e}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_input_extension(p))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::Configuration(format!(
            "No CSV files found in data folder: {}",
            dir.display()
        )));
    }
    Ok(files)
}

/// Derive `(building, month)` defaults from a file name.
///
/// `home_block_2024-01.csv` → `("home", "2024-01")`. The building is the first
/// `_`-separated token of the stem, the month the last one (only when there
/// are at least two tokens). Missing or empty tokens become `"unknown"`.
pub fn derive_metadata(file_name: &str) -> (String, String) {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let parts: Vec<&str> = stem.split('_').collect();

    let token = |s: Option<&&str>| {
        s.map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_LABEL)
            .to_string()
    };

    let building = token(parts.first());
    let month = if parts.len() > 1 {
        token(parts.last())
    } else {
        UNKNOWN_LABEL.to_string()
    };
    (building, month)
}

/// Read, decode, and parse one file.
pub fn ingest_file(
    path: &Path,
    file_name: &str,
    policy: NegativeKwhPolicy,
) -> Result<FileReadings, FileIssue> {
    let bytes = fs::read(path).map_err(|e| FileIssue::read_failure(file_name, e))?;
    let text = String::from_utf8(bytes).map_err(|e| FileIssue::read_failure(file_name, e))?;
    parse_readings(&text, file_name, policy)
}

/// Parse decoded CSV text into readings.
///
/// `file_name` drives the `building`/`month` defaults and the log messages.
pub fn parse_readings(
    text: &str,
    file_name: &str,
    policy: NegativeKwhPolicy,
) -> Result<FileReadings, FileIssue> {
    let text = text.trim_start_matches('\u{feff}');
    let (default_building, default_month) = derive_metadata(file_name);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FileIssue::read_failure(file_name, e))?
        .clone();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(FileIssue::read_failure(file_name, "No columns to parse from file"));
    }

    let header_map = build_header_map(&headers);
    if !header_map.contains_key("timestamp") || !header_map.contains_key("kwh") {
        return Err(FileIssue::MissingColumns {
            file: file_name.to_string(),
        });
    }

    let mut readings = Vec::new();
    let mut report = FileReport::default();

    for result in reader.records() {
        let record = match result {
            Ok(r) if r.len() <= headers.len() => r,
            _ => {
                report.rows_malformed += 1;
                continue;
            }
        };
        report.rows_read += 1;

        let Some(timestamp) = get_optional(&record, &header_map, "timestamp").and_then(parse_timestamp)
        else {
            report.rows_dropped += 1;
            continue;
        };
        let Some(kwh) = parse_opt_f64(get_optional(&record, &header_map, "kwh")) else {
            report.rows_dropped += 1;
            continue;
        };
        if !policy.accepts(kwh) {
            report.rows_dropped += 1;
            continue;
        }

        let building = get_optional(&record, &header_map, "building")
            .map(str::to_string)
            .unwrap_or_else(|| default_building.clone());
        let month = get_optional(&record, &header_map, "month")
            .map(str::to_string)
            .unwrap_or_else(|| default_month.clone());

        readings.push(RawReading {
            timestamp,
            kwh,
            building,
            month,
        });
    }

    report.rows_kept = readings.len();
    Ok(FileReadings { readings, report })
}

/// Parse a meter timestamp. Offsets are dropped (wall-clock time is kept).
///
/// Slash dates with the year last are month-first (`01/13/2024` is 13 January).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FMTS: [&str; 8] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(INPUT_EXTENSION))
}

fn is_pipeline_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == CLEANED_FILE || n == SUMMARY_CSV_FILE)
}

/// Compare resolved paths; a directory that does not exist yet matches nothing.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

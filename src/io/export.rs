//! Export cleaned data, per-building statistics, and the text/JSON summary.
//!
//! Every artifact is rendered in memory, written to a temporary file next to
//! its destination, and renamed into place. A failed write leaves any previous
//! artifact untouched instead of a truncated one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::aggregate::{BuildingSummary, UsagePoint};
use crate::domain::RawReading;
use crate::error::AppError;
use crate::report::{RunSummary, TIMESTAMP_FORMAT, format_summary_report};

pub const CLEANED_FILE: &str = "cleaned_energy_data.csv";
pub const SUMMARY_CSV_FILE: &str = "building_summary.csv";
pub const SUMMARY_TEXT_FILE: &str = "summary.txt";
pub const SUMMARY_JSON_FILE: &str = "summary.json";

/// Paths of the artifacts written by `export_results`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub cleaned: PathBuf,
    pub summary_csv: PathBuf,
    pub report: PathBuf,
    pub json: PathBuf,
}

impl ExportedFiles {
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![
            self.cleaned.clone(),
            self.summary_csv.clone(),
            self.report.clone(),
            self.json.clone(),
        ]
    }
}

#[derive(Serialize)]
struct CleanedRow<'a> {
    timestamp: String,
    building: &'a str,
    month: &'a str,
    kwh: f64,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    building: &'a str,
    count: usize,
    mean: f64,
    min: f64,
    max: f64,
    sum: f64,
}

/// Write the cleaned dataset, the per-building summary, and the text/JSON report.
pub fn export_results(
    output_dir: &Path,
    readings: &[RawReading],
    summary: &BuildingSummary,
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
    run: &RunSummary,
    head: usize,
) -> Result<ExportedFiles, AppError> {
    ensure_output_dir(output_dir)?;

    let files = ExportedFiles {
        cleaned: output_dir.join(CLEANED_FILE),
        summary_csv: output_dir.join(SUMMARY_CSV_FILE),
        report: output_dir.join(SUMMARY_TEXT_FILE),
        json: output_dir.join(SUMMARY_JSON_FILE),
    };

    write_cleaned_csv(&files.cleaned, readings)?;
    write_summary_csv(&files.summary_csv, summary)?;

    let report = format_summary_report(run, daily, weekly, head);
    write_atomic(&files.report, report.as_bytes())?;

    let json = serde_json::to_vec_pretty(run).map_err(|e| AppError::write(&files.json, e.into()))?;
    write_atomic(&files.json, &json)?;

    Ok(files)
}

/// Write readings as `timestamp,building,month,kwh`, re-ingestable as-is.
pub fn write_cleaned_csv(path: &Path, readings: &[RawReading]) -> Result<(), AppError> {
    let rows = readings.iter().map(|r| CleanedRow {
        timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        building: &r.building,
        month: &r.month,
        kwh: r.kwh,
    });
    let bytes = csv_bytes(rows).map_err(|e| AppError::write(path, e))?;
    write_atomic(path, &bytes)
}

/// Write `building,count,mean,min,max,sum`, one row per building.
pub fn write_summary_csv(path: &Path, summary: &BuildingSummary) -> Result<(), AppError> {
    let rows = summary.iter().map(|(building, s)| SummaryRow {
        building,
        count: s.count,
        mean: s.mean,
        min: s.min,
        max: s.max,
        sum: s.sum,
    });
    let bytes = csv_bytes(rows).map_err(|e| AppError::write(path, e))?;
    write_atomic(path, &bytes)
}

/// Replace `path` with `contents` via a temporary sibling file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::write(path, e))?;
    tmp.write_all(contents).map_err(|e| AppError::write(path, e))?;
    tmp.as_file().sync_all().map_err(|e| AppError::write(path, e))?;
    tmp.persist(path).map_err(|e| AppError::write(path, e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
    Ok(())
}

pub(crate) fn ensure_output_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| AppError::write(dir, e))
}

fn csv_bytes<T: Serialize>(rows: impl IntoIterator<Item = T>) -> std::io::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| e.into_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::io::ingest::IngestedData;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn reading(building: &str, day: u32, hour: u32, kwh: f64) -> RawReading {
        RawReading {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            kwh,
            building: building.to_string(),
            month: "2024-01".to_string(),
        }
    }

    fn export(dir: &Path, readings: Vec<RawReading>) -> Result<ExportedFiles, AppError> {
        let ingest = IngestedData {
            readings,
            ..IngestedData::default()
        };
        let summary = aggregate::building_summary(&ingest.readings);
        let daily = aggregate::daily_usage(&ingest.readings);
        let weekly = aggregate::weekly_usage(&ingest.readings);
        let run = crate::report::summarize(&ingest, &summary);
        export_results(dir, &ingest.readings, &summary, &daily, &weekly, &run, 5)
    }

    #[test]
    fn writes_all_artifacts() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let files = export(
            &out,
            vec![reading("home", 1, 0, 1.25), reading("office", 1, 1, 7.5), reading("home", 2, 0, 0.1)],
        )
        .unwrap();

        let cleaned = fs::read_to_string(&files.cleaned).unwrap();
        let mut lines = cleaned.lines();
        assert_eq!(lines.next(), Some("timestamp,building,month,kwh"));
        assert_eq!(lines.next(), Some("2024-01-01 00:00:00,home,2024-01,1.25"));
        assert_eq!(cleaned.lines().count(), 4);

        let summary = fs::read_to_string(&files.summary_csv).unwrap();
        assert!(summary.starts_with("building,count,mean,min,max,sum\n"));
        assert!(summary.contains("office,1,7.5,7.5,7.5,7.5\n"));

        let report = fs::read_to_string(&files.report).unwrap();
        assert!(report.contains("Highest Usage Building: office (7.50 kWh)"));
        assert!(report.contains("Peak Load: 7.50 kWh at 2024-01-01 01:00:00 (office)"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
        assert_eq!(json["top_consumer"]["building"], "office");
        assert_eq!(json["readings"], 3);
    }

    #[test]
    fn unwritable_output_dir_is_a_write_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();

        let err = export(&blocker, vec![reading("home", 1, 0, 1.0)]).unwrap_err();
        assert!(matches!(err, AppError::Write { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.txt");
        fs::write(&path, b"old contents that are longer").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // No temporary files left behind.
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}

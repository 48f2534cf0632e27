//! Synthetic campus meter data for demos and smoke runs.
//!
//! Each building gets an hourly load profile (base load, daytime bump,
//! quieter weekends) plus Gaussian noise. Output is fully determined by the
//! config, including the seed.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::error::AppError;
use crate::io::export::{ensure_output_dir, write_atomic};
use crate::report::TIMESTAMP_FORMAT;

const BUILDING_NAMES: [&str; 8] = [
    "library",
    "science",
    "admin",
    "dorm",
    "gym",
    "arts",
    "engineering",
    "dining",
];

/// Noise standard deviation as a fraction of the building's base load.
const NOISE_FRAC: f64 = 0.08;
const WEEKEND_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    pub buildings: usize,
    pub days: u32,
    pub seed: u64,
    pub start: NaiveDate,
    /// Add one file without a `kwh` column and one with malformed rows.
    pub with_invalid: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            buildings: 3,
            days: 28,
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            with_invalid: false,
        }
    }
}

/// One generated input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleData {
    pub files: Vec<SampleFile>,
    /// Valid readings across all well-formed building files.
    pub readings: usize,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.buildings == 0 {
        return Err(AppError::Configuration("Building count must be > 0.".to_string()));
    }
    if config.days == 0 {
        return Err(AppError::Configuration("Day count must be > 0.".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::Sample(format!("Noise distribution error: {e}")))?;

    let month = config.start.format("%Y-%m").to_string();
    let mut files = Vec::with_capacity(config.buildings + 2);
    let mut readings = 0;

    for i in 0..config.buildings {
        let name = building_name(i);
        let base = rng.gen_range(20.0..60.0);
        // Odd buildings carry their name in the data; even ones rely on the file name.
        let with_building_column = i % 2 == 1;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        let header: &[&str] = if with_building_column {
            &["timestamp", "building", "kwh"]
        } else {
            &["timestamp", "kwh"]
        };
        wtr.write_record(header).map_err(sample_error)?;

        for day in 0..config.days {
            let date = config
                .start
                .checked_add_days(Days::new(u64::from(day)))
                .ok_or_else(|| AppError::Sample(format!("Date overflow after {day} day(s)")))?;
            for hour in 0..24 {
                let Some(ts) = date.and_hms_opt(hour, 0, 0) else {
                    continue;
                };
                let mean = base * hourly_profile(hour) * weekday_factor(date.weekday());
                let kwh = (mean + normal.sample(&mut rng) * base * NOISE_FRAC).max(0.0);

                let timestamp = ts.format(TIMESTAMP_FORMAT).to_string();
                let kwh = format!("{kwh:.3}");
                let row = if with_building_column {
                    wtr.write_record([timestamp.as_str(), name.as_str(), kwh.as_str()])
                } else {
                    wtr.write_record([timestamp.as_str(), kwh.as_str()])
                };
                row.map_err(sample_error)?;
                readings += 1;
            }
        }

        let contents = wtr.into_inner().map_err(|e| sample_error(e.into_error()))?;
        files.push(SampleFile {
            name: format!("{name}_{month}.csv"),
            contents,
        });
    }

    if config.with_invalid {
        files.extend(invalid_files(config.start, &month));
    }

    Ok(SampleData { files, readings })
}

/// Write every generated file into `dir`, creating it if needed.
pub fn write_sample(dir: &Path, data: &SampleData) -> Result<Vec<PathBuf>, AppError> {
    ensure_output_dir(dir)?;
    let mut written = Vec::with_capacity(data.files.len());
    for file in &data.files {
        let path = dir.join(&file.name);
        write_atomic(&path, &file.contents)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), readings = data.readings, "wrote sample data");
    Ok(written)
}

fn building_name(i: usize) -> String {
    match BUILDING_NAMES.get(i) {
        Some(name) => (*name).to_string(),
        None => format!("building{}", i + 1),
    }
}

/// Relative load for an hour of day: flat overnight, a sine bump 06:00-18:00.
fn hourly_profile(hour: u32) -> f64 {
    if (6..=18).contains(&hour) {
        0.6 + 0.8 * (PI * f64::from(hour - 6) / 12.0).sin()
    } else {
        0.6
    }
}

fn weekday_factor(day: Weekday) -> f64 {
    match day {
        Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
        _ => 1.0,
    }
}

fn invalid_files(start: NaiveDate, month: &str) -> [SampleFile; 2] {
    let ts = |hour: u32| {
        start
            .and_hms_opt(hour, 0, 0)
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    };

    let missing_kwh = format!("timestamp,reading\n{},12.5\n{},13.0\n", ts(0), ts(1));
    let malformed = format!(
        "timestamp,kwh\n{},4.2\nnot-a-timestamp,3.1\n{},n/a\n{},2.0,extra\n{},5.0\n",
        ts(0),
        ts(1),
        ts(2),
        ts(3),
    );

    [
        SampleFile {
            name: format!("annex_{month}.csv"),
            contents: missing_kwh.into_bytes(),
        },
        SampleFile {
            name: format!("workshop_{month}.csv"),
            contents: malformed.into_bytes(),
        },
    ]
}

fn sample_error(e: impl std::fmt::Display) -> AppError {
    AppError::Sample(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NegativeKwhPolicy, PipelineConfig};
    use crate::io::ingest::{self, FileIssue};

    #[test]
    fn same_seed_same_files() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);

        let other = generate_sample(&SampleConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a.files[0].contents, other.files[0].contents);
    }

    #[test]
    fn file_names_and_layout() {
        let data = generate_sample(&SampleConfig { buildings: 2, days: 2, ..SampleConfig::default() }).unwrap();
        let names: Vec<&str> = data.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["library_2024-01.csv", "science_2024-01.csv"]);
        assert_eq!(data.readings, 2 * 2 * 24);

        let first = String::from_utf8(data.files[0].contents.clone()).unwrap();
        assert!(first.starts_with("timestamp,kwh\n2024-01-01 00:00:00,"));
        let second = String::from_utf8(data.files[1].contents.clone()).unwrap();
        assert!(second.starts_with("timestamp,building,kwh\n2024-01-01 00:00:00,science,"));
    }

    #[test]
    fn names_beyond_the_list_are_numbered() {
        assert_eq!(building_name(0), "library");
        assert_eq!(building_name(8), "building9");
    }

    #[test]
    fn readings_are_never_negative() {
        let data = generate_sample(&SampleConfig { buildings: 4, ..SampleConfig::default() }).unwrap();
        for file in &data.files {
            let text = std::str::from_utf8(&file.contents).unwrap();
            for line in text.lines().skip(1) {
                let kwh: f64 = line.rsplit(',').next().unwrap().parse().unwrap();
                assert!(kwh >= 0.0, "{line}");
            }
        }
    }

    #[test]
    fn zero_buildings_is_a_configuration_error() {
        let err = generate_sample(&SampleConfig { buildings: 0, ..SampleConfig::default() }).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn written_sample_ingests_with_expected_outcomes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = SampleConfig { buildings: 2, days: 3, with_invalid: true, ..SampleConfig::default() };
        let data = generate_sample(&config).unwrap();
        let paths = write_sample(tmp.path(), &data).unwrap();
        assert_eq!(paths.len(), 4);

        let mut pipeline = PipelineConfig::new(tmp.path(), tmp.path());
        pipeline.negative_kwh = NegativeKwhPolicy::Keep;
        let ingested = ingest::load_directory(&pipeline).unwrap();

        assert_eq!(ingested.files_scanned(), 4);
        assert_eq!(ingested.files_used(), 3);
        assert_eq!(ingested.logs(), vec!["Skipped annex_2024-01.csv → missing timestamp/kwh".to_string()]);
        // Building files plus the two good rows of the malformed file.
        assert_eq!(ingested.readings.len(), data.readings + 2);

        let workshop = ingested
            .outcomes
            .iter()
            .find(|o| o.file_name == "workshop_2024-01.csv")
            .unwrap();
        let report = workshop.result.as_ref().unwrap();
        assert_eq!(report.rows_malformed, 1);
        assert_eq!(report.rows_dropped, 2);
        assert!(!matches!(workshop.result, Err(FileIssue::MissingColumns { .. })));
    }
}

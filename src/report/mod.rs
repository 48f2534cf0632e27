//! Reporting utilities: headline figures and formatted text output.

pub mod format;

pub use format::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{self, BuildingSummary};
use crate::io::ingest::IngestedData;

/// Timestamp layout used in every human-facing and exported artifact.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The building with the greatest summed usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopConsumer {
    pub building: String,
    pub total_kwh: f64,
}

/// The single highest reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakLoad {
    pub timestamp: String,
    pub building: String,
    pub kwh: f64,
}

/// Headline figures for a run, shared by `summary.txt` and `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_kwh: f64,
    pub top_consumer: Option<TopConsumer>,
    pub peak_load: Option<PeakLoad>,
    pub readings: usize,
    pub buildings: usize,
    pub files_scanned: usize,
    pub files_used: usize,
    pub rows_dropped: usize,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
}

/// Compute the headline figures from the ingested data and its summary.
pub fn summarize(ingest: &IngestedData, summary: &BuildingSummary) -> RunSummary {
    let readings = &ingest.readings;

    let top_consumer = aggregate::top_consumer(summary).map(|(name, stats)| TopConsumer {
        building: name.to_string(),
        total_kwh: stats.sum,
    });
    let peak_load = aggregate::peak_load(readings).map(|r| PeakLoad {
        timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        building: r.building.clone(),
        kwh: r.kwh,
    });

    RunSummary {
        total_kwh: aggregate::grand_total(readings),
        top_consumer,
        peak_load,
        readings: readings.len(),
        buildings: summary.len(),
        files_scanned: ingest.files_scanned(),
        files_used: ingest.files_used(),
        rows_dropped: ingest.rows_dropped,
        first_day: readings.iter().map(|r| r.timestamp.date()).min(),
        last_day: readings.iter().map(|r| r.timestamp.date()).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawReading;
    use chrono::NaiveDateTime;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(building: &str, day: u32, hour: u32, kwh: f64) -> RawReading {
        RawReading {
            timestamp: ts(day, hour),
            kwh,
            building: building.to_string(),
            month: "2024-01".to_string(),
        }
    }

    #[test]
    fn summarize_headline_figures() {
        let ingest = IngestedData {
            readings: vec![
                reading("home", 3, 0, 5.0),
                reading("office", 1, 8, 9.0),
                reading("home", 2, 9, 9.0),
                reading("office", 2, 1, 1.0),
            ],
            ..IngestedData::default()
        };
        let summary = aggregate::building_summary(&ingest.readings);
        let run = summarize(&ingest, &summary);

        assert_eq!(run.total_kwh, 24.0);
        assert_eq!(
            run.top_consumer,
            Some(TopConsumer { building: "home".to_string(), total_kwh: 14.0 })
        );
        assert_eq!(
            run.peak_load,
            Some(PeakLoad {
                timestamp: "2024-01-01 08:00:00".to_string(),
                building: "office".to_string(),
                kwh: 9.0,
            })
        );
        assert_eq!(run.buildings, 2);
        assert_eq!(run.first_day, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(run.last_day, NaiveDate::from_ymd_opt(2024, 1, 3));
    }
}

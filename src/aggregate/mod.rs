//! Time-bucketed and per-building aggregates over validated readings.
//!
//! Everything here is a pure function of the dataset. All aggregates reconcile
//! to the same grand total:
//!
//! `sum(daily) == sum(weekly) == sum(summary[*].sum) == sum(kwh)`

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::domain::RawReading;

/// One bucket of a usage series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsagePoint {
    /// First calendar day covered by the bucket.
    pub period_start: NaiveDate,
    pub kwh: f64,
}

/// Ordered `(period_start, kwh)` buckets; only periods with readings appear.
pub type UsageSeries = Vec<UsagePoint>;

/// `kwh` statistics for one building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildingStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

/// Per-building statistics, ordered by building name.
pub type BuildingSummary = BTreeMap<String, BuildingStats>;

/// Sum `kwh` per calendar day (naive, no timezone conversion).
pub fn daily_usage(readings: &[RawReading]) -> UsageSeries {
    bucket_usage(readings, |r| r.timestamp.date())
}

/// Sum `kwh` per week.
///
/// Weeks start on Monday (ISO 8601) and are keyed by that Monday, so a
/// Sunday reading lands in the week that began six days earlier.
pub fn weekly_usage(readings: &[RawReading]) -> UsageSeries {
    bucket_usage(readings, |r| week_start(r.timestamp.date()))
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

fn bucket_usage(readings: &[RawReading], key: impl Fn(&RawReading) -> NaiveDate) -> UsageSeries {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in readings {
        *buckets.entry(key(r)).or_insert(0.0) += r.kwh;
    }
    buckets
        .into_iter()
        .map(|(period_start, kwh)| UsagePoint { period_start, kwh })
        .collect()
}

/// Count/mean/min/max/sum of `kwh` per building.
pub fn building_summary(readings: &[RawReading]) -> BuildingSummary {
    let mut summary: BuildingSummary = BTreeMap::new();
    for r in readings {
        summary
            .entry(r.building.clone())
            .and_modify(|s| {
                s.count += 1;
                s.sum += r.kwh;
                s.min = s.min.min(r.kwh);
                s.max = s.max.max(r.kwh);
            })
            .or_insert(BuildingStats {
                count: 1,
                mean: 0.0,
                min: r.kwh,
                max: r.kwh,
                sum: r.kwh,
            });
    }
    for stats in summary.values_mut() {
        stats.mean = stats.sum / stats.count as f64;
    }
    summary
}

/// Sum of every reading.
pub fn grand_total(readings: &[RawReading]) -> f64 {
    readings.iter().map(|r| r.kwh).sum()
}

/// Sum of a usage series.
pub fn series_total(series: &[UsagePoint]) -> f64 {
    series.iter().map(|p| p.kwh).sum()
}

/// The single highest reading; ties go to the first in ingestion order.
pub fn peak_load(readings: &[RawReading]) -> Option<&RawReading> {
    let mut best: Option<&RawReading> = None;
    for r in readings {
        match best {
            Some(b) if r.kwh <= b.kwh => {}
            _ => best = Some(r),
        }
    }
    best
}

/// The building with the greatest summed usage; ties go to the first name.
pub fn top_consumer(summary: &BuildingSummary) -> Option<(&str, &BuildingStats)> {
    let mut best: Option<(&str, &BuildingStats)> = None;
    for (name, stats) in summary {
        match best {
            Some((_, b)) if stats.sum <= b.sum => {}
            _ => best = Some((name.as_str(), stats)),
        }
    }
    best
}

//! Three-panel SVG dashboard rendered with Plotters.
//!
//! Panels, top to bottom:
//! 1. daily total over time (line) with weekly totals as per-day averages (markers)
//! 2. total usage per building (bars)
//! 3. every individual reading (scatter of timestamp vs kWh)
//!
//! The SVG document is rendered into memory first and then written atomically,
//! so a failed run never leaves a half-written image behind.

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::aggregate::{BuildingSummary, UsagePoint};
use crate::domain::{DashboardSize, RawReading};
use crate::error::AppError;
use crate::io::export::write_atomic;

pub const DASHBOARD_FILE: &str = "dashboard.svg";

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

const CAPTION_FONT: (&str, i32) = ("sans-serif", 22);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const WEEK_COLOR: RGBColor = RGBColor(214, 39, 40);
const BAR_COLOR: RGBColor = RGBColor(44, 160, 44);

/// Render the dashboard and write it to `path`.
pub fn render_dashboard(
    path: &Path,
    readings: &[RawReading],
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
    summary: &BuildingSummary,
    size: DashboardSize,
) -> Result<(), AppError> {
    let svg = render_dashboard_svg(readings, daily, weekly, summary, size)?;
    write_atomic(path, svg.as_bytes())
}

/// Render the dashboard into an SVG document.
pub fn render_dashboard_svg(
    readings: &[RawReading],
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
    summary: &BuildingSummary,
    size: DashboardSize,
) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (size.width, size.height)).into_drawing_area();
        draw_panels(&root, readings, daily, weekly, summary)
            .map_err(|e| AppError::Render(e.to_string()))?;
    }
    Ok(svg)
}

fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    readings: &[RawReading],
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
    summary: &BuildingSummary,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    draw_daily_panel(&panels[0], daily, weekly)?;
    draw_building_panel(&panels[1], summary)?;
    draw_readings_panel(&panels[2], readings)?;

    root.present()?;
    Ok(())
}

fn draw_daily_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    daily: &[UsagePoint],
    weekly: &[UsagePoint],
) -> DrawResult<DB> {
    let line: Vec<(f64, f64)> = daily
        .iter()
        .map(|p| (day_number(p.period_start), p.kwh))
        .collect();
    let weeks: Vec<(f64, f64)> = weekly
        .iter()
        .map(|p| (day_number(p.period_start), p.kwh / 7.0))
        .collect();

    let (x0, x1) = axis_range(line.iter().chain(&weeks).map(|p| p.0), false);
    let (y0, y1) = axis_range(line.iter().chain(&weeks).map(|p| p.1), true);

    let mut chart = ChartBuilder::on(area)
        .caption("Daily Energy Consumption", CAPTION_FONT)
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(64)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|v| format_day_number(*v))
        .y_desc("kWh")
        .draw()?;

    chart
        .draw_series(LineSeries::new(line.iter().copied(), &LINE_COLOR))?
        .label("daily total")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &LINE_COLOR));

    chart
        .draw_series(
            weeks
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, WEEK_COLOR.filled())),
        )?
        .label("weekly total / 7")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, WEEK_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn draw_building_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    summary: &BuildingSummary,
) -> DrawResult<DB> {
    let names: Vec<&str> = summary.keys().map(String::as_str).collect();
    let n = names.len().max(1) as i32;
    let (y0, y1) = axis_range(summary.values().map(|s| s.sum), true);

    let mut chart = ChartBuilder::on(area)
        .caption("Total Usage Per Building", CAPTION_FONT)
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(64)
        .build_cartesian_2d((0..n).into_segmented(), y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_labels(6)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| names.get(i))
                .map(|s| s.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc("kWh")
        .draw()?;

    chart.draw_series(summary.values().enumerate().map(|(i, stats)| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), stats.sum)],
            BAR_COLOR.mix(0.7).filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    Ok(())
}

fn draw_readings_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    readings: &[RawReading],
) -> DrawResult<DB> {
    let points: Vec<(f64, f64)> = readings
        .iter()
        .map(|r| (r.timestamp.and_utc().timestamp() as f64, r.kwh))
        .collect();

    let (x0, x1) = axis_range(points.iter().map(|p| p.0), false);
    let (y0, y1) = axis_range(points.iter().map(|p| p.1), true);

    let mut chart = ChartBuilder::on(area)
        .caption("All Meter Readings", CAPTION_FONT)
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(64)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(6)
        .y_labels(6)
        .x_label_formatter(&|v| format_epoch_seconds(*v))
        .x_desc("Timestamp")
        .y_desc("kWh")
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 2, LINE_COLOR.mix(0.6).filled())),
    )?;

    Ok(())
}

/// Padded `(min, max)` of the values; `(0, 1)` when there are none.
///
/// With `include_zero`, the range always covers zero (bars and totals start
/// from the axis).
fn axis_range(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    let span = hi - lo;
    let pad = if span > 1e-9 {
        span * 0.05
    } else if include_zero {
        (hi.abs() * 0.1).max(1.0)
    } else {
        1.0
    };
    let lo = if include_zero && lo >= 0.0 { 0.0 } else { lo - pad };
    (lo, hi + pad)
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn format_day_number(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn format_epoch_seconds(v: f64) -> String {
    DateTime::from_timestamp(v.round() as i64, 0)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

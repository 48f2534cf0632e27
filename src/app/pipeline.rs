//! Shared pipeline logic used by the CLI and by tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> aggregate -> registry -> dashboard -> exports
//!
//! Front-ends can then focus on presentation.

use std::path::PathBuf;

use tracing::info;

use crate::aggregate::{self, BuildingSummary, UsageSeries};
use crate::domain::{BuildingRegistry, PipelineConfig};
use crate::error::AppError;
use crate::io::export::{self, ensure_output_dir};
use crate::io::ingest::{self, IngestedData};
use crate::plot::{DASHBOARD_FILE, render_dashboard};
use crate::report::{self, RunSummary};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub daily: UsageSeries,
    pub weekly: UsageSeries,
    pub summary: BuildingSummary,
    pub registry: BuildingRegistry,
    pub run_summary: RunSummary,
    /// Written artifact paths, dashboard first when rendered.
    pub artifacts: Vec<PathBuf>,
}

/// Execute the full pipeline.
///
/// Every skip/failure line from ingestion goes to `on_log`, in file order,
/// before anything else can fail, so callers see them even when the run
/// ends in `NoValidData`.
pub fn run_pipeline(
    config: &PipelineConfig,
    mut on_log: impl FnMut(&str),
) -> Result<RunOutput, AppError> {
    // 1) Ingest.
    let ingest = ingest::load_directory(config)?;
    for line in ingest.logs() {
        on_log(&line);
    }
    if ingest.readings.is_empty() {
        return Err(AppError::NoValidData {
            files: ingest.files_scanned(),
        });
    }

    // 2) Aggregate.
    let readings = &ingest.readings;
    let daily = aggregate::daily_usage(readings);
    let weekly = aggregate::weekly_usage(readings);
    let summary = aggregate::building_summary(readings);
    info!(
        days = daily.len(),
        weeks = weekly.len(),
        buildings = summary.len(),
        "aggregated readings"
    );

    // 3) Domain model.
    let registry = BuildingRegistry::from_readings(readings);

    // 4) Dashboard + exports.
    let mut artifacts = Vec::new();
    if config.dashboard {
        ensure_output_dir(&config.output_dir)?;
        let path = config.output_dir.join(DASHBOARD_FILE);
        render_dashboard(&path, readings, &daily, &weekly, &summary, config.dashboard_size)?;
        info!(path = %path.display(), "rendered dashboard");
        artifacts.push(path);
    }

    let run_summary = report::summarize(&ingest, &summary);
    let files = export::export_results(
        &config.output_dir,
        readings,
        &summary,
        &daily,
        &weekly,
        &run_summary,
        config.head_rows,
    )?;
    artifacts.extend(files.paths());
    info!(
        dir = %config.output_dir.display(),
        artifacts = artifacts.len(),
        "exports written"
    );

    Ok(RunOutput {
        ingest,
        daily,
        weekly,
        summary,
        registry,
        run_summary,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::export::{CLEANED_FILE, SUMMARY_TEXT_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn config(data: &Path, out: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::new(data, out);
        config.dashboard = false;
        config
    }

    fn campus(dir: &Path) {
        write(
            dir,
            "home_2024-01.csv",
            "timestamp,kwh\n2024-01-01 00:00:00,1.5\n2024-01-01 01:00:00,2.5\n2024-01-08 00:00:00,4.0\n",
        );
        write(
            dir,
            "office_2024-01.csv",
            "timestamp,building,kwh\n2024-01-02 09:00:00,office,10.0\n2024-01-02 10:00:00,office,12.25\n",
        );
    }

    #[test]
    fn registry_has_one_building_per_file() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        campus(data.path());

        let run = run_pipeline(&config(data.path(), out.path()), |_| {}).unwrap();
        let names: Vec<&str> = run.registry.iter().map(|b| b.name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"home"));
        assert!(names.contains(&"office"));
        assert_eq!(run.registry.get("home").unwrap().total_kwh(), 8.0);
    }

    #[test]
    fn missing_kwh_file_is_logged_and_skipped() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        campus(data.path());
        write(data.path(), "lab_2024-01.csv", "timestamp,reading\n2024-01-01 00:00:00,99\n");

        let mut logs = Vec::new();
        let run = run_pipeline(&config(data.path(), out.path()), |l| logs.push(l.to_string())).unwrap();

        assert_eq!(logs, vec!["Skipped lab_2024-01.csv → missing timestamp/kwh".to_string()]);
        assert!(run.registry.get("lab").is_none());
        assert_eq!(run.run_summary.files_scanned, 3);
        assert_eq!(run.run_summary.files_used, 2);
    }

    #[test]
    fn zero_valid_files_is_no_valid_data() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(data.path(), "a_2024-01.csv", "timestamp,reading\n2024-01-01 00:00:00,1\n");
        write(data.path(), "b_2024-01.csv", "");

        let mut logs = Vec::new();
        let err = run_pipeline(&config(data.path(), out.path()), |l| logs.push(l.to_string())).unwrap_err();

        assert!(matches!(err, AppError::NoValidData { files: 2 }));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(logs.len(), 2);
        assert!(logs[1].starts_with("Failed to read b_2024-01.csv"));
        // Nothing was written.
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn aggregates_reconcile() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        campus(data.path());

        let run = run_pipeline(&config(data.path(), out.path()), |_| {}).unwrap();
        let total = aggregate::grand_total(&run.ingest.readings);
        let summary_total: f64 = run.summary.values().map(|s| s.sum).sum();
        let registry_total: f64 = run.registry.iter().map(|b| b.total_kwh()).sum();

        assert!((aggregate::series_total(&run.daily) - total).abs() < 1e-9);
        assert!((aggregate::series_total(&run.weekly) - total).abs() < 1e-9);
        assert!((summary_total - total).abs() < 1e-9);
        assert!((registry_total - total).abs() < 1e-9);
        assert_eq!(run.run_summary.total_kwh, total);
    }

    #[test]
    fn writes_artifacts_including_dashboard() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        campus(data.path());
        let out_dir = out.path().join("nested");

        let mut config = config(data.path(), &out_dir);
        config.dashboard = true;
        let run = run_pipeline(&config, |_| {}).unwrap();

        assert_eq!(run.artifacts.len(), 5);
        assert_eq!(run.artifacts[0], out_dir.join(DASHBOARD_FILE));
        for path in &run.artifacts {
            assert!(path.is_file(), "{}", path.display());
        }
        let report = fs::read_to_string(out_dir.join(SUMMARY_TEXT_FILE)).unwrap();
        assert!(report.contains("Highest Usage Building: office (22.25 kWh)"));
    }

    #[test]
    fn cleaned_export_round_trips() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        campus(data.path());
        let first = run_pipeline(&config(data.path(), out.path()), |_| {}).unwrap();

        // Re-ingest the cleaned file on its own.
        let again = TempDir::new().unwrap();
        fs::copy(out.path().join(CLEANED_FILE), again.path().join(CLEANED_FILE)).unwrap();
        let out2 = TempDir::new().unwrap();
        let second = run_pipeline(&config(again.path(), out2.path()), |_| {}).unwrap();

        assert_eq!(second.summary, first.summary);
        assert_eq!(second.daily, first.daily);
    }

    #[test]
    fn repeated_runs_into_the_data_dir_are_stable() {
        let data = TempDir::new().unwrap();
        campus(data.path());
        let config = config(data.path(), data.path());

        let first = run_pipeline(&config, |_| {}).unwrap();
        let mut logs = Vec::new();
        let second = run_pipeline(&config, |l| logs.push(l.to_string())).unwrap();

        assert!(logs.is_empty(), "{logs:?}");
        assert_eq!(second.registry.reports(), first.registry.reports());
        assert_eq!(second.summary, first.summary);
        assert_eq!(second.run_summary.files_scanned, 2);
        assert_eq!(second.run_summary.total_kwh, first.run_summary.total_kwh);
    }
}

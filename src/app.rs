//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the pipeline and prints its report
//! - writes synthetic demo data

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DemoArgs, RunArgs};
use crate::data::{SampleConfig, generate_sample, write_sample};
use crate::domain::{DashboardSize, PipelineConfig};
use crate::error::AppError;
use crate::report::{format_artifacts, format_building_reports, format_logs};

pub mod pipeline;

/// Entry point for the `energy` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `energy` and `energy --data-dir x` to behave like `energy run ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::observability::init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(&args),
        Command::Demo(args) => handle_demo(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(args);

    println!("=== Campus Energy Dashboard ===");
    let mut logs = Vec::new();
    let result = pipeline::run_pipeline(&config, |line| logs.push(line.to_string()));

    // Logs are printed even when the run fails afterwards.
    let logs = format_logs(&logs);
    if !logs.is_empty() {
        println!("{logs}");
    }
    let run = result?;

    println!("{}", format_building_reports(&run.registry.reports()));

    if config.plot {
        let plot = crate::plot::render_ascii_daily(&run.daily, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    print!("{}", format_artifacts(&run.artifacts));
    Ok(())
}

fn handle_demo(args: &DemoArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        buildings: args.buildings,
        days: args.days,
        seed: args.seed,
        start: args.start,
        with_invalid: args.with_invalid,
    };
    let data = generate_sample(&config)?;
    let paths = write_sample(&args.out, &data)?;
    info!(readings = data.readings, "demo data ready");

    println!("Wrote {} file(s) to {}:", paths.len(), args.out.display());
    for path in &paths {
        println!("  {}", path.display());
    }
    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    PipelineConfig {
        data_dir: args.data_dir.clone(),
        output_dir: args.out_dir.clone(),
        negative_kwh: args.negative_kwh,
        head_rows: args.head,
        dashboard: !args.no_dashboard,
        dashboard_size: DashboardSize {
            width: args.width,
            height: args.height,
        },
        plot: args.plot,
        plot_width: args.plot_width,
        plot_height: args.plot_height,
    }
}

/// Rewrite argv so `energy` defaults to `energy run`.
///
/// Rules:
/// - `energy`                         -> `energy run`
/// - `energy --data-dir x ...`        -> `energy run --data-dir x ...`
/// - `energy --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "demo");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the pyroelectric coefficient measurement tool

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use rust_pyroelectric::acquisition::{read_capture_csv, write_capture_csv, CaptureTable};
use rust_pyroelectric::config::{self, Config};
use rust_pyroelectric::processing::{
    write_records_csv, write_report_json, AnalysisPipeline, AnalysisReport,
};
use rust_pyroelectric::spectral::PhaseMethod;
use rust_pyroelectric::thermal_regulation::drivers::create_simulated_bench;
use rust_pyroelectric::thermal_regulation::{Termination, ThermalController};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PhaseMethodArg {
    /// Analytic-signal cross-phase
    Hilbert,
    /// Lag of the cross-correlation peak
    CrossCorrelation,
}

impl From<PhaseMethodArg> for PhaseMethod {
    fn from(arg: PhaseMethodArg) -> Self {
        match arg {
            PhaseMethodArg::Hilbert => PhaseMethod::Hilbert,
            PhaseMethodArg::CrossCorrelation => PhaseMethod::CrossCorrelation,
        }
    }
}

/// Pyroelectric coefficient measurement by sinusoidal thermal modulation
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Modulation and analysis frequency in Hz
    #[arg(long, global = true)]
    frequency: Option<f64>,

    /// Analysis window length in samples (odd)
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Electrode area in m²
    #[arg(long, global = true)]
    electrode_area: Option<f64>,

    /// Duration of the modulated measurement in seconds
    #[arg(long, global = true)]
    loop_time: Option<f64>,

    /// Phase estimation method
    #[arg(long, value_enum, global = true)]
    phase_method: Option<PhaseMethodArg>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a capture file and write the per-window results
    Analyze {
        /// Capture file (9-column CSV)
        capture: PathBuf,

        /// Output CSV file (defaults to <capture>_analysis.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the full report as JSON next to the CSV
        #[arg(long)]
        json: bool,
    },
    /// Run a modulated measurement on the simulated bench
    Measure {
        /// Capture output file (defaults to <sample_identification>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Analyze the capture once the run is over
        #[arg(long)]
        analyze: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = &args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }
        Config::from_file(validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    config.apply_args(
        args.frequency,
        args.window,
        args.electrode_area,
        args.loop_time,
        args.phase_method.map(PhaseMethod::from),
    );
    config::validate_specific_rules(&config)
        .context("Configuration is invalid after command line overrides")?;

    match args.command {
        Some(Command::Analyze {
            capture,
            output,
            json,
        }) => analyze_file(&config, &capture, output, json),
        Some(Command::Measure { output, analyze }) => measure(&config, output, analyze),
        None => {
            println!("Configuration loaded from {}", config_path.display());
            println!("Nothing to do: use the `analyze` or `measure` subcommand");
            Ok(())
        }
    }
}

fn analyze_file(config: &Config, capture: &Path, output: Option<PathBuf>, json: bool) -> Result<()> {
    info!("Loading capture from {}", capture.display());
    let table = read_capture_csv(capture)
        .with_context(|| format!("Failed to read capture {}", capture.display()))?;
    let output = output.unwrap_or_else(|| suffixed(capture, "_analysis", "csv"));
    analyze_table(config, &table, &output, json)?;
    Ok(())
}

fn measure(config: &Config, output: Option<PathBuf>, analyze: bool) -> Result<()> {
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(config)?;
    // Cancellation is driven by embedders; the command line runs to completion
    let running = AtomicBool::new(true);

    info!(
        "Measuring '{}' on the simulated bench",
        config.sample_identification
    );
    let summary = controller.run(bench.devices, &bench.clock, &running)?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("{}.csv", config.sample_identification)));
    write_capture_csv(&output, &summary.capture)
        .with_context(|| format!("Failed to write capture {}", output.display()))?;

    println!("Capture written to {}", output.display());
    println!(
        "- Iterations: {} ({} missed, {} clamped)",
        summary.iterations, summary.missed_iterations, summary.clamped_commands
    );
    if let Some((mean, std)) = summary.capture.signal_statistics() {
        let scale = config.measurement.quantity.presentation_scale();
        println!(
            "- Signal: {:.4} ± {:.4} {}",
            mean * scale,
            std * scale,
            config.measurement.quantity.presentation_unit()
        );
    }
    if !summary.clean_shutdown {
        warn!("The bench reported errors while shutting down");
    }
    if let Termination::Fault(reason) = &summary.termination {
        anyhow::bail!("Measurement aborted by an actuator fault: {}", reason);
    }

    if analyze {
        let analysis_path = suffixed(&output, "_analysis", "csv");
        analyze_table(config, &summary.capture, &analysis_path, false)?;
    }
    Ok(())
}

fn analyze_table(
    config: &Config,
    table: &CaptureTable,
    output: &Path,
    json: bool,
) -> Result<AnalysisReport> {
    let series = table.to_series();
    if series.len() < table.len() {
        warn!(
            "{} capture rows with missing values were dropped",
            table.len() - series.len()
        );
    }

    let pipeline = AnalysisPipeline::new(config.analysis.clone())?;
    let report = pipeline.run(&series)?;

    write_records_csv(output, &report.records, config.measurement.quantity)
        .with_context(|| format!("Failed to write analysis {}", output.display()))?;
    if json {
        let json_path = output.with_extension("json");
        write_report_json(&json_path, &report)?;
        println!("Report written to {}", json_path.display());
    }

    println!("Analysis written to {}", output.display());
    println!(
        "- Records: {} ({} windows skipped, decimation {})",
        report.records.len(),
        report.skipped_windows,
        report.decimation_ratio
    );
    if let Some(p) = report.mean_coefficient() {
        println!("- Mean pyroelectric coefficient: {:.4} µC/(m²·K)", p * 1e6);
    }
    Ok(report)
}

/// `dir/stem<suffix>.<extension>` next to `path`
fn suffixed(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::atomic::AtomicBool;

use anyhow::Result;
use rust_pyroelectric::config::Config;
use rust_pyroelectric::processing::AnalysisPipeline;
use rust_pyroelectric::PyroError;
use rust_pyroelectric::thermal_regulation::drivers::{create_simulated_bench, BenchProbe};
use rust_pyroelectric::thermal_regulation::{ControllerPhase, Termination, ThermalController};

fn short_run_config() -> Config {
    let mut config = Config::default();
    config.thermal_regulation.loop_time = 1000.0;
    config
}

fn assert_bench_de_energized(probe: &BenchProbe) -> Result<()> {
    assert_eq!(probe.supply_voltage()?, 0.0);
    assert!(!probe.supply_enabled()?);
    assert!(!probe.plate_enabled()?);
    Ok(())
}

#[test]
fn test_simulated_run_completes_and_shuts_down() -> Result<()> {
    let config = short_run_config();
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;
    let running = AtomicBool::new(true);

    let summary = controller.run(bench.devices, &bench.clock, &running)?;

    assert_eq!(summary.termination, Termination::Completed);
    assert!(summary.clean_shutdown);
    assert_eq!(summary.missed_iterations, 0);
    assert_eq!(controller.phase(), ControllerPhase::SteadyModulation);
    // One read every 0.5 s over 1000 s
    assert!((2000..=2001).contains(&summary.capture.len()));
    assert_eq!(summary.capture.len(), summary.iterations);

    let limits = &config.thermal_regulation.safety_limits;
    for record in &summary.capture.records {
        assert!(record.pid_output_voltage >= 0.0);
        assert!(record.pid_output_voltage <= limits.max_voltage);
        assert!(record.target_temp >= limits.min_temperature);
        assert!(record.target_temp <= limits.max_temperature);
    }

    // Capture timebase restarts at the beginning of modulation
    let first = summary.capture.records[0].time;
    assert!(first > 0.0 && first <= 1.0, "first timestamp {}", first);

    assert_bench_de_energized(&bench.probe)?;
    Ok(())
}

#[test]
fn test_sample_follows_modulation() -> Result<()> {
    let config = short_run_config();
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;
    let summary = controller.run(bench.devices, &bench.clock, &AtomicBool::new(true))?;

    // Second half of the run, once the loop has settled
    let records = &summary.capture.records[summary.capture.len() / 2..];
    let mean_error = records
        .iter()
        .map(|r| (r.ext_temp - r.target_temp).abs())
        .sum::<f64>()
        / records.len() as f64;
    assert!(mean_error < 1.5, "mean tracking error {} °C", mean_error);

    let (low, high) = records.iter().fold((f64::MAX, f64::MIN), |(lo, hi), r| {
        (lo.min(r.ext_temp), hi.max(r.ext_temp))
    });
    assert!(high - low > 0.5, "sample swing {} °C", high - low);
    Ok(())
}

#[test]
fn test_capture_analysis_sees_leading_current() -> Result<()> {
    let config = short_run_config();
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;
    let summary = controller.run(bench.devices, &bench.clock, &AtomicBool::new(true))?;

    let pipeline = AnalysisPipeline::new(config.analysis.clone())?;
    let report = pipeline.run(&summary.capture.to_series())?;
    assert!(!report.records.is_empty());

    let mut phases: Vec<f64> = report.records.iter().map(|r| r.phase).collect();
    phases.sort_by(|a, b| a.total_cmp(b));
    let median = phases[phases.len() / 2];
    assert!((median + 90.0).abs() < 20.0, "median phase {}", median);
    Ok(())
}

#[test]
fn test_cancelled_run_still_shuts_down() -> Result<()> {
    let config = short_run_config();
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;
    let running = AtomicBool::new(false);

    let summary = controller.run(bench.devices, &bench.clock, &running)?;

    assert_eq!(summary.termination, Termination::Cancelled);
    assert!(summary.capture.is_empty());
    assert_bench_de_energized(&bench.probe)?;
    Ok(())
}

#[test]
fn test_failed_reads_are_skipped() -> Result<()> {
    let mut config = short_run_config();
    config.simulation.read_failure_rate = 0.3;
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;

    let summary = controller.run(bench.devices, &bench.clock, &AtomicBool::new(true))?;

    assert_eq!(summary.termination, Termination::Completed);
    assert!(summary.missed_iterations > 0);
    assert_eq!(
        summary.capture.len() + summary.missed_iterations,
        summary.iterations
    );
    assert!(summary
        .capture
        .records
        .iter()
        .all(|r| r.ext_temp.is_finite() && r.current_or_voltage.is_finite()));
    assert_bench_de_energized(&bench.probe)?;
    Ok(())
}

#[test]
fn test_inactive_peltier_drives_plate_only() -> Result<()> {
    let mut config = short_run_config();
    config.thermal_regulation.peltier_active = false;
    let bench = create_simulated_bench(&config.simulation)?;
    let mut controller = ThermalController::new(&config)?;

    let summary = controller.run(bench.devices, &bench.clock, &AtomicBool::new(true))?;

    assert_eq!(summary.termination, Termination::Completed);
    assert!(summary
        .capture
        .records
        .iter()
        .all(|r| r.peltier_current == 0.0));
    assert_bench_de_energized(&bench.probe)?;
    Ok(())
}

#[test]
fn test_reused_controller_matches_fresh_controller() -> Result<()> {
    let mut config = Config::default();
    config.thermal_regulation.setup_time = 100.0;
    config.thermal_regulation.loop_time = 200.0;
    let running = AtomicBool::new(true);

    let mut reused = ThermalController::new(&config)?;
    let first = create_simulated_bench(&config.simulation)?;
    reused.run(first.devices, &first.clock, &running)?;
    let second = create_simulated_bench(&config.simulation)?;
    let rerun = reused.run(second.devices, &second.clock, &running)?;

    let mut fresh = ThermalController::new(&config)?;
    let third = create_simulated_bench(&config.simulation)?;
    let reference = fresh.run(third.devices, &third.clock, &running)?;

    assert_eq!(rerun.capture.len(), reference.capture.len());
    for (a, b) in rerun.capture.records.iter().zip(&reference.capture.records) {
        assert_eq!(a.pid_output_voltage, b.pid_output_voltage, "at t={}", a.time);
        assert_eq!(a.ext_temp, b.ext_temp, "at t={}", a.time);
    }
    Ok(())
}

#[test]
fn test_nan_loop_time_is_a_configuration_error() {
    let mut config = short_run_config();
    config.thermal_regulation.loop_time = f64::NAN;
    let err = ThermalController::new(&config).err();
    assert!(
        matches!(err, Some(PyroError::Configuration(_))),
        "unexpected result: {:?}",
        err
    );
}

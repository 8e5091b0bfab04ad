// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Export of analysis results
//!
//! The CSV file is meant for humans and plotting tools: signal columns are
//! scaled to the presentation unit of the measured quantity (nA for currents)
//! and the coefficient is reported in µC/(m²·K). The JSON report keeps SI
//! units.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use super::pipeline::{AnalysisReport, OutputRecord};
use crate::acquisition::MeasurementQuantity;
use crate::error::Result;

/// Header of the analysis CSV file
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "time",
    "temperature",
    "current",
    "phase",
    "amplitude",
    "pyroelectric_coefficient",
    "temperature_amplitude",
];

const COEFFICIENT_SCALE: f64 = 1e6;

/// Write analysis records to a CSV file, one line per record
pub fn write_records_csv(
    path: impl AsRef<Path>,
    records: &[OutputRecord],
    quantity: MeasurementQuantity,
) -> Result<()> {
    let path = path.as_ref();
    let scale = quantity.presentation_scale();
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{}", OUTPUT_COLUMNS.join(","))?;
    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            record.time,
            record.temperature,
            record.current * scale,
            record.phase,
            record.current_amplitude * scale,
            record.pyroelectric_coefficient * COEFFICIENT_SCALE,
            record.temperature_amplitude
        )?;
    }
    writer.flush()?;

    info!(
        "Wrote {} records to {:?} (signal in {}, coefficient in µC/m²K)",
        records.len(),
        path,
        quantity.presentation_unit()
    );
    Ok(())
}

/// Write the full analysis report as pretty-printed JSON
pub fn write_report_json(path: impl AsRef<Path>, report: &AnalysisReport) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    debug!("Wrote analysis report to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(time: f64) -> OutputRecord {
        OutputRecord {
            time,
            temperature: 100.5,
            current: 2e-10,
            phase: -90.0,
            current_amplitude: 4e-10,
            pyroelectric_coefficient: 2.5e-5,
            temperature_amplitude: 1.0,
        }
    }

    #[test]
    fn test_csv_scales_current_and_coefficient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.csv");
        write_records_csv(&path, &[record(10.0), record(20.0)], MeasurementQuantity::Current)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "time,temperature,current,phase,amplitude,pyroelectric_coefficient,temperature_amplitude"
        );

        let fields: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
        approx::assert_relative_eq!(fields[0], 10.0);
        approx::assert_relative_eq!(fields[2], 0.2, max_relative = 1e-12);
        approx::assert_relative_eq!(fields[3], -90.0);
        approx::assert_relative_eq!(fields[4], 0.4, max_relative = 1e-12);
        approx::assert_relative_eq!(fields[5], 25.0, max_relative = 1e-12);
    }

    #[test]
    fn test_csv_keeps_voltage_unscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.csv");
        write_records_csv(&path, &[record(0.0)], MeasurementQuantity::Voltage).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().nth(1).unwrap();
        let current: f64 = line.split(',').nth(2).unwrap().parse().unwrap();
        approx::assert_relative_eq!(current, 2e-10);
    }

    #[test]
    fn test_json_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport {
            records: vec![record(1.0)],
            skipped_windows: 3,
            decimation_ratio: 50,
            sampling_period: Some(10.0),
            generated_at: Utc::now(),
        };
        write_report_json(&path, &report).unwrap();

        let loaded: AnalysisReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.skipped_windows, 3);
        assert_eq!(loaded.decimation_ratio, 50);
        assert_eq!(loaded.generated_at, report.generated_at);
        assert_eq!(loaded.records.len(), 1);
        approx::assert_relative_eq!(loaded.records[0].pyroelectric_coefficient, 2.5e-5);
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Captured measurement data
//!
//! This module holds the data produced by an acquisition run:
//! - [`CaptureRecord`]: one row of the 9-column capture schema
//! - [`CaptureTable`]: the full capture, in acquisition order
//! - [`SampleSeries`]: the three columns consumed by the analysis pipeline
//!
//! Captures are either built incrementally during a control run or loaded
//! wholesale from a CSV file (see [`file`]).

pub mod file;

use serde::{Deserialize, Serialize};

pub use file::{read_capture_csv, write_capture_csv};

/// Physical quantity read by the electrometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementQuantity {
    /// Pyroelectric current (A)
    #[default]
    Current,
    /// Open-circuit voltage (V)
    Voltage,
}

impl MeasurementQuantity {
    /// Factor applied to the signal columns when exporting for humans
    ///
    /// Currents are reported in nA, voltages unscaled.
    pub fn presentation_scale(&self) -> f64 {
        match self {
            MeasurementQuantity::Current => 1e9,
            MeasurementQuantity::Voltage => 1.0,
        }
    }

    /// Unit of the exported signal columns
    pub fn presentation_unit(&self) -> &'static str {
        match self {
            MeasurementQuantity::Current => "nA",
            MeasurementQuantity::Voltage => "V",
        }
    }
}

/// One poll of the measurement bench, in capture column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Electrometer reading (current in A, or voltage in V)
    pub current_or_voltage: f64,
    /// Electrometer relative timestamp in seconds
    pub time: f64,
    /// Sample temperature from the electrometer thermocouple input (°C)
    pub ext_temp: f64,
    /// Coldplate internal temperature (°C)
    pub int_temp: f64,
    /// Setpoint in force for this iteration (°C)
    pub target_temp: f64,
    /// Clamped PID output commanded to the peltier supply (V)
    pub pid_output_voltage: f64,
    /// Voltage read back from the peltier supply (V)
    pub peltier_voltage: f64,
    /// Current read back from the peltier supply (A)
    pub peltier_current: f64,
    /// Electrometer voltage source reading (V)
    pub source_voltage: f64,
}

impl CaptureRecord {
    /// Column names in capture order
    pub const COLUMNS: [&'static str; 9] = [
        "current_or_voltage",
        "time",
        "ext_temp",
        "int_temp",
        "target_temp",
        "pid_output_voltage",
        "peltier_voltage",
        "peltier_current",
        "source_voltage",
    ];

    /// Build a record from a row in capture column order
    pub fn from_row(row: [f64; 9]) -> Self {
        Self {
            current_or_voltage: row[0],
            time: row[1],
            ext_temp: row[2],
            int_temp: row[3],
            target_temp: row[4],
            pid_output_voltage: row[5],
            peltier_voltage: row[6],
            peltier_current: row[7],
            source_voltage: row[8],
        }
    }

    /// Row in capture column order
    pub fn to_row(&self) -> [f64; 9] {
        [
            self.current_or_voltage,
            self.time,
            self.ext_temp,
            self.int_temp,
            self.target_temp,
            self.pid_output_voltage,
            self.peltier_voltage,
            self.peltier_current,
            self.source_voltage,
        ]
    }
}

/// A complete capture in acquisition order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureTable {
    pub records: Vec<CaptureRecord>,
}

impl CaptureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CaptureRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Project the columns consumed by the analysis: time, ext_temp and
    /// current_or_voltage. Rows with a non-finite value in any of these are
    /// dropped.
    pub fn to_series(&self) -> SampleSeries {
        let mut series = SampleSeries::with_capacity(self.records.len());
        for record in &self.records {
            if record.time.is_finite()
                && record.ext_temp.is_finite()
                && record.current_or_voltage.is_finite()
            {
                series.push(record.time, record.ext_temp, record.current_or_voltage);
            }
        }
        series
    }

    /// Mean and standard deviation of the electrometer column
    pub fn signal_statistics(&self) -> Option<(f64, f64)> {
        if self.records.is_empty() {
            return None;
        }
        let n = self.records.len() as f64;
        let mean = self.records.iter().map(|r| r.current_or_voltage).sum::<f64>() / n;
        let variance = self
            .records
            .iter()
            .map(|r| (r.current_or_voltage - mean).powi(2))
            .sum::<f64>()
            / n;
        Some((mean, variance.sqrt()))
    }
}

/// Two index-aligned series (reference temperature and fast signal) sharing
/// one time axis.
///
/// Timestamps are not required to be uniformly spaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    /// Elapsed time in seconds
    pub time: Vec<f64>,
    /// Reference temperature series
    pub reference: Vec<f64>,
    /// Current (or voltage) series under phase analysis
    pub signal: Vec<f64>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            reference: Vec::with_capacity(capacity),
            signal: Vec::with_capacity(capacity),
        }
    }

    /// Build a series from three columns of equal length
    pub fn from_columns(
        time: Vec<f64>,
        reference: Vec<f64>,
        signal: Vec<f64>,
    ) -> crate::error::Result<Self> {
        if time.len() != reference.len() || time.len() != signal.len() {
            return Err(crate::error::PyroError::Configuration(format!(
                "series length mismatch: time={}, reference={}, signal={}",
                time.len(),
                reference.len(),
                signal.len()
            )));
        }
        Ok(Self {
            time,
            reference,
            signal,
        })
    }

    /// Append one aligned sample
    pub fn push(&mut self, time: f64, reference: f64, signal: f64) {
        self.time.push(time);
        self.reference.push(reference);
        self.signal.push(signal);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Elapsed time between the first and last sample
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Nominal sampling period: mean absolute timestamp delta
    pub fn sampling_period(&self) -> Option<f64> {
        if self.time.len() < 2 {
            return None;
        }
        let total: f64 = self.time.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        Some(total / (self.time.len() - 1) as f64)
    }

    /// Keep every `ratio`-th sample starting from the first one
    pub fn decimate(&self, ratio: usize) -> SampleSeries {
        let ratio = ratio.max(1);
        SampleSeries {
            time: self.time.iter().copied().step_by(ratio).collect(),
            reference: self.reference.iter().copied().step_by(ratio).collect(),
            signal: self.signal.iter().copied().step_by(ratio).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_period_uses_mean_absolute_delta() {
        let series = SampleSeries::from_columns(
            vec![0.0, 0.5, 1.5, 2.0],
            vec![0.0; 4],
            vec![0.0; 4],
        )
        .unwrap();
        let period = series.sampling_period().unwrap();
        assert!((period - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(series.duration(), 2.0);
    }

    #[test]
    fn test_decimate_keeps_first_sample_and_stride() {
        let n = 10;
        let series = SampleSeries::from_columns(
            (0..n).map(|i| i as f64).collect(),
            (0..n).map(|i| i as f64 * 10.0).collect(),
            (0..n).map(|i| -(i as f64)).collect(),
        )
        .unwrap();
        let decimated = series.decimate(3);
        assert_eq!(decimated.time, vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(decimated.reference, vec![0.0, 30.0, 60.0, 90.0]);
        assert_eq!(decimated.signal, vec![0.0, -3.0, -6.0, -9.0]);
    }

    #[test]
    fn test_mismatched_columns_are_rejected() {
        let result = SampleSeries::from_columns(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]);
        assert!(matches!(
            result,
            Err(crate::error::PyroError::Configuration(_))
        ));
    }

    #[test]
    fn test_capture_projection_drops_non_finite_rows() {
        let mut table = CaptureTable::new();
        let mut row = [1.0; 9];
        table.push(CaptureRecord::from_row(row));
        row[2] = f64::NAN;
        table.push(CaptureRecord::from_row(row));
        row[2] = 3.0;
        row[1] = 2.0;
        table.push(CaptureRecord::from_row(row));

        let series = table.to_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series.time, vec![1.0, 2.0]);
        assert_eq!(series.reference, vec![1.0, 3.0]);
    }
}

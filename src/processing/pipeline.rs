// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Single-pass lock-in analysis
//!
//! 1. Stride-decimate the capture to `points_per_period` samples per period
//! 2. Slide an odd, centered window over the decimated series
//! 3. Per window: fit both amplitudes, estimate the phase, derive the
//!    coefficient and emit one [`OutputRecord`] for the center sample
//! 4. Keep one record every `output_stride`
//!
//! A window failing numerically is skipped and counted, never fatal.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::coefficient::CoefficientCalculator;
use crate::acquisition::SampleSeries;
use crate::config::AnalysisConfig;
use crate::error::{PyroError, Result};
use crate::preprocessing::{decimation_ratio, validate_window_length, AnalysisWindow, SignalWindower};
use crate::spectral::{create_phase_estimator, PhaseEstimator, SineFitter};

/// Analysis result for one window center, in SI units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Time of the center sample in s
    pub time: f64,
    /// Temperature of the center sample in °C
    pub temperature: f64,
    /// Signal of the center sample (A or V)
    pub current: f64,
    /// Phase of the signal relative to the temperature in degrees
    pub phase: f64,
    /// Fitted signal amplitude (A or V)
    pub current_amplitude: f64,
    /// Pyroelectric coefficient in C/(m²·K)
    pub pyroelectric_coefficient: f64,
    /// Fitted temperature amplitude in K
    pub temperature_amplitude: f64,
}

/// Output of one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub records: Vec<OutputRecord>,
    /// Windows dropped after a numeric failure
    pub skipped_windows: usize,
    /// Stride applied to the capture before windowing
    pub decimation_ratio: usize,
    /// Mean sampling period of the decimated series in s
    pub sampling_period: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    fn empty(decimation_ratio: usize, sampling_period: Option<f64>) -> Self {
        Self {
            records: Vec::new(),
            skipped_windows: 0,
            decimation_ratio,
            sampling_period,
            generated_at: Utc::now(),
        }
    }

    /// Mean coefficient over all records, if any
    pub fn mean_coefficient(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let sum: f64 = self
            .records
            .iter()
            .map(|r| r.pyroelectric_coefficient)
            .sum();
        Some(sum / self.records.len() as f64)
    }
}

/// Sliding-window lock-in analysis pipeline
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    fitter: SineFitter,
    calculator: CoefficientCalculator,
}

impl AnalysisPipeline {
    /// Create a pipeline from validated analysis parameters
    ///
    /// # Errors
    ///
    /// [`PyroError::Configuration`] for an even or too short window, a
    /// non-positive frequency or electrode area, or zero strides.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        validate_window_length(config.window)?;
        if config.window < 3 {
            return Err(PyroError::Configuration(format!(
                "window length must be at least 3, got {}",
                config.window
            )));
        }
        if !(config.frequency.is_finite() && config.frequency > 0.0) {
            return Err(PyroError::Configuration(format!(
                "frequency must be positive, got {}",
                config.frequency
            )));
        }
        if !(config.electrode_area.is_finite() && config.electrode_area > 0.0) {
            return Err(PyroError::Configuration(format!(
                "electrode area must be positive, got {}",
                config.electrode_area
            )));
        }
        if config.points_per_period == 0 || config.output_stride == 0 {
            return Err(PyroError::Configuration(
                "points per period and output stride must be at least 1".to_string(),
            ));
        }

        let fitter = SineFitter::new(config.frequency)
            .with_mode(config.fit_frequency)
            .with_max_iterations(config.max_fit_iterations);
        let calculator = CoefficientCalculator::new(config.electrode_area, config.frequency);
        Ok(Self {
            config,
            fitter,
            calculator,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a full series
    ///
    /// A decimated series shorter than the window yields an empty report.
    pub fn run(&self, series: &SampleSeries) -> Result<AnalysisReport> {
        let ratio = decimation_ratio(
            series.len(),
            series.duration(),
            self.config.frequency,
            self.config.points_per_period,
        );
        let decimated = series.decimate(ratio);
        let sampling_period = decimated.sampling_period();
        info!(
            "Analyzing {} samples decimated by {} to {} (window {}, {:?} phase)",
            series.len(),
            ratio,
            decimated.len(),
            self.config.window,
            self.config.phase_method
        );

        if decimated.len() < self.config.window {
            warn!(
                "Decimated series has {} samples, fewer than the {}-sample window: no records",
                decimated.len(),
                self.config.window
            );
            return Ok(AnalysisReport::empty(ratio, sampling_period));
        }

        let windower = SignalWindower::new(
            &decimated.reference,
            &decimated.signal,
            &decimated.time,
            self.config.window,
        )?;
        let estimator = create_phase_estimator(
            self.config.phase_method,
            self.config.frequency,
            sampling_period.unwrap_or(f64::NAN),
        );

        let mut report = AnalysisReport::empty(ratio, sampling_period);
        report.records.reserve(windower.window_count());
        for window in &windower {
            match self.analyze_window(&window, estimator.as_ref()) {
                Ok(record) => report.records.push(record),
                Err(PyroError::Numeric(reason)) => {
                    debug!("Window at index {} skipped: {}", window.index, reason);
                    report.skipped_windows += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if report.skipped_windows > 0 {
            warn!(
                "{} of {} windows skipped after numeric failures",
                report.skipped_windows,
                windower.window_count()
            );
        }

        if self.config.output_stride > 1 {
            report.records = report
                .records
                .into_iter()
                .step_by(self.config.output_stride)
                .collect();
        }

        info!("Analysis produced {} records", report.records.len());
        Ok(report)
    }

    fn analyze_window(
        &self,
        window: &AnalysisWindow<'_>,
        estimator: &dyn PhaseEstimator,
    ) -> Result<OutputRecord> {
        let temperature_amplitude = self.fitter.amplitude(window.reference, window.times)?;
        let current_amplitude = self.fitter.amplitude(window.signal, window.times)?;
        let phase = estimator.estimate(window.reference, window.signal)?;
        let coefficient = self
            .calculator
            .compute(phase, current_amplitude, temperature_amplitude)?;

        let center = (window.times.len() - 1) / 2;
        Ok(OutputRecord {
            time: window.times[center],
            temperature: window.reference[center],
            current: window.signal[center],
            phase,
            current_amplitude,
            pyroelectric_coefficient: coefficient,
            temperature_amplitude,
        })
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Lag-based phase estimation from the full cross-correlation of two windows

use std::f64::consts::PI;

use super::{wrap_degrees, PhaseEstimator};
use crate::error::{PyroError, Result};
use crate::preprocessing::normalize_window;

/// Phase estimator converting the lag of the cross-correlation peak into an
/// angle at the nominal modulation frequency
///
/// Resolution is one sampling period, i.e. `360 * frequency * sampling_period`
/// degrees.
#[derive(Debug, Clone, Copy)]
pub struct CrossCorrelationPhaseEstimator {
    frequency: f64,
    sampling_period: f64,
}

impl CrossCorrelationPhaseEstimator {
    pub fn new(frequency: f64, sampling_period: f64) -> Self {
        Self {
            frequency,
            sampling_period,
        }
    }

    /// Lag (in samples) at which `signal` best matches `reference`
    ///
    /// Positive when the signal is delayed. Ties resolve to the smallest lag.
    pub fn peak_lag(reference: &[f64], signal: &[f64]) -> isize {
        let n = reference.len() as isize;
        let mut best_lag = 0;
        let mut best = f64::NEG_INFINITY;
        for lag in -(n - 1)..n {
            // sum over k of signal[k + lag] * reference[k]
            let start = 0.max(-lag);
            let end = n.min(n - lag);
            let value: f64 = (start..end)
                .map(|k| signal[(k + lag) as usize] * reference[k as usize])
                .sum();
            if value > best {
                best = value;
                best_lag = lag;
            }
        }
        best_lag
    }
}

impl PhaseEstimator for CrossCorrelationPhaseEstimator {
    fn estimate(&self, reference: &[f64], signal: &[f64]) -> Result<f64> {
        if reference.len() != signal.len() {
            return Err(PyroError::Numeric(format!(
                "window length mismatch: {} vs {}",
                reference.len(),
                signal.len()
            )));
        }
        if !(self.sampling_period.is_finite() && self.sampling_period > 0.0) {
            return Err(PyroError::Numeric(format!(
                "invalid sampling period {}",
                self.sampling_period
            )));
        }
        let reference = normalize_window(reference)?;
        let signal = normalize_window(signal)?;
        let lag = Self::peak_lag(&reference, &signal);
        let radians = lag as f64 * self.sampling_period * 2.0 * PI * self.frequency;
        Ok(wrap_degrees(radians.to_degrees()))
    }

    fn name(&self) -> &'static str {
        "cross_correlation"
    }
}

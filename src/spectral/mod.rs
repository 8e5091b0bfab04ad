// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! Spectral analysis module
//!
//! This module handles the per-window estimators of the lock-in analysis:
//! phase between the temperature reference and the measured signal, and
//! amplitude through a sine-plus-drift least-squares fit.

mod hilbert;
mod sine_fit;
mod xcorr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use hilbert::{analytic_signal, HilbertPhaseEstimator};
pub use sine_fit::{FitResult, FrequencyMode, SineFitter};
pub use xcorr::CrossCorrelationPhaseEstimator;

/// Estimate the phase of `signal` relative to `reference`
pub trait PhaseEstimator: Send + Sync {
    /// Phase in degrees, in `(-180, 180]`; positive when the signal lags
    fn estimate(&self, reference: &[f64], signal: &[f64]) -> Result<f64>;

    fn name(&self) -> &'static str;
}

/// Phase estimation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMethod {
    #[default]
    Hilbert,
    CrossCorrelation,
}

/// Create a phase estimator for the configured method
///
/// `frequency` and `sampling_period` are only used by the cross-correlation
/// estimator to convert a lag into an angle.
pub fn create_phase_estimator(
    method: PhaseMethod,
    frequency: f64,
    sampling_period: f64,
) -> Box<dyn PhaseEstimator> {
    match method {
        PhaseMethod::Hilbert => Box::new(HilbertPhaseEstimator::new()),
        PhaseMethod::CrossCorrelation => Box::new(CrossCorrelationPhaseEstimator::new(
            frequency,
            sampling_period,
        )),
    }
}

/// Fold an angle in degrees into `(-180, 180]`
pub fn wrap_degrees(degrees: f64) -> f64 {
    let mut d = degrees % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees_range() {
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
        for k in -1000..1000 {
            let w = wrap_degrees(k as f64 * 0.73);
            assert!(w > -180.0 && w <= 180.0);
        }
    }

    #[test]
    fn test_factory_selects_estimator() {
        assert_eq!(create_phase_estimator(PhaseMethod::Hilbert, 0.01, 1.0).name(), "hilbert");
        assert_eq!(
            create_phase_estimator(PhaseMethod::CrossCorrelation, 0.01, 1.0).name(),
            "cross_correlation"
        );
    }
}

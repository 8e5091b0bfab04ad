// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Pyroelectric coefficient from the Sharp-Garn lock-in quantities
//!
//! ```text
//! p = sin(phase) * I_amp / (A * 2π f * T_amp)
//! ```
//!
//! in C/(m²·K) with the current amplitude in A, the electrode area in m², the
//! frequency in Hz and the temperature amplitude in K.

use std::f64::consts::PI;

use crate::error::{PyroError, Result};

/// Compute the pyroelectric coefficient of one window
///
/// # Errors
///
/// [`PyroError::Numeric`] when the denominator is zero or the result is not
/// finite.
pub fn pyroelectric_coefficient(
    phase_degrees: f64,
    current_amplitude: f64,
    electrode_area: f64,
    frequency: f64,
    temperature_amplitude: f64,
) -> Result<f64> {
    let denominator = electrode_area * 2.0 * PI * frequency * temperature_amplitude;
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(PyroError::Numeric(format!(
            "coefficient denominator is {} (area={}, f={}, T_amp={})",
            denominator, electrode_area, frequency, temperature_amplitude
        )));
    }
    let p = phase_degrees.to_radians().sin() * current_amplitude / denominator;
    if !p.is_finite() {
        return Err(PyroError::Numeric(format!("non-finite coefficient {}", p)));
    }
    Ok(p)
}

/// Coefficient calculator bound to one electrode area and frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientCalculator {
    pub electrode_area: f64,
    pub frequency: f64,
}

impl CoefficientCalculator {
    pub fn new(electrode_area: f64, frequency: f64) -> Self {
        Self {
            electrode_area,
            frequency,
        }
    }

    pub fn compute(
        &self,
        phase_degrees: f64,
        current_amplitude: f64,
        temperature_amplitude: f64,
    ) -> Result<f64> {
        pyroelectric_coefficient(
            phase_degrees,
            current_amplitude,
            self.electrode_area,
            self.frequency,
            temperature_amplitude,
        )
    }
}

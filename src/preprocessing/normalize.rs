// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Window normalization ahead of phase estimation
//!
//! Both phase estimators work on windows that are first standardized (zero
//! mean, unit population standard deviation) and then linearly detrended.
//! The order matters: detrending raw data would bias the phase.

use crate::error::{PyroError, Result};

/// Arithmetic mean of a slice (NaN for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0)
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Subtract the mean and divide by the standard deviation
///
/// # Errors
///
/// [`PyroError::Numeric`] when the window is empty, contains non-finite values
/// or has zero variance.
pub fn standardize(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(PyroError::Numeric("empty window".to_string()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PyroError::Numeric("window contains non-finite values".to_string()));
    }
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 || !sd.is_finite() || sd <= 1e-12 * m.abs() {
        return Err(PyroError::Numeric("zero-variance window".to_string()));
    }
    Ok(values.iter().map(|v| (v - m) / sd).collect())
}

/// Remove the least-squares straight line fitted against the sample index
pub fn detrend_linear(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return values.iter().map(|v| v - mean(values)).collect();
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    values
        .iter()
        .enumerate()
        .map(|(i, y)| y - (y_mean + slope * (i as f64 - x_mean)))
        .collect()
}

/// Standardize then detrend one window
pub fn normalize_window(values: &[f64]) -> Result<Vec<f64>> {
    let standardized = standardize(values)?;
    let detrended = detrend_linear(&standardized);
    // A pure ramp standardizes fine but leaves nothing to compare
    if detrended.iter().all(|v| v.abs() < 1e-12) {
        return Err(PyroError::Numeric(
            "window is a pure linear trend".to_string(),
        ));
    }
    Ok(detrended)
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hilbert-transform cross-phase estimation
//!
//! The analytic signal `z = x + i·H{x}` is computed with the FFT method:
//! 1. forward FFT of the real window (no zero padding)
//! 2. keep DC (and Nyquist for even lengths), double the positive
//!    frequencies, zero the negative ones
//! 3. inverse FFT, normalized by the window length
//!
//! The cross-phase of two windows is the argument of their normalized complex
//! inner product:
//!
//! ```text
//! c = <z_ref, conj(z_sig)> / sqrt(<z_ref, conj(z_ref)> · <z_sig, conj(z_sig)>)
//! ```
//!
//! A positive phase means the signal lags the reference.

use num_complex::Complex64;
use rustfft::FftPlanner;

use super::{wrap_degrees, PhaseEstimator};
use crate::error::{PyroError, Result};
use crate::preprocessing::normalize_window;

/// Compute the analytic signal of a real sequence
pub fn analytic_signal(signal: &[f64]) -> Vec<Complex64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    // Positive frequencies are bins 1..ceil(n/2); bin n/2 is Nyquist when n is even
    let positive_end = n.div_ceil(2);
    for bin in buffer.iter_mut().take(positive_end).skip(1) {
        *bin *= 2.0;
    }
    let negative_start = if n % 2 == 0 { n / 2 + 1 } else { positive_end };
    for bin in buffer.iter_mut().skip(negative_start) {
        *bin = Complex64::new(0.0, 0.0);
    }

    planner.plan_fft_inverse(n).process(&mut buffer);
    let scale = 1.0 / n as f64;
    buffer.iter_mut().for_each(|z| *z *= scale);
    buffer
}

/// Lock-in phase estimator based on analytic-signal cross-correlation
#[derive(Debug, Clone, Copy, Default)]
pub struct HilbertPhaseEstimator;

impl HilbertPhaseEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Cross-phase in degrees of two already normalized windows
    pub fn cross_phase(reference: &[f64], signal: &[f64]) -> Result<f64> {
        let z_ref = analytic_signal(reference);
        let z_sig = analytic_signal(signal);

        let cross: Complex64 = z_ref.iter().zip(&z_sig).map(|(a, b)| a * b.conj()).sum();
        let energy_ref: f64 = z_ref.iter().map(|z| z.norm_sqr()).sum();
        let energy_sig: f64 = z_sig.iter().map(|z| z.norm_sqr()).sum();

        let norm = (energy_ref * energy_sig).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(PyroError::Numeric(
                "analytic signal has no energy".to_string(),
            ));
        }
        let c = cross / norm;
        Ok(wrap_degrees(c.arg().to_degrees()))
    }
}

impl PhaseEstimator for HilbertPhaseEstimator {
    fn estimate(&self, reference: &[f64], signal: &[f64]) -> Result<f64> {
        if reference.len() != signal.len() {
            return Err(PyroError::Numeric(format!(
                "window length mismatch: {} vs {}",
                reference.len(),
                signal.len()
            )));
        }
        let reference = normalize_window(reference)?;
        let signal = normalize_window(signal)?;
        Self::cross_phase(&reference, &signal)
    }

    fn name(&self) -> &'static str {
        "hilbert"
    }
}

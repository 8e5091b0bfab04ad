// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Levenberg-Marquardt fit of an oscillation plus linear drift
//!
//! Model: `V(t) = amplitude * sin(2π * frequency * t) + offset + slope * t`
//!
//! The offset is internally referenced to the window center time so the
//! offset and slope columns of the Jacobian stay well conditioned when the
//! window sits far from `t = 0`. It is converted back before returning.

use std::f64::consts::PI;

use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PyroError, Result};
use crate::preprocessing::normalize::{mean, std_dev};

const GRADIENT_TOLERANCE: f64 = 1e-10;
const COST_TOLERANCE: f64 = 1e-12;
const STEP_TOLERANCE: f64 = 1e-10;
const ZERO_VARIANCE_RATIO: f64 = 1e-12;
const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e16;

// Parameter slots
const AMPLITUDE: usize = 0;
const FREQUENCY: usize = 1;
const OFFSET: usize = 2;
const SLOPE: usize = 3;

/// Whether the fit may move the frequency away from its nominal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    /// Frequency held at the nominal modulation frequency
    #[default]
    Fixed,
    /// Frequency seeded at the nominal value and fitted
    Free,
}

/// Parameters of a converged fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitResult {
    pub amplitude: f64,
    pub frequency: f64,
    pub offset: f64,
    pub slope: f64,
    pub iterations: usize,
    pub residual_sum_squares: f64,
}

/// Sine-plus-drift least-squares fitter
#[derive(Debug, Clone, Copy)]
pub struct SineFitter {
    frequency: f64,
    mode: FrequencyMode,
    max_iterations: usize,
}

impl SineFitter {
    pub fn new(frequency: f64) -> Self {
        Self {
            frequency,
            mode: FrequencyMode::Fixed,
            max_iterations: 200,
        }
    }

    pub fn with_mode(mut self, mode: FrequencyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Oscillation amplitude of the window, always non-negative
    pub fn amplitude(&self, values: &[f64], times: &[f64]) -> Result<f64> {
        Ok(self.fit(values, times)?.amplitude.abs())
    }

    /// Fit the model to one window
    ///
    /// # Errors
    ///
    /// [`PyroError::Numeric`] on zero variance, non-finite input, a singular
    /// normal system or when the iteration budget runs out.
    pub fn fit(&self, values: &[f64], times: &[f64]) -> Result<FitResult> {
        if values.len() != times.len() {
            return Err(PyroError::Numeric(format!(
                "fit input length mismatch: {} values, {} times",
                values.len(),
                times.len()
            )));
        }
        let active = self.active_parameters();
        if values.len() <= active.len() {
            return Err(PyroError::Numeric(format!(
                "{} samples cannot constrain {} parameters",
                values.len(),
                active.len()
            )));
        }
        if values.iter().chain(times).any(|v| !v.is_finite()) {
            return Err(PyroError::Numeric("fit input contains non-finite values".to_string()));
        }
        let m = mean(values);
        let sd = std_dev(values);
        if sd == 0.0 || sd <= ZERO_VARIANCE_RATIO * m.abs() {
            return Err(PyroError::Numeric("zero-variance window".to_string()));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(PyroError::Numeric(format!(
                "invalid fit frequency {}",
                self.frequency
            )));
        }

        let t_center = mean(times);
        let problem = Problem {
            t: Array1::from_iter(times.iter().copied()),
            y: Array1::from_iter(values.iter().copied()),
            t_center,
        };
        // offset' = offset + slope * t_center, slope starts at zero
        let mut params = [1.0, self.frequency, m, 0.0];

        let mut residuals = problem.residuals(&params);
        let mut cost = residuals.dot(&residuals);
        let signal_energy = problem.y.dot(&problem.y);
        let mut damping = INITIAL_DAMPING;

        for iteration in 1..=self.max_iterations {
            let jacobian = problem.jacobian(&params, &active);
            let normal = jacobian.t().dot(&jacobian);
            let gradient = jacobian.t().dot(&residuals);

            if cost <= f64::EPSILON * f64::EPSILON * signal_energy
                || gradient_converged(&normal, &gradient, cost)
            {
                return Ok(problem.result(&params, iteration - 1, cost));
            }

            loop {
                let mut damped = normal.clone();
                for i in 0..active.len() {
                    damped[[i, i]] += damping * normal[[i, i]].max(f64::MIN_POSITIVE);
                }
                let step = solve(damped, gradient.mapv(|g| -g)).ok_or_else(|| {
                    PyroError::Numeric("singular normal equations".to_string())
                })?;

                let mut candidate = params;
                for (slot, delta) in active.iter().zip(step.iter()) {
                    candidate[*slot] += delta;
                }
                let candidate_residuals = problem.residuals(&candidate);
                let candidate_cost = candidate_residuals.dot(&candidate_residuals);

                if candidate_cost.is_finite() && candidate_cost < cost {
                    let reduction = (cost - candidate_cost) / cost;
                    let small_step = step_converged(&normal, &step, &params, &active);
                    params = candidate;
                    residuals = candidate_residuals;
                    cost = candidate_cost;
                    damping = (damping / 10.0).max(f64::EPSILON);
                    if reduction <= COST_TOLERANCE || small_step {
                        debug!(
                            "Sine fit converged after {} iterations (cost {:.3e})",
                            iteration, cost
                        );
                        return Ok(problem.result(&params, iteration, cost));
                    }
                    break;
                }

                damping *= 10.0;
                if damping > MAX_DAMPING {
                    // No descent direction left at machine precision
                    return Ok(problem.result(&params, iteration, cost));
                }
            }
        }

        Err(PyroError::Numeric(format!(
            "sine fit did not converge within {} iterations",
            self.max_iterations
        )))
    }

    fn active_parameters(&self) -> Vec<usize> {
        match self.mode {
            FrequencyMode::Fixed => vec![AMPLITUDE, OFFSET, SLOPE],
            FrequencyMode::Free => vec![AMPLITUDE, FREQUENCY, OFFSET, SLOPE],
        }
    }
}

struct Problem {
    t: Array1<f64>,
    y: Array1<f64>,
    t_center: f64,
}

impl Problem {
    fn model(&self, params: &[f64; 4], t: f64) -> f64 {
        params[AMPLITUDE] * (2.0 * PI * params[FREQUENCY] * t).sin()
            + params[OFFSET]
            + params[SLOPE] * (t - self.t_center)
    }

    fn residuals(&self, params: &[f64; 4]) -> Array1<f64> {
        Array1::from_iter(
            self.t
                .iter()
                .zip(self.y.iter())
                .map(|(&t, &y)| self.model(params, t) - y),
        )
    }

    fn jacobian(&self, params: &[f64; 4], active: &[usize]) -> Array2<f64> {
        let mut jacobian = Array2::<f64>::zeros((self.t.len(), active.len()));
        for (row, &t) in self.t.iter().enumerate() {
            let arg = 2.0 * PI * params[FREQUENCY] * t;
            for (col, &slot) in active.iter().enumerate() {
                jacobian[[row, col]] = match slot {
                    AMPLITUDE => arg.sin(),
                    FREQUENCY => params[AMPLITUDE] * 2.0 * PI * t * arg.cos(),
                    OFFSET => 1.0,
                    _ => t - self.t_center,
                };
            }
        }
        jacobian
    }

    fn result(&self, params: &[f64; 4], iterations: usize, cost: f64) -> FitResult {
        FitResult {
            amplitude: params[AMPLITUDE],
            frequency: params[FREQUENCY],
            offset: params[OFFSET] - params[SLOPE] * self.t_center,
            slope: params[SLOPE],
            iterations,
            residual_sum_squares: cost,
        }
    }
}

/// Scaled gradient test: every component of `J^T r` is negligible against
/// its column norm times the residual norm
fn gradient_converged(normal: &Array2<f64>, gradient: &Array1<f64>, cost: f64) -> bool {
    gradient.iter().enumerate().all(|(i, g)| {
        let scale = (normal[[i, i]] * cost).sqrt();
        scale == 0.0 || g.abs() <= GRADIENT_TOLERANCE * scale
    })
}

/// Relative step test in the Marquardt-scaled norm
fn step_converged(
    normal: &Array2<f64>,
    step: &Array1<f64>,
    params: &[f64; 4],
    active: &[usize],
) -> bool {
    let (mut step_norm, mut param_norm) = (0.0, 0.0);
    for (i, (&slot, delta)) in active.iter().zip(step.iter()).enumerate() {
        let d = normal[[i, i]].sqrt();
        step_norm += (d * delta).powi(2);
        param_norm += (d * params[slot]).powi(2);
    }
    step_norm.sqrt() <= STEP_TOLERANCE * param_norm.sqrt()
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if !a[[pivot, col]].is_finite() || a[[pivot, col]].abs() < f64::MIN_POSITIVE {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

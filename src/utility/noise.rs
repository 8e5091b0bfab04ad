// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Gaussian Noise Generator
//!
//! Seeded white noise for the simulated bench. The same seed always yields
//! the same sequence, which keeps simulated runs and their analysis
//! reproducible.
//!
//! ## Examples
//!
//! ```rust
//! use rust_pyroelectric::utility::noise::GaussianNoise;
//!
//! let mut noise = GaussianNoise::new(12345);
//! let sample = noise.sample(1e-13);
//! assert!(sample.is_finite());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Gaussian white noise source
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: StdRng,
}

impl GaussianNoise {
    /// Creates a noise source from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Standard normal sample using the Box-Muller transform
    pub fn standard(&mut self) -> f64 {
        // u1 in (0, 1] to avoid ln(0)
        let u1: f64 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Normal sample with zero mean and the given standard deviation
    pub fn sample(&mut self, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        std_dev * self.standard()
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.random::<f64>() < p
    }
}

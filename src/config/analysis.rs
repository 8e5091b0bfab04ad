// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Analysis configuration
//!
//! Parameters of the sliding-window lock-in analysis.

use serde::{Deserialize, Serialize};

use crate::spectral::{FrequencyMode, PhaseMethod};

/// Lock-in analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Nominal modulation frequency in Hz
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Samples kept per modulation period after decimation
    #[serde(default = "default_points_per_period")]
    pub points_per_period: usize,

    /// Analysis window length in samples (odd)
    #[serde(default = "default_window")]
    pub window: usize,

    /// Area of the measuring electrode in m²
    #[serde(default = "default_electrode_area")]
    pub electrode_area: f64,

    /// Phase estimation algorithm
    #[serde(default)]
    pub phase_method: PhaseMethod,

    /// Whether the amplitude fit may adjust the frequency
    #[serde(default)]
    pub fit_frequency: FrequencyMode,

    /// Iteration budget of each amplitude fit
    #[serde(default = "default_max_fit_iterations")]
    pub max_fit_iterations: usize,

    /// Keep one output record every `output_stride` windows
    #[serde(default = "default_output_stride")]
    pub output_stride: usize,
}

fn default_frequency() -> f64 {
    0.01
}

fn default_points_per_period() -> usize {
    10
}

fn default_window() -> usize {
    51
}

fn default_electrode_area() -> f64 {
    240e-6
}

fn default_max_fit_iterations() -> usize {
    200
}

fn default_output_stride() -> usize {
    1
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            points_per_period: default_points_per_period(),
            window: default_window(),
            electrode_area: default_electrode_area(),
            phase_method: PhaseMethod::default(),
            fit_frequency: FrequencyMode::default(),
            max_fit_iterations: default_max_fit_iterations(),
            output_stride: default_output_stride(),
        }
    }
}

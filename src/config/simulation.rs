// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated bench configuration
//!
//! Used by the `measure` command when no hardware is attached, and by the
//! controller integration tests.

use serde::{Deserialize, Serialize};

/// Physical parameters of the simulated thermal cell and electrometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed of the measurement noise generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated time elapsed per electrometer read in seconds
    #[serde(default = "default_sample_period")]
    pub sample_period: f64,

    /// Temperature of the whole cell at start in °C
    #[serde(default = "default_ambient_temperature")]
    pub ambient_temperature: f64,

    /// First-order time constant of the coldplate in seconds
    #[serde(default = "default_plate_time_constant")]
    pub plate_time_constant: f64,

    /// Time constant of the sample following plate plus peltier in seconds
    #[serde(default = "default_sample_time_constant")]
    pub sample_time_constant: f64,

    /// Steady-state temperature lift of the peltier in °C/V
    #[serde(default = "default_peltier_gain")]
    pub peltier_gain: f64,

    /// Pyroelectric coefficient of the simulated sample in C/(m²·K)
    #[serde(default = "default_pyroelectric_coefficient")]
    pub pyroelectric_coefficient: f64,

    /// Electrode area of the simulated sample in m²
    #[serde(default = "default_electrode_area")]
    pub electrode_area: f64,

    /// Standard deviation of the current noise in A
    #[serde(default = "default_current_noise")]
    pub current_noise: f64,

    /// Standard deviation of the thermocouple noise in °C
    #[serde(default = "default_temperature_noise")]
    pub temperature_noise: f64,

    /// Probability in [0, 1] that an electrometer read fails
    #[serde(default)]
    pub read_failure_rate: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_sample_period() -> f64 {
    0.5
}

fn default_ambient_temperature() -> f64 {
    25.0
}

fn default_plate_time_constant() -> f64 {
    30.0
}

fn default_sample_time_constant() -> f64 {
    5.0
}

fn default_peltier_gain() -> f64 {
    2.0
}

fn default_pyroelectric_coefficient() -> f64 {
    30e-6
}

fn default_electrode_area() -> f64 {
    240e-6
}

fn default_current_noise() -> f64 {
    1e-13
}

fn default_temperature_noise() -> f64 {
    0.005
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            sample_period: default_sample_period(),
            ambient_temperature: default_ambient_temperature(),
            plate_time_constant: default_plate_time_constant(),
            sample_time_constant: default_sample_time_constant(),
            peltier_gain: default_peltier_gain(),
            pyroelectric_coefficient: default_pyroelectric_coefficient(),
            electrode_area: default_electrode_area(),
            current_noise: default_current_noise(),
            temperature_noise: default_temperature_noise(),
            read_failure_rate: 0.0,
        }
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Temperature modulation profile configuration

use serde::{Deserialize, Serialize};

use crate::thermal_regulation::Waveform;

/// Target temperature profile `amplitude * wave(2π f t) + slope * t + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulationConfig {
    /// Modulation amplitude in °C
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    /// Modulation frequency in Hz
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Linear drift in °C/s
    #[serde(default = "default_slope")]
    pub slope: f64,

    /// Starting temperature in °C
    #[serde(default = "default_offset")]
    pub offset: f64,

    /// Shape of the periodic component
    #[serde(default)]
    pub waveform: Waveform,
}

fn default_amplitude() -> f64 {
    1.0
}

fn default_frequency() -> f64 {
    0.01
}

fn default_slope() -> f64 {
    0.002
}

fn default_offset() -> f64 {
    100.0
}

impl Default for ModulationConfig {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            slope: default_slope(),
            offset: default_offset(),
            waveform: Waveform::default(),
        }
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Target temperature profile
//!
//! `target(t) = amplitude * wave(2π f t) + slope * t + offset`, where `wave`
//! is a sine or a square wave of unit amplitude.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::ModulationConfig;

/// Periodic component of the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    /// `+1` while the sine (rounded to 3 decimals) is positive, `-1` otherwise
    Square,
}

/// Time-varying temperature setpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationProfile {
    pub amplitude: f64,
    pub frequency: f64,
    pub slope: f64,
    pub offset: f64,
    pub waveform: Waveform,
}

impl ModulationProfile {
    pub fn new(amplitude: f64, frequency: f64, slope: f64, offset: f64) -> Self {
        Self {
            amplitude,
            frequency,
            slope,
            offset,
            waveform: Waveform::Sine,
        }
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    /// Setpoint at `t` seconds into the modulation
    pub fn target(&self, t: f64) -> f64 {
        self.amplitude * self.wave(t) + self.slope * t + self.offset
    }

    /// Drift-only part of the profile lowered by `margin`
    ///
    /// This is what the coarse plate follows while the peltier carries the
    /// oscillation.
    pub fn slow_component(&self, t: f64, margin: f64) -> f64 {
        self.slope * t + self.offset - margin
    }

    /// Lowest and highest setpoint reached over `[0, duration]`
    pub fn bounds(&self, duration: f64) -> (f64, f64) {
        let drift_end = self.slope * duration.max(0.0);
        let amplitude = self.amplitude.abs();
        (
            self.offset + drift_end.min(0.0) - amplitude,
            self.offset + drift_end.max(0.0) + amplitude,
        )
    }

    fn wave(&self, t: f64) -> f64 {
        let s = (2.0 * PI * self.frequency * t).sin();
        match self.waveform {
            Waveform::Sine => s,
            Waveform::Square => {
                if (s * 1000.0).round() / 1000.0 <= 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

impl From<&ModulationConfig> for ModulationProfile {
    fn from(config: &ModulationConfig) -> Self {
        Self::new(config.amplitude, config.frequency, config.slope, config.offset)
            .with_waveform(config.waveform)
    }
}

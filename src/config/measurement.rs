// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Electrometer configuration

use serde::{Deserialize, Serialize};

use crate::acquisition::MeasurementQuantity;

/// Electrometer measurement settings applied at bring-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Measured quantity
    #[serde(default)]
    pub quantity: MeasurementQuantity,

    /// Upper range limit (A for current, V for voltage)
    #[serde(default = "default_range")]
    pub range: f64,

    /// Integration period in power line cycles (0.01-10)
    #[serde(default = "default_nplc")]
    pub nplc: f64,

    /// Average filter window, 0 disables the filter
    #[serde(default)]
    pub average_window: u32,
}

fn default_range() -> f64 {
    2e-9
}

fn default_nplc() -> f64 {
    1.0
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            quantity: MeasurementQuantity::default(),
            range: default_range(),
            nplc: default_nplc(),
            average_window: 0,
        }
    }
}

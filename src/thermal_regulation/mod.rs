// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Thermal modulation of the sample during acquisition
//!
//! This module provides:
//! - capability traits for the bench collaborators (coldplate, electrometer,
//!   peltier power supply) and for the time source
//! - the target temperature profile
//! - a discrete PID controller
//! - the modulation controller state machine with guaranteed safe shutdown
//! - a simulated bench implementing every capability trait

pub mod controller;
pub mod drivers;
pub mod pid;
pub mod profile;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::MeasurementConfig;
use crate::error::Result;

pub use controller::{
    ControllerPhase, RunSummary, SafeShutdown, Termination, ThermalController,
};
pub use pid::{ControlState, PidController};
pub use profile::{ModulationProfile, Waveform};

/// Coarse temperature actuator carrying the sample (coldplate)
#[cfg_attr(test, mockall::automock)]
pub trait TemperaturePlate {
    /// Set the plate target temperature in °C
    fn set_target(&mut self, temperature: f64) -> Result<()>;

    fn enable(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;

    /// Plate internal temperature in °C
    fn read_actual(&mut self) -> Result<f64>;

    /// Restrict the plate target range
    fn set_limiter(&mut self, min: f64, max: f64) -> Result<()>;
}

/// One electrometer poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectrometerReading {
    /// Current (A) or voltage (V) reading
    pub signal: f64,
    /// Seconds since the last timestamp reset
    pub timestamp: f64,
    /// Sample temperature from the thermocouple input in °C
    pub ext_temperature: f64,
    /// Voltage source reading in V
    pub source_voltage: f64,
}

impl ElectrometerReading {
    /// True when every field of the reading is a finite number
    pub fn is_finite(&self) -> bool {
        self.signal.is_finite()
            && self.timestamp.is_finite()
            && self.ext_temperature.is_finite()
            && self.source_voltage.is_finite()
    }
}

/// Electrometer reading the pyroelectric signal and the sample temperature
#[cfg_attr(test, mockall::automock)]
pub trait Electrometer {
    /// Apply range and filtering settings
    fn configure(&mut self, settings: &MeasurementConfig) -> Result<()>;

    /// Block until the next reading is available
    fn read_latest(&mut self) -> Result<ElectrometerReading>;

    /// Restart the relative timestamp at zero
    fn reset(&mut self) -> Result<()>;
}

/// Power supply driving the peltier element
#[cfg_attr(test, mockall::automock)]
pub trait PowerSupply {
    fn set_current_limit(&mut self, current: f64) -> Result<()>;

    fn set_voltage(&mut self, voltage: f64) -> Result<()>;

    fn enable(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;

    /// Output voltage (V) and current (A) read back from the supply
    fn read(&mut self) -> Result<(f64, f64)>;
}

/// Monotonic time source in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// The three bench collaborators driven by one control run
pub struct DeviceSet {
    pub plate: Box<dyn TemperaturePlate + Send>,
    pub electrometer: Box<dyn Electrometer + Send>,
    pub supply: Box<dyn PowerSupply + Send>,
}

impl DeviceSet {
    pub fn new(
        plate: Box<dyn TemperaturePlate + Send>,
        electrometer: Box<dyn Electrometer + Send>,
        supply: Box<dyn PowerSupply + Send>,
    ) -> Self {
        Self {
            plate,
            electrometer,
            supply,
        }
    }
}

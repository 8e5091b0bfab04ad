// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration for the thermal modulation controller
//!
//! PID gains, actuator safety limits and the timing of the bring-up and
//! modulation phases.

use serde::{Deserialize, Serialize};

use crate::error::{PyroError, Result};

/// Main thermal regulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalRegulationConfig {
    /// PID controller parameters
    #[serde(default)]
    pub pid: PidParameters,

    /// Safety limits applied to every actuator command
    #[serde(default)]
    pub safety_limits: SafetyLimits,

    /// Bring-up duration in seconds (open loop then closed loop, half each)
    #[serde(default = "default_setup_time")]
    pub setup_time: f64,

    /// Duration of the modulated measurement in seconds
    #[serde(default = "default_loop_time")]
    pub loop_time: f64,

    /// Whether the peltier element carries the modulation
    ///
    /// When false the coldplate follows the full profile and the peltier
    /// supply stays off.
    #[serde(default = "default_true")]
    pub peltier_active: bool,

    /// Distance in °C kept between the coldplate target and the profile
    /// while the peltier is active
    #[serde(default = "default_temperature_margin")]
    pub temperature_margin: f64,

    /// Read attempts per iteration before the iteration is missed
    #[serde(default = "default_max_read_retries")]
    pub max_read_retries: u32,
}

/// PID controller parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidParameters {
    /// Proportional gain
    pub kp: f64,

    /// Integral gain
    pub ki: f64,

    /// Derivative gain
    pub kd: f64,

    /// Minimum time between two evaluations in seconds
    #[serde(default = "default_sample_interval")]
    pub sample_interval: f64,
}

/// Safety limits for the peltier supply and the coldplate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum peltier voltage in V
    pub max_voltage: f64,

    /// Peltier supply current limit in A
    pub max_current: f64,

    /// Minimum allowed temperature in °C
    pub min_temperature: f64,

    /// Maximum allowed temperature in °C
    pub max_temperature: f64,
}

impl ThermalRegulationConfig {
    /// Check the gains, limits and run timing the controller depends on
    ///
    /// Non-finite values are rejected: a NaN duration would never elapse.
    pub fn validate(&self) -> Result<()> {
        let pid = &self.pid;
        if ![pid.kp, pid.ki, pid.kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
        {
            return Err(PyroError::Configuration(format!(
                "PID gains must be non-negative: kp={}, ki={}, kd={}",
                pid.kp, pid.ki, pid.kd
            )));
        }
        if !(pid.sample_interval.is_finite() && pid.sample_interval > 0.0) {
            return Err(PyroError::Configuration(format!(
                "PID sample interval must be positive: {}",
                pid.sample_interval
            )));
        }

        let limits = &self.safety_limits;
        if !(limits.max_voltage.is_finite()
            && limits.max_voltage > 0.0
            && limits.max_current.is_finite()
            && limits.max_current > 0.0)
        {
            return Err(PyroError::Configuration(format!(
                "Voltage and current limits must be positive: {} V, {} A",
                limits.max_voltage, limits.max_current
            )));
        }
        if !(limits.min_temperature.is_finite()
            && limits.max_temperature.is_finite()
            && limits.min_temperature < limits.max_temperature)
        {
            return Err(PyroError::Configuration(format!(
                "Minimum temperature {} must be below maximum temperature {}",
                limits.min_temperature, limits.max_temperature
            )));
        }

        if !(self.setup_time.is_finite()
            && self.setup_time >= 0.0
            && self.loop_time.is_finite()
            && self.loop_time > 0.0)
        {
            return Err(PyroError::Configuration(format!(
                "Invalid run timing: setup_time={}, loop_time={}",
                self.setup_time, self.loop_time
            )));
        }
        if !(self.temperature_margin.is_finite() && self.temperature_margin >= 0.0) {
            return Err(PyroError::Configuration(format!(
                "Temperature margin must be non-negative: {}",
                self.temperature_margin
            )));
        }
        Ok(())
    }
}

impl SafetyLimits {
    /// Clamp a temperature into `[min_temperature, max_temperature]`
    pub fn clamp_temperature(&self, temperature: f64) -> f64 {
        temperature.clamp(self.min_temperature, self.max_temperature)
    }

    /// Clamp a peltier voltage into `[0, max_voltage]`
    pub fn clamp_voltage(&self, voltage: f64) -> f64 {
        voltage.clamp(0.0, self.max_voltage)
    }
}

fn default_setup_time() -> f64 {
    300.0
}

fn default_loop_time() -> f64 {
    15000.0
}

fn default_true() -> bool {
    true
}

fn default_temperature_margin() -> f64 {
    5.0
}

fn default_max_read_retries() -> u32 {
    3
}

fn default_sample_interval() -> f64 {
    0.1
}

impl Default for PidParameters {
    fn default() -> Self {
        Self {
            kp: 0.6,
            ki: 0.03,
            kd: 0.05,
            sample_interval: default_sample_interval(),
        }
    }
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_voltage: 5.0,
            max_current: 4.0,
            min_temperature: -10.0,
            max_temperature: 150.0,
        }
    }
}

impl Default for ThermalRegulationConfig {
    fn default() -> Self {
        Self {
            pid: PidParameters::default(),
            safety_limits: SafetyLimits::default(),
            setup_time: default_setup_time(),
            loop_time: default_loop_time(),
            peltier_active: true,
            temperature_margin: default_temperature_margin(),
            max_read_retries: default_max_read_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        let limits = SafetyLimits::default();
        assert_eq!(limits.clamp_voltage(-3.0), 0.0);
        assert_eq!(limits.clamp_voltage(1e9), 5.0);
        assert_eq!(limits.clamp_temperature(500.0), 150.0);
        assert_eq!(limits.clamp_temperature(20.0), 20.0);
    }

    #[test]
    fn test_default_regulation_is_valid() {
        assert!(ThermalRegulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_finite_timing_rejected() {
        for (setup_time, loop_time) in [(300.0, f64::NAN), (f64::NAN, 100.0), (300.0, 0.0)] {
            let config = ThermalRegulationConfig {
                setup_time,
                loop_time,
                ..ThermalRegulationConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PyroError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_bad_pid_parameters_rejected() {
        let mut config = ThermalRegulationConfig::default();
        config.pid.sample_interval = 0.0;
        assert!(config.validate().is_err());

        let mut config = ThermalRegulationConfig::default();
        config.pid.kd = f64::NAN;
        assert!(config.validate().is_err());
    }
}

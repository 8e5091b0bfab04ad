// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated measurement bench
//!
//! The simulation models:
//! - a coldplate with first-order dynamics toward its (limited) target
//! - a peltier element lifting the sample above the plate in proportion to
//!   its supply voltage, bounded by the supply current limit
//! - the sample following plate plus peltier with its own time constant
//! - a pyroelectric current `p * A * dT/dt` plus gaussian noise
//!
//! Time is simulated: every electrometer read advances it by one sample
//! period, so a full run completes as fast as the host allows. The
//! [`SimulatedClock`] returned with the devices reads the same timebase.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::acquisition::MeasurementQuantity;
use crate::config::{MeasurementConfig, SimulationConfig};
use crate::error::{PyroError, Result};
use crate::thermal_regulation::{
    Clock, DeviceSet, Electrometer, ElectrometerReading, PowerSupply, TemperaturePlate,
};
use crate::utility::GaussianNoise;

/// Electrical resistance of the simulated peltier element in Ohms
const PELTIER_RESISTANCE_OHM: f64 = 1.5;
/// Input resistance converting the pyroelectric current into a voltage
const VOLTAGE_MODE_INPUT_RESISTANCE_OHM: f64 = 1e9;

/// Shared physical state of the bench
#[derive(Debug)]
struct BenchState {
    config: SimulationConfig,
    quantity: MeasurementQuantity,
    noise: GaussianNoise,
    /// Simulated time in seconds
    time: f64,
    /// Simulated time of the last electrometer timestamp reset
    timestamp_origin: f64,
    plate_temperature: f64,
    plate_target: f64,
    plate_enabled: bool,
    plate_limits: (f64, f64),
    sample_temperature: f64,
    supply_voltage: f64,
    supply_current_limit: f64,
    supply_enabled: bool,
}

impl BenchState {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            noise: GaussianNoise::new(config.seed),
            quantity: MeasurementQuantity::Current,
            time: 0.0,
            timestamp_origin: 0.0,
            plate_temperature: config.ambient_temperature,
            plate_target: config.ambient_temperature,
            plate_enabled: false,
            plate_limits: (f64::NEG_INFINITY, f64::INFINITY),
            sample_temperature: config.ambient_temperature,
            supply_voltage: 0.0,
            supply_current_limit: 0.0,
            supply_enabled: false,
            config: config.clone(),
        }
    }

    /// Peltier current, bounded by the supply current limit
    fn peltier_current(&self) -> f64 {
        if !self.supply_enabled {
            return 0.0;
        }
        (self.supply_voltage / PELTIER_RESISTANCE_OHM).min(self.supply_current_limit)
    }

    /// Advance the thermal model by `dt` seconds; returns dT/dt of the sample
    fn step(&mut self, dt: f64) -> f64 {
        let plate_goal = if self.plate_enabled {
            self.plate_target.clamp(self.plate_limits.0, self.plate_limits.1)
        } else {
            self.config.ambient_temperature
        };
        let plate_factor = 1.0 - (-dt / self.config.plate_time_constant).exp();
        self.plate_temperature += (plate_goal - self.plate_temperature) * plate_factor;

        let effective_voltage = self.peltier_current() * PELTIER_RESISTANCE_OHM;
        let sample_goal = self.plate_temperature + self.config.peltier_gain * effective_voltage;
        let sample_factor = 1.0 - (-dt / self.config.sample_time_constant).exp();
        let previous = self.sample_temperature;
        self.sample_temperature += (sample_goal - self.sample_temperature) * sample_factor;

        self.time += dt;
        (self.sample_temperature - previous) / dt
    }
}

/// Handle on the shared bench state held by every simulated device
#[derive(Debug, Clone)]
struct SharedBench(Arc<Mutex<BenchState>>);

impl SharedBench {
    fn lock(&self, device: &str) -> Result<MutexGuard<'_, BenchState>> {
        self.0
            .lock()
            .map_err(|_| PyroError::acquisition(device, "simulation state poisoned"))
    }
}

/// Simulated coldplate
pub struct SimulatedPlate {
    bench: SharedBench,
}

impl TemperaturePlate for SimulatedPlate {
    fn set_target(&mut self, temperature: f64) -> Result<()> {
        self.bench.lock("plate")?.plate_target = temperature;
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        self.bench.lock("plate")?.plate_enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.bench.lock("plate")?.plate_enabled = false;
        Ok(())
    }

    fn read_actual(&mut self) -> Result<f64> {
        Ok(self.bench.lock("plate")?.plate_temperature)
    }

    fn set_limiter(&mut self, min: f64, max: f64) -> Result<()> {
        if min >= max {
            return Err(PyroError::acquisition(
                "plate",
                format!("invalid limiter range [{}, {}]", min, max),
            ));
        }
        self.bench.lock("plate")?.plate_limits = (min, max);
        Ok(())
    }
}

/// Simulated electrometer with thermocouple input
pub struct SimulatedElectrometer {
    bench: SharedBench,
}

impl Electrometer for SimulatedElectrometer {
    fn configure(&mut self, settings: &MeasurementConfig) -> Result<()> {
        let mut state = self.bench.lock("electrometer")?;
        let now = state.time;
        state.quantity = settings.quantity;
        state.timestamp_origin = now;
        debug!(
            "Simulated electrometer measuring {:?}, range {}",
            settings.quantity, settings.range
        );
        Ok(())
    }

    fn read_latest(&mut self) -> Result<ElectrometerReading> {
        let mut state = self.bench.lock("electrometer")?;
        let dt = state.config.sample_period;
        let rate = state.step(dt);

        let failure_rate = state.config.read_failure_rate;
        if state.noise.chance(failure_rate) {
            return Err(PyroError::acquisition("electrometer", "read timeout"));
        }

        let current_noise = state.config.current_noise;
        let displacement =
            state.config.pyroelectric_coefficient * state.config.electrode_area * rate;
        let current = displacement + state.noise.sample(current_noise);
        let signal = match state.quantity {
            MeasurementQuantity::Current => current,
            MeasurementQuantity::Voltage => current * VOLTAGE_MODE_INPUT_RESISTANCE_OHM,
        };
        let temperature_noise = state.config.temperature_noise;
        let sample_temperature = state.sample_temperature;
        let ext_temperature = sample_temperature + state.noise.sample(temperature_noise);

        Ok(ElectrometerReading {
            signal,
            timestamp: state.time - state.timestamp_origin,
            ext_temperature,
            source_voltage: 0.0,
        })
    }

    fn reset(&mut self) -> Result<()> {
        let mut state = self.bench.lock("electrometer")?;
        let now = state.time;
        state.timestamp_origin = now;
        Ok(())
    }
}

/// Simulated peltier power supply
pub struct SimulatedSupply {
    bench: SharedBench,
}

impl PowerSupply for SimulatedSupply {
    fn set_current_limit(&mut self, current: f64) -> Result<()> {
        self.bench.lock("supply")?.supply_current_limit = current.max(0.0);
        Ok(())
    }

    fn set_voltage(&mut self, voltage: f64) -> Result<()> {
        self.bench.lock("supply")?.supply_voltage = voltage;
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        self.bench.lock("supply")?.supply_enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.bench.lock("supply")?.supply_enabled = false;
        Ok(())
    }

    fn read(&mut self) -> Result<(f64, f64)> {
        let state = self.bench.lock("supply")?;
        let current = state.peltier_current();
        let voltage = if state.supply_enabled {
            current * PELTIER_RESISTANCE_OHM
        } else {
            0.0
        };
        Ok((voltage, current))
    }
}

/// Clock reading the simulated time of the bench
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    bench: SharedBench,
}

impl Clock for SimulatedClock {
    fn now(&self) -> f64 {
        // A poisoned lock still holds a consistent time value
        match self.bench.0.lock() {
            Ok(state) => state.time,
            Err(poisoned) => poisoned.into_inner().time,
        }
    }
}

/// Read-only view of the bench used to check its state after a run
#[derive(Debug, Clone)]
pub struct BenchProbe {
    bench: SharedBench,
}

impl BenchProbe {
    fn read<T>(&self, f: impl FnOnce(&BenchState) -> T) -> Result<T> {
        let state = self.bench.lock("probe")?;
        Ok(f(&state))
    }

    pub fn supply_voltage(&self) -> Result<f64> {
        self.read(|s| s.supply_voltage)
    }

    pub fn supply_enabled(&self) -> Result<bool> {
        self.read(|s| s.supply_enabled)
    }

    pub fn plate_enabled(&self) -> Result<bool> {
        self.read(|s| s.plate_enabled)
    }

    pub fn sample_temperature(&self) -> Result<f64> {
        self.read(|s| s.sample_temperature)
    }

    pub fn time(&self) -> Result<f64> {
        self.read(|s| s.time)
    }
}

/// Devices, clock and probe sharing one simulated bench
pub struct SimulatedBench {
    pub devices: DeviceSet,
    pub clock: SimulatedClock,
    pub probe: BenchProbe,
}

/// Build a simulated bench
///
/// # Errors
///
/// [`PyroError::Configuration`] for non-positive time constants or sample
/// period, or a failure rate outside `[0, 1]`.
pub fn create_simulated_bench(config: &SimulationConfig) -> Result<SimulatedBench> {
    if !(config.sample_period > 0.0
        && config.plate_time_constant > 0.0
        && config.sample_time_constant > 0.0)
    {
        return Err(PyroError::Configuration(
            "simulation sample period and time constants must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.read_failure_rate) {
        return Err(PyroError::Configuration(format!(
            "read failure rate {} outside [0, 1]",
            config.read_failure_rate
        )));
    }

    info!(
        "Simulated bench: p={} C/(m²K), area={} m², sample period {} s, seed {}",
        config.pyroelectric_coefficient, config.electrode_area, config.sample_period, config.seed
    );
    let bench = SharedBench(Arc::new(Mutex::new(BenchState::new(config))));
    Ok(SimulatedBench {
        devices: DeviceSet::new(
            Box::new(SimulatedPlate {
                bench: bench.clone(),
            }),
            Box::new(SimulatedElectrometer {
                bench: bench.clone(),
            }),
            Box::new(SimulatedSupply {
                bench: bench.clone(),
            }),
        ),
        clock: SimulatedClock {
            bench: bench.clone(),
        },
        probe: BenchProbe { bench },
    })
}

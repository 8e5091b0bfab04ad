// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Thermal modulation controller
//!
//! A control run goes through three phases:
//!
//! 1. **OpenLoopApproach** (first half of `setup_time`): the coldplate targets
//!    `offset - temperature_margin`, the peltier is held at 0 V and the PID is
//!    not evaluated.
//! 2. **ClosedLoopSettle** (until `setup_time`): the PID holds the sample at
//!    `offset` through the peltier.
//! 3. **SteadyModulation** (for `loop_time`): the setpoint follows the
//!    modulation profile and every iteration is captured.
//!
//! Between settle and modulation the plate limiter is set to the temperature
//! limits and the electrometer timestamp is reset, so the capture timebase
//! starts at zero.
//!
//! The bench is always left de-energized: [`SafeShutdown`] sets the supply to
//! 0 V, disables it and disables the plate, either explicitly through
//! [`SafeShutdown::finish`] or when dropped on an error path.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use serde::Serialize;

use super::pid::{ControlState, PidController};
use super::profile::ModulationProfile;
use super::{Clock, DeviceSet, Electrometer, ElectrometerReading};
use crate::acquisition::{CaptureRecord, CaptureTable};
use crate::config::{Config, MeasurementConfig, SafetyLimits, ThermalRegulationConfig};
use crate::error::{PyroError, Result};

/// Phase of the control state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerPhase {
    OpenLoopApproach,
    ClosedLoopSettle,
    SteadyModulation,
}

/// Why a control run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Termination {
    /// `loop_time` elapsed
    Completed,
    /// The running flag was cleared
    Cancelled,
    /// An actuator command failed
    Fault(String),
}

/// Outcome of a control run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One record per successful modulation iteration
    pub capture: CaptureTable,
    /// Modulation iterations started
    pub iterations: usize,
    /// Iterations skipped after exhausting read retries
    pub missed_iterations: usize,
    /// Commands clamped into the safety limits
    pub clamped_commands: usize,
    pub termination: Termination,
    /// False if de-energizing the bench reported an error
    pub clean_shutdown: bool,
}

/// Scope guard over the bench collaborators
///
/// Dereferences to the [`DeviceSet`]. Dropping the guard de-energizes the
/// bench and logs any failure; [`SafeShutdown::finish`] does the same and
/// returns the first failure instead.
pub struct SafeShutdown {
    devices: DeviceSet,
    armed: bool,
}

impl SafeShutdown {
    pub fn new(devices: DeviceSet) -> Self {
        Self {
            devices,
            armed: true,
        }
    }

    /// De-energize the bench and release the guard
    pub fn finish(mut self) -> Result<()> {
        self.armed = false;
        Self::shutdown(&mut self.devices)
    }

    fn shutdown(devices: &mut DeviceSet) -> Result<()> {
        info!("De-energizing actuators");
        // Every step is attempted even if an earlier one fails
        let steps = [
            ("set supply to 0 V", devices.supply.set_voltage(0.0)),
            ("disable supply", devices.supply.disable()),
            ("disable plate", devices.plate.disable()),
        ];
        let mut first_error = None;
        for (step, result) in steps {
            if let Err(e) = result {
                error!("Shutdown step '{}' failed: {}", step, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Deref for SafeShutdown {
    type Target = DeviceSet;

    fn deref(&self) -> &Self::Target {
        &self.devices
    }
}

impl DerefMut for SafeShutdown {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.devices
    }
}

impl Drop for SafeShutdown {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            if let Err(e) = Self::shutdown(&mut self.devices) {
                error!("Bench left in an unknown state: {}", e);
            }
        }
    }
}

/// Closed-loop thermal modulation controller
pub struct ThermalController {
    regulation: ThermalRegulationConfig,
    measurement: MeasurementConfig,
    profile: ModulationProfile,
    pid: PidController,
    phase: ControllerPhase,
}

impl ThermalController {
    /// Build a controller from a validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        let regulation = config.thermal_regulation.clone();
        regulation.validate()?;
        let pid = PidController::new(&regulation.pid, regulation.safety_limits.max_voltage);
        Ok(Self {
            measurement: config.measurement.clone(),
            profile: ModulationProfile::from(&config.modulation),
            pid,
            phase: ControllerPhase::OpenLoopApproach,
            regulation,
        })
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn state(&self) -> &ControlState {
        self.pid.state()
    }

    pub fn profile(&self) -> &ModulationProfile {
        &self.profile
    }

    fn limits(&self) -> &SafetyLimits {
        &self.regulation.safety_limits
    }

    fn margin(&self) -> f64 {
        if self.regulation.peltier_active {
            self.regulation.temperature_margin
        } else {
            0.0
        }
    }

    /// Run bring-up and modulation on `devices`
    ///
    /// Returns an error only if bring-up fails. Once modulation has started,
    /// an actuator failure ends the run with [`Termination::Fault`] and the
    /// partial capture is kept. The bench is de-energized in every case.
    pub fn run(
        &mut self,
        devices: DeviceSet,
        clock: &dyn Clock,
        running: &AtomicBool,
    ) -> Result<RunSummary> {
        let mut guard = SafeShutdown::new(devices);
        // On error the guard is dropped here and shuts the bench down
        let mut summary = self.run_phases(&mut guard, clock, running)?;

        if let Err(e) = guard.finish() {
            error!("Safe shutdown reported an error: {}", e);
            summary.clean_shutdown = false;
        }
        info!(
            "Run finished ({:?}): {} iterations, {} captured, {} missed, {} clamped",
            summary.termination,
            summary.iterations,
            summary.capture.len(),
            summary.missed_iterations,
            summary.clamped_commands
        );
        Ok(summary)
    }

    fn run_phases(
        &mut self,
        devices: &mut DeviceSet,
        clock: &dyn Clock,
        running: &AtomicBool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            capture: CaptureTable::new(),
            iterations: 0,
            missed_iterations: 0,
            clamped_commands: 0,
            termination: Termination::Completed,
            clean_shutdown: true,
        };

        self.bring_up(devices)?;
        if !self.settle(devices, clock, running, &mut summary)? {
            summary.termination = Termination::Cancelled;
            return Ok(summary);
        }

        devices.plate.set_limiter(
            self.limits().min_temperature,
            self.limits().max_temperature,
        )?;
        devices.electrometer.reset()?;
        self.phase = ControllerPhase::SteadyModulation;
        info!(
            "Starting modulation for {} s (peltier {})",
            self.regulation.loop_time,
            if self.regulation.peltier_active { "active" } else { "inactive" }
        );

        let start = clock.now();
        loop {
            if !running.load(Ordering::SeqCst) {
                info!("Modulation cancelled");
                summary.termination = Termination::Cancelled;
                break;
            }
            if clock.now() - start > self.regulation.loop_time {
                summary.termination = Termination::Completed;
                break;
            }

            summary.iterations += 1;
            let Some(reading) = self.read_with_retries(devices.electrometer.as_mut()) else {
                summary.missed_iterations += 1;
                warn!("Iteration {} missed: no valid reading", summary.iterations);
                continue;
            };

            match self.modulation_step(devices, &reading, clock.now()) {
                Ok(record) => {
                    if self.pid.state().clamped {
                        summary.clamped_commands += 1;
                    }
                    summary.capture.push(record);
                }
                Err(e) => {
                    error!("Actuator failure during modulation: {}", e);
                    summary.termination = Termination::Fault(e.to_string());
                    break;
                }
            }
        }

        if summary.clamped_commands > 0 {
            warn!(
                "{} peltier commands were clamped into [0, {}] V",
                summary.clamped_commands,
                self.limits().max_voltage
            );
        }
        Ok(summary)
    }

    fn bring_up(&mut self, devices: &mut DeviceSet) -> Result<()> {
        // Control history never carries over from a previous run
        self.phase = ControllerPhase::OpenLoopApproach;
        self.pid.reset();
        let plate_target = self
            .limits()
            .clamp_temperature(self.profile.offset - self.margin());

        if self.regulation.peltier_active {
            devices
                .supply
                .set_current_limit(self.limits().max_current)?;
            devices.supply.set_voltage(0.0)?;
            devices.supply.enable()?;
        } else {
            devices.supply.set_current_limit(0.0)?;
            devices.supply.set_voltage(0.0)?;
            devices.supply.disable()?;
        }

        info!("Bringing the plate to {:.2} °C", plate_target);
        devices.plate.set_target(plate_target)?;
        devices.plate.enable()?;
        devices.electrometer.configure(&self.measurement)?;
        self.pid.set_setpoint(self.profile.offset);
        Ok(())
    }

    /// Open-loop approach then closed-loop settle; false when cancelled
    fn settle(
        &mut self,
        devices: &mut DeviceSet,
        clock: &dyn Clock,
        running: &AtomicBool,
        summary: &mut RunSummary,
    ) -> Result<bool> {
        let setup_time = self.regulation.setup_time;
        let start = clock.now();
        loop {
            if !running.load(Ordering::SeqCst) {
                info!("Cancelled during {:?}", self.phase);
                return Ok(false);
            }
            let elapsed = clock.now() - start;
            if elapsed >= setup_time {
                return Ok(true);
            }
            if self.phase == ControllerPhase::OpenLoopApproach && elapsed > setup_time / 2.0 {
                self.phase = ControllerPhase::ClosedLoopSettle;
                info!("Closing the loop at {:.2} °C", self.profile.offset);
            }

            let Some(reading) = self.read_with_retries(devices.electrometer.as_mut()) else {
                continue;
            };
            debug!(
                "{:?}: t={:.2} s, sample at {:.3} °C",
                self.phase, elapsed, reading.ext_temperature
            );

            if self.phase == ControllerPhase::ClosedLoopSettle {
                let output = self.pid.compute(reading.ext_temperature, clock.now());
                let voltage = self.limits().clamp_voltage(output);
                let clamped = voltage != output;
                if clamped {
                    summary.clamped_commands += 1;
                }
                self.pid.record_command(voltage, clamped);
                devices.supply.set_voltage(voltage)?;
            }
        }
    }

    /// One steady-modulation iteration after a valid reading
    fn modulation_step(
        &mut self,
        devices: &mut DeviceSet,
        reading: &ElectrometerReading,
        now: f64,
    ) -> Result<CaptureRecord> {
        let t = reading.timestamp;

        let requested = self.profile.target(t);
        let setpoint = self.limits().clamp_temperature(requested);
        if setpoint != requested {
            let violation = PyroError::SafetyLimit {
                quantity: "setpoint",
                requested,
                min: self.limits().min_temperature,
                max: self.limits().max_temperature,
            };
            warn!("{}", violation);
        }
        self.pid.set_setpoint(setpoint);

        let output = self.pid.compute(reading.ext_temperature, now);
        let voltage = self.limits().clamp_voltage(output);
        let clamped = voltage != output;
        if clamped {
            debug!(
                "{}",
                PyroError::SafetyLimit {
                    quantity: "peltier voltage",
                    requested: output,
                    min: 0.0,
                    max: self.limits().max_voltage,
                }
            );
        }
        self.pid.record_command(voltage, clamped);
        devices.supply.set_voltage(voltage)?;

        let plate_target = if self.regulation.peltier_active {
            self.profile.slow_component(t, self.margin())
        } else {
            self.profile.target(t)
        };
        devices
            .plate
            .set_target(self.limits().clamp_temperature(plate_target))?;

        // Read-backs are informational; a failure leaves a gap in the record
        let int_temp = devices.plate.read_actual().unwrap_or_else(|e| {
            debug!("Plate read-back failed: {}", e);
            f64::NAN
        });
        let (peltier_voltage, peltier_current) = devices.supply.read().unwrap_or_else(|e| {
            debug!("Supply read-back failed: {}", e);
            (f64::NAN, f64::NAN)
        });

        debug!(
            "t={:.2} s setpoint={:.3} °C sample={:.3} °C command={:.3} V",
            t, setpoint, reading.ext_temperature, voltage
        );

        Ok(CaptureRecord {
            current_or_voltage: reading.signal,
            time: t,
            ext_temp: reading.ext_temperature,
            int_temp,
            target_temp: setpoint,
            pid_output_voltage: voltage,
            peltier_voltage,
            peltier_current,
            source_voltage: reading.source_voltage,
        })
    }

    /// Read the electrometer, retrying up to `max_read_retries` times
    ///
    /// Non-finite readings count as failures so they never reach the PID.
    fn read_with_retries(
        &self,
        electrometer: &mut (dyn Electrometer + Send),
    ) -> Option<ElectrometerReading> {
        let attempts = self.regulation.max_read_retries + 1;
        for attempt in 1..=attempts {
            match electrometer.read_latest() {
                Ok(reading) if reading.is_finite() => return Some(reading),
                Ok(_) => debug!("Attempt {}/{}: non-finite reading", attempt, attempts),
                Err(e) => debug!("Attempt {}/{}: {}", attempt, attempts, e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal_regulation::{MockElectrometer, MockPowerSupply, MockTemperaturePlate};
    use std::cell::Cell;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Clock advancing by a fixed step at every query
    struct SteppingClock {
        t: Cell<f64>,
        step: f64,
    }

    impl SteppingClock {
        fn new(step: f64) -> Self {
            Self {
                t: Cell::new(0.0),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> f64 {
            let t = self.t.get();
            self.t.set(t + self.step);
            t
        }
    }

    fn test_config(setup_time: f64, loop_time: f64) -> Config {
        let mut config = Config::default();
        config.thermal_regulation.setup_time = setup_time;
        config.thermal_regulation.loop_time = loop_time;
        config.thermal_regulation.max_read_retries = 1;
        config
    }

    fn electrometer_at(temperature: f64) -> MockElectrometer {
        let mut electrometer = MockElectrometer::new();
        electrometer.expect_configure().returning(|_| Ok(()));
        electrometer.expect_reset().returning(|| Ok(()));
        let mut t = 0.0;
        electrometer.expect_read_latest().returning(move || {
            t += 1.0;
            Ok(ElectrometerReading {
                signal: 1e-10,
                timestamp: t,
                ext_temperature: temperature,
                source_voltage: 0.0,
            })
        });
        electrometer
    }

    fn plate_expecting_shutdown() -> MockTemperaturePlate {
        let mut plate = MockTemperaturePlate::new();
        plate.expect_set_target().returning(|_| Ok(()));
        plate.expect_enable().returning(|| Ok(()));
        plate.expect_set_limiter().returning(|_, _| Ok(()));
        plate.expect_read_actual().returning(|| Ok(95.0));
        plate.expect_disable().times(1).returning(|| Ok(()));
        plate
    }

    #[test]
    fn test_commands_stay_within_voltage_limits() {
        for temperature in [-1e6, 1e6] {
            let config = test_config(0.0, 20.0);
            let mut supply = MockPowerSupply::new();
            supply.expect_set_current_limit().returning(|_| Ok(()));
            supply.expect_enable().returning(|| Ok(()));
            supply
                .expect_set_voltage()
                .withf(|v| (0.0..=5.0).contains(v))
                .returning(|_| Ok(()));
            supply.expect_read().returning(|| Ok((0.0, 0.0)));
            supply.expect_disable().times(1).returning(|| Ok(()));

            let devices = DeviceSet::new(
                Box::new(plate_expecting_shutdown()),
                Box::new(electrometer_at(temperature)),
                Box::new(supply),
            );
            let mut controller = ThermalController::new(&config).unwrap();
            let running = AtomicBool::new(true);
            let summary = controller
                .run(devices, &SteppingClock::new(1.0), &running)
                .unwrap();

            assert_eq!(summary.termination, Termination::Completed);
            assert!(!summary.capture.is_empty());
            assert_eq!(summary.clamped_commands, summary.capture.len());
            for record in &summary.capture.records {
                assert!((0.0..=5.0).contains(&record.pid_output_voltage));
            }
            assert_eq!(controller.phase(), ControllerPhase::SteadyModulation);
        }
    }

    #[test]
    fn test_setpoint_follows_profile_before_command() {
        let config = test_config(0.0, 10.0);
        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        supply.expect_set_voltage().returning(|_| Ok(()));
        supply.expect_read().returning(|| Ok((1.0, 0.5)));
        supply.expect_disable().returning(|| Ok(()));

        let devices = DeviceSet::new(
            Box::new(plate_expecting_shutdown()),
            Box::new(electrometer_at(100.0)),
            Box::new(supply),
        );
        let mut controller = ThermalController::new(&config).unwrap();
        let running = AtomicBool::new(true);
        let summary = controller
            .run(devices, &SteppingClock::new(1.0), &running)
            .unwrap();

        let profile = *controller.profile();
        for record in &summary.capture.records {
            assert_eq!(record.target_temp, profile.target(record.time));
            assert_eq!(record.int_temp, 95.0);
            assert_eq!(record.peltier_current, 0.5);
        }
        let last = summary.capture.records.last().unwrap();
        assert_eq!(controller.state().setpoint, last.target_temp);
        assert_eq!(controller.state().output_voltage, last.pid_output_voltage);
    }

    #[test]
    fn test_actuator_failure_ends_run_and_shuts_down() {
        let config = test_config(0.0, 100.0);
        let zero_commands = Arc::new(AtomicUsize::new(0));
        let counter = zero_commands.clone();

        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        supply
            .expect_set_voltage()
            .withf(|v| *v == 0.0)
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        supply
            .expect_set_voltage()
            .withf(|v| *v > 0.0)
            .returning(|_| Err(PyroError::acquisition("supply", "link lost")));
        supply.expect_read().returning(|| Ok((0.0, 0.0)));
        supply.expect_disable().times(1).returning(|| Ok(()));

        let devices = DeviceSet::new(
            Box::new(plate_expecting_shutdown()),
            // Far below the setpoint: the PID asks for heating immediately
            Box::new(electrometer_at(20.0)),
            Box::new(supply),
        );
        let mut controller = ThermalController::new(&config).unwrap();
        let running = AtomicBool::new(true);
        let summary = controller
            .run(devices, &SteppingClock::new(1.0), &running)
            .unwrap();

        assert!(matches!(summary.termination, Termination::Fault(_)));
        assert!(summary.capture.is_empty());
        // Bring-up and shutdown both command 0 V
        assert_eq!(zero_commands.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bring_up_failure_still_shuts_down() {
        let config = test_config(10.0, 10.0);
        let mut electrometer = MockElectrometer::new();
        electrometer
            .expect_configure()
            .returning(|_| Err(PyroError::acquisition("electrometer", "no response")));

        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        supply.expect_set_voltage().returning(|_| Ok(()));
        supply.expect_disable().times(1).returning(|| Ok(()));

        let mut plate = MockTemperaturePlate::new();
        plate.expect_set_target().returning(|_| Ok(()));
        plate.expect_enable().returning(|| Ok(()));
        plate.expect_disable().times(1).returning(|| Ok(()));

        let devices = DeviceSet::new(Box::new(plate), Box::new(electrometer), Box::new(supply));
        let mut controller = ThermalController::new(&config).unwrap();
        let running = AtomicBool::new(true);
        let result = controller.run(devices, &SteppingClock::new(1.0), &running);
        assert!(matches!(result, Err(PyroError::Acquisition { .. })));
    }

    #[test]
    fn test_failed_reads_are_missed_not_fed_to_pid() {
        let config = test_config(0.0, 12.0);
        let mut electrometer = MockElectrometer::new();
        electrometer.expect_configure().returning(|_| Ok(()));
        electrometer.expect_reset().returning(|| Ok(()));
        electrometer
            .expect_read_latest()
            .returning(|| Err(PyroError::acquisition("electrometer", "timeout")));

        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        // Only bring-up and shutdown commands: no iteration reaches the PID
        supply
            .expect_set_voltage()
            .withf(|v| *v == 0.0)
            .times(2)
            .returning(|_| Ok(()));
        supply.expect_disable().times(1).returning(|| Ok(()));

        let devices = DeviceSet::new(
            Box::new(plate_expecting_shutdown()),
            Box::new(electrometer),
            Box::new(supply),
        );
        let mut controller = ThermalController::new(&config).unwrap();
        let running = AtomicBool::new(true);
        let summary = controller
            .run(devices, &SteppingClock::new(1.0), &running)
            .unwrap();

        assert!(summary.iterations > 0);
        assert_eq!(summary.missed_iterations, summary.iterations);
        assert!(summary.capture.is_empty());
        assert_eq!(controller.state().last_output, None);
    }

    fn heating_devices() -> DeviceSet {
        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        supply.expect_set_voltage().returning(|_| Ok(()));
        supply.expect_read().returning(|| Ok((0.0, 0.0)));
        supply.expect_disable().returning(|| Ok(()));
        DeviceSet::new(
            Box::new(plate_expecting_shutdown()),
            Box::new(electrometer_at(99.0)),
            Box::new(supply),
        )
    }

    fn commands(summary: &RunSummary) -> Vec<f64> {
        summary
            .capture
            .records
            .iter()
            .map(|r| r.pid_output_voltage)
            .collect()
    }

    #[test]
    fn test_second_run_starts_from_fresh_control_state() {
        let config = test_config(4.0, 20.0);
        let running = AtomicBool::new(true);

        let mut reused = ThermalController::new(&config).unwrap();
        let first = reused
            .run(heating_devices(), &SteppingClock::new(1.0), &running)
            .unwrap();
        assert!(reused.state().last_update.is_some());
        let second = reused
            .run(heating_devices(), &SteppingClock::new(1.0), &running)
            .unwrap();

        let mut fresh = ThermalController::new(&config).unwrap();
        let reference = fresh
            .run(heating_devices(), &SteppingClock::new(1.0), &running)
            .unwrap();

        assert!(!reference.capture.is_empty());
        assert_eq!(commands(&first), commands(&reference));
        assert_eq!(commands(&second), commands(&reference));
    }

    #[test]
    fn test_invalid_timing_rejected_before_any_device_call() {
        let mut config = test_config(0.0, f64::NAN);
        assert!(matches!(
            ThermalController::new(&config),
            Err(PyroError::Configuration(_))
        ));

        config.thermal_regulation.loop_time = 100.0;
        config.thermal_regulation.setup_time = f64::NAN;
        assert!(ThermalController::new(&config).is_err());

        config.thermal_regulation.setup_time = 0.0;
        config.thermal_regulation.pid.sample_interval = -1.0;
        assert!(ThermalController::new(&config).is_err());

        config.thermal_regulation.pid.sample_interval = 0.1;
        config.thermal_regulation.pid.kp = -0.5;
        assert!(ThermalController::new(&config).is_err());
    }

    #[test]
    fn test_cleared_running_flag_cancels_before_modulation() {
        let config = test_config(50.0, 100.0);
        let mut supply = MockPowerSupply::new();
        supply.expect_set_current_limit().returning(|_| Ok(()));
        supply.expect_enable().returning(|| Ok(()));
        supply.expect_set_voltage().returning(|_| Ok(()));
        supply.expect_disable().times(1).returning(|| Ok(()));

        let mut plate = MockTemperaturePlate::new();
        plate.expect_set_target().returning(|_| Ok(()));
        plate.expect_enable().returning(|| Ok(()));
        plate.expect_disable().times(1).returning(|| Ok(()));

        let devices = DeviceSet::new(
            Box::new(plate),
            Box::new(electrometer_at(100.0)),
            Box::new(supply),
        );
        let mut controller = ThermalController::new(&config).unwrap();
        let running = AtomicBool::new(false);
        let summary = controller
            .run(devices, &SteppingClock::new(1.0), &running)
            .unwrap();
        assert_eq!(summary.termination, Termination::Cancelled);
        assert_eq!(summary.iterations, 0);
        assert_eq!(controller.phase(), ControllerPhase::OpenLoopApproach);
    }
}

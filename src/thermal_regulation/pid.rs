// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Discrete PID controller for the peltier voltage

use serde::Serialize;

use crate::config::PidParameters;

/// Controller state for one control run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ControlState {
    /// Setpoint in °C, updated once per iteration before the command
    pub setpoint: f64,
    /// Last measured sample temperature in °C
    pub measured_temperature: f64,
    /// Accumulated integral contribution (already multiplied by `ki`)
    pub integral_term: f64,
    pub previous_error: f64,
    /// Voltage actually commanded after clamping
    pub output_voltage: f64,
    /// Whether the last command was clamped
    pub clamped: bool,
    /// Clock time of the last evaluation
    pub last_update: Option<f64>,
    /// Unclamped output of the last evaluation
    pub last_output: Option<f64>,
}

/// Proportional, integral and derivative contributions of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PidComponents {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

/// PID controller with derivative on error and a minimum sample interval
///
/// The integral contribution is kept within `[-output_limit, output_limit]`
/// so a long saturation cannot wind it up.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    sample_interval: f64,
    output_limit: f64,
    state: ControlState,
    components: PidComponents,
}

impl PidController {
    pub fn new(params: &PidParameters, output_limit: f64) -> Self {
        Self {
            kp: params.kp,
            ki: params.ki,
            kd: params.kd,
            sample_interval: params.sample_interval,
            output_limit: output_limit.abs(),
            state: ControlState::default(),
            components: PidComponents::default(),
        }
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.state.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.state.setpoint
    }

    /// Evaluate the controller for a measurement taken at clock time `now`
    ///
    /// Returns the unclamped output. A call sooner than the sample interval
    /// after the previous evaluation returns the previous output unchanged.
    pub fn compute(&mut self, measured: f64, now: f64) -> f64 {
        self.state.measured_temperature = measured;

        if let (Some(last_update), Some(last_output)) =
            (self.state.last_update, self.state.last_output)
        {
            if now - last_update < self.sample_interval {
                return last_output;
            }
        }

        let error = self.state.setpoint - measured;
        let dt = match self.state.last_update {
            Some(last_update) => now - last_update,
            None => self.sample_interval,
        };

        let proportional = self.kp * error;

        self.state.integral_term = (self.state.integral_term + self.ki * error * dt)
            .clamp(-self.output_limit, self.output_limit);

        // No derivative kick on the first evaluation
        let derivative = if self.state.last_update.is_some() && dt > 0.0 {
            self.kd * (error - self.state.previous_error) / dt
        } else {
            0.0
        };

        let output = proportional + self.state.integral_term + derivative;

        self.components = PidComponents {
            proportional,
            integral: self.state.integral_term,
            derivative,
        };
        self.state.previous_error = error;
        self.state.last_update = Some(now);
        self.state.last_output = Some(output);
        output
    }

    /// Record the command sent after clamping
    pub fn record_command(&mut self, voltage: f64, clamped: bool) {
        self.state.output_voltage = voltage;
        self.state.clamped = clamped;
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn components(&self) -> PidComponents {
        self.components
    }

    /// Forget all history, keeping the setpoint
    pub fn reset(&mut self) {
        let setpoint = self.state.setpoint;
        self.state = ControlState {
            setpoint,
            ..ControlState::default()
        };
        self.components = PidComponents::default();
    }
}

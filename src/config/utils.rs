// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{Config, CONFIG_SCHEMA};
use crate::thermal_regulation::ModulationProfile;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_pyroelectric --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Validates the configuration against rules that the JSON schema cannot express.
///
/// # Validation Rules
///
/// - **Window**: odd and at least 3 samples
/// - **Frequencies and geometry**: strictly positive analysis and modulation
///   frequencies, electrode area, points per period and output stride
/// - **PID**: non-negative gains and a positive sample interval
/// - **Safety limits**: positive voltage and current limits, ordered
///   temperature limits
/// - **Profile**: the target temperature stays within the temperature limits
///   over the whole loop time
///
/// A mismatch between the analysis and modulation frequencies is only logged.
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let analysis = &config.analysis;
    if analysis.window < 3 || analysis.window % 2 == 0 {
        anyhow::bail!(
            "Analysis window must be odd and at least 3, got {}",
            analysis.window
        );
    }
    if !(analysis.frequency.is_finite() && analysis.frequency > 0.0) {
        anyhow::bail!("Analysis frequency must be positive: {}", analysis.frequency);
    }
    if !(analysis.electrode_area.is_finite() && analysis.electrode_area > 0.0) {
        anyhow::bail!(
            "Electrode area must be positive: {}",
            analysis.electrode_area
        );
    }
    if analysis.points_per_period == 0 {
        anyhow::bail!("Points per period must be at least 1");
    }
    if analysis.output_stride == 0 {
        anyhow::bail!("Output stride must be at least 1");
    }
    if analysis.max_fit_iterations == 0 {
        anyhow::bail!("Fit iteration budget must be at least 1");
    }

    let modulation = &config.modulation;
    if !(modulation.frequency.is_finite() && modulation.frequency > 0.0) {
        anyhow::bail!(
            "Modulation frequency must be positive: {}",
            modulation.frequency
        );
    }
    if (modulation.frequency - analysis.frequency).abs() > f64::EPSILON * analysis.frequency {
        warn!(
            "Analysis frequency {} Hz differs from modulation frequency {} Hz",
            analysis.frequency, modulation.frequency
        );
    }

    let regulation = &config.thermal_regulation;
    regulation.validate()?;
    let limits = &regulation.safety_limits;

    let profile = ModulationProfile::from(modulation);
    let (low, high) = profile.bounds(regulation.loop_time);
    if low < limits.min_temperature || high > limits.max_temperature {
        anyhow::bail!(
            "Target profile spans [{:.2}, {:.2}] °C over {} s, outside safety limits [{}, {}] °C",
            low,
            high,
            regulation.loop_time,
            limits.min_temperature,
            limits.max_temperature
        );
    }

    let simulation = &config.simulation;
    if !(0.0..=1.0).contains(&simulation.read_failure_rate) {
        anyhow::bail!(
            "Read failure rate must be within [0, 1]: {}",
            simulation.read_failure_rate
        );
    }
    if !(simulation.sample_period > 0.0
        && simulation.plate_time_constant > 0.0
        && simulation.sample_time_constant > 0.0)
    {
        anyhow::bail!("Simulation sample period and time constants must be positive");
    }

    Ok(())
}

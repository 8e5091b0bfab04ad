// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the pyroelectric measurement application
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `sample_identification`: free-form label of the measured sample
//! - `analysis`: lock-in analysis parameters
//! - `measurement`: electrometer settings
//! - `modulation`: target temperature profile
//! - `thermal_regulation`: PID gains, safety limits and run timing
//! - `simulation`: simulated bench used when no hardware is attached
//!
//! ## Usage
//!
//! ```no_run
//! use rust_pyroelectric::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some(0.02), // Analysis and modulation frequency
//!     Some(41),   // Window
//!     None,       // Electrode area
//!     None,       // Loop time
//!     None,       // Phase method
//! );
//!
//! println!("Window: {}", config.analysis.window);
//! ```

pub mod analysis;
pub mod measurement;
pub mod modulation;
pub mod simulation;
pub mod thermal_regulation;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::spectral::PhaseMethod;

pub use analysis::AnalysisConfig;
pub use measurement::MeasurementConfig;
pub use modulation::ModulationConfig;
pub use simulation::SimulationConfig;
pub use thermal_regulation::{PidParameters, SafetyLimits, ThermalRegulationConfig};
pub use utils::{output_config_schema, validate_specific_rules};

/// Embedded JSON schema of the configuration file
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// One validated `Config` feeds both the thermal controller and the analysis
/// pipeline. Every section falls back to its defaults when absent from the
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Label of the measured sample, used in output file names
    #[serde(default = "default_sample_identification")]
    pub sample_identification: String,

    /// Lock-in analysis parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Electrometer settings
    #[serde(default)]
    pub measurement: MeasurementConfig,

    /// Target temperature profile
    #[serde(default)]
    pub modulation: ModulationConfig,

    /// Controller gains, safety limits and timing
    #[serde(default)]
    pub thermal_regulation: ThermalRegulationConfig,

    /// Simulated bench parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_sample_identification() -> String {
    "sample".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_identification: default_sample_identification(),
            analysis: AnalysisConfig::default(),
            measurement: MeasurementConfig::default(),
            modulation: ModulationConfig::default(),
            thermal_regulation: ThermalRegulationConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file failing schema
    /// validation, deserialization or the specific rules leaves a
    /// `*.sample.yaml` next to it and returns an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the loaded configuration.
    /// A frequency override applies to both the modulation profile and the
    /// analysis so the two stay consistent.
    ///
    /// # Parameters
    ///
    /// * `frequency` - Modulation and analysis frequency in Hz
    /// * `window` - Analysis window length in samples
    /// * `electrode_area` - Electrode area in m²
    /// * `loop_time` - Modulated measurement duration in seconds
    /// * `phase_method` - Phase estimation algorithm
    pub fn apply_args(
        &mut self,
        frequency: Option<f64>,
        window: Option<usize>,
        electrode_area: Option<f64>,
        loop_time: Option<f64>,
        phase_method: Option<PhaseMethod>,
    ) {
        if let Some(freq) = frequency {
            debug!("Overriding frequency from command line: {}", freq);
            self.analysis.frequency = freq;
            self.modulation.frequency = freq;
        }
        if let Some(window) = window {
            debug!("Overriding window from command line: {}", window);
            self.analysis.window = window;
        }
        if let Some(area) = electrode_area {
            debug!("Overriding electrode area from command line: {}", area);
            self.analysis.electrode_area = area;
        }
        if let Some(loop_time) = loop_time {
            debug!("Overriding loop time from command line: {}", loop_time);
            self.thermal_regulation.loop_time = loop_time;
        }
        if let Some(method) = phase_method {
            debug!("Overriding phase method from command line: {:?}", method);
            self.analysis.phase_method = method;
        }
    }
}

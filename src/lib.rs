// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Pyroelectric library
//!
//! This library measures the pyroelectric coefficient of a sample by the
//! Sharp-Garn method: the sample temperature is modulated sinusoidally by a
//! PID-driven peltier stage while the pyroelectric current is captured, then a
//! sliding-window lock-in analysis extracts the phase and amplitudes of the
//! current relative to the temperature.
//!
//! - [`thermal_regulation`]: control state machine, device traits and the
//!   simulated bench
//! - [`acquisition`]: capture records and CSV persistence
//! - [`preprocessing`]: decimation, windowing and normalization
//! - [`spectral`]: sine fitting and phase estimation
//! - [`processing`]: the analysis pipeline and coefficient derivation
//! - [`config`]: YAML configuration with schema validation

pub mod acquisition;
pub mod config;
pub mod error;
pub mod preprocessing;
pub mod processing;
pub mod spectral;
pub mod thermal_regulation;
pub mod utility;

pub use error::{PyroError, Result};

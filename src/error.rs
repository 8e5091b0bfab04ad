// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error taxonomy shared by the analysis pipeline and the thermal controller
//!
//! Only [`PyroError::Configuration`] aborts a run. Acquisition and numeric
//! errors are contained at the smallest enclosing scope (one poll iteration,
//! one analysis window) and safety-limit violations are resolved by clamping.

use thiserror::Error;

/// Errors raised by the measurement core
#[derive(Error, Debug)]
pub enum PyroError {
    /// Invalid static parameters, detected before any computation or device access
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Device communication failure or timeout during a poll
    #[error("Acquisition failed on {device}: {reason}")]
    Acquisition { device: String, reason: String },

    /// Fit non-convergence or degenerate window
    #[error("Numeric failure: {0}")]
    Numeric(String),

    /// A computed actuator command exceeded its limits (resolved by clamping)
    #[error("{quantity} command {requested:.4} outside safety range [{min:.4}, {max:.4}]")]
    SafetyLimit {
        quantity: &'static str,
        requested: f64,
        min: f64,
        max: f64,
    },

    /// Malformed row in a capture file
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PyroError {
    /// Shorthand for an acquisition error on a named device
    pub fn acquisition(device: &str, reason: impl Into<String>) -> Self {
        PyroError::Acquisition {
            device: device.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that must abort a run before any side effect
    pub fn is_fatal(&self) -> bool {
        matches!(self, PyroError::Configuration(_))
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PyroError>;

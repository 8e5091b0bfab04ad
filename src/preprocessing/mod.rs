// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//! Signal preprocessing module
//!
//! This module prepares captured series for lock-in analysis:
//! stride decimation, centered windowing, and per-window normalization.

pub mod decimation;
pub mod normalize;
pub mod windowing;

pub use decimation::decimation_ratio;
pub use normalize::{detrend_linear, normalize_window, standardize};
pub use windowing::{validate_window_length, AnalysisWindow, SignalWindower, Windows};

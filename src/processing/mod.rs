// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Lock-in analysis of a captured series
//!
//! [`AnalysisPipeline`] decimates the capture, slides a centered window over
//! it, fits the temperature and signal amplitudes, estimates their phase and
//! derives the pyroelectric coefficient for every window.

pub mod coefficient;
pub mod export;
pub mod pipeline;

pub use coefficient::{pyroelectric_coefficient, CoefficientCalculator};
pub use export::{write_records_csv, write_report_json};
pub use pipeline::{AnalysisPipeline, AnalysisReport, OutputRecord};

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bench drivers implementing the thermal regulation capability traits
//!
//! Hardware command protocols live outside this crate. The simulated bench
//! emulates the coldplate, the electrometer and the peltier supply around one
//! shared thermal model.

pub mod simulated;

pub use simulated::{create_simulated_bench, BenchProbe, SimulatedBench, SimulatedClock};

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Criterion benchmarks for the lock-in analysis
//!
//! Run with: cargo bench

use std::f64::consts::PI;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_pyroelectric::acquisition::SampleSeries;
use rust_pyroelectric::config::AnalysisConfig;
use rust_pyroelectric::processing::AnalysisPipeline;
use rust_pyroelectric::spectral::{
    CrossCorrelationPhaseEstimator, HilbertPhaseEstimator, PhaseEstimator, SineFitter,
};

const FREQUENCY: f64 = 0.01;

fn modulation_window(size: usize, dt: f64, phase_deg: f64) -> (Vec<f64>, Vec<f64>) {
    let times: Vec<f64> = (0..size).map(|i| i as f64 * dt).collect();
    let values = times
        .iter()
        .map(|t| 100.0 + 0.002 * t + (2.0 * PI * FREQUENCY * t - phase_deg.to_radians()).sin())
        .collect();
    (times, values)
}

fn bench_phase_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("Phase");
    let hilbert = HilbertPhaseEstimator::new();
    let xcorr = CrossCorrelationPhaseEstimator::new(FREQUENCY, 10.0);

    for &size in &[21usize, 51, 101, 201] {
        let (_, reference) = modulation_window(size, 10.0, 0.0);
        let (_, signal) = modulation_window(size, 10.0, -90.0);

        group.bench_with_input(BenchmarkId::new("hilbert", size), &size, |b, _| {
            b.iter(|| hilbert.estimate(black_box(&reference), black_box(&signal)))
        });
        group.bench_with_input(BenchmarkId::new("cross_correlation", size), &size, |b, _| {
            b.iter(|| xcorr.estimate(black_box(&reference), black_box(&signal)))
        });
    }
    group.finish();
}

fn bench_sine_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("SineFit");
    let fitter = SineFitter::new(FREQUENCY);

    for &size in &[21usize, 51, 101] {
        let (times, values) = modulation_window(size, 10.0, 30.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| fitter.fit(black_box(&values), black_box(&times)))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    // 100000 samples at 5 Hz, decimated to 2000
    let mut series = SampleSeries::with_capacity(100_000);
    let omega = 2.0 * PI * FREQUENCY;
    for i in 0..100_000 {
        let t = i as f64 * 0.2;
        series.push(
            t,
            100.0 + 0.002 * t + (omega * t).sin(),
            7.2e-9 * omega * (omega * t).cos(),
        );
    }
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();

    let mut group = c.benchmark_group("Pipeline");
    group.sample_size(10);
    group.bench_function("reference_capture", |b| {
        b.iter(|| pipeline.run(black_box(&series)))
    });
    group.finish();
}

criterion_group!(benches, bench_phase_estimators, bench_sine_fit, bench_pipeline);
criterion_main!(benches);

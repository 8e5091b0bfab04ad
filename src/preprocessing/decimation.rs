// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Stride decimation sized from the modulation frequency

/// Integer stride bringing a capture down to `points_per_period` samples per
/// modulation period.
///
/// `periods = duration * frequency`, `target = periods * points_per_period`,
/// `ratio = floor(original_length / target)`, never below 1. A capture shorter
/// than its target is kept whole.
///
/// # Example
///
/// ```
/// use rust_pyroelectric::preprocessing::decimation_ratio;
///
/// // 100000 samples over 20000 s at 0.01 Hz, 10 points per period
/// assert_eq!(decimation_ratio(100_000, 20_000.0, 0.01, 10), 50);
/// ```
pub fn decimation_ratio(
    original_length: usize,
    duration: f64,
    frequency: f64,
    points_per_period: usize,
) -> usize {
    let periods = duration * frequency;
    let target = periods * points_per_period as f64;
    if !target.is_finite() || target < 1.0 {
        return 1;
    }
    ((original_length as f64 / target).floor() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_decimation_example() {
        let ratio = decimation_ratio(100_000, 20_000.0, 0.01, 10);
        assert_eq!(ratio, 50);
        assert_eq!((0..100_000).step_by(ratio).count(), 2000);
    }

    #[test]
    fn test_sparse_capture_is_not_decimated() {
        assert_eq!(decimation_ratio(500, 20_000.0, 0.01, 10), 1);
    }

    #[test]
    fn test_degenerate_duration_keeps_everything() {
        assert_eq!(decimation_ratio(1000, 0.0, 0.01, 10), 1);
        assert_eq!(decimation_ratio(1000, f64::NAN, 0.01, 10), 1);
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Centered sliding windows over two aligned series
//!
//! A window of odd length `W` centered on index `i` covers
//! `[i - margin, i + margin]` with `margin = (W - 1) / 2`. Only centers with a
//! full margin on both sides are produced; boundary windows are excluded,
//! never padded. For a series of length `N >= W` this yields `N - (W - 1)`
//! windows.

use crate::error::{PyroError, Result};

/// One centered window over the reference, signal and time series
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindow<'a> {
    /// Index of the window center in the full series
    pub index: usize,
    pub reference: &'a [f64],
    pub signal: &'a [f64],
    pub times: &'a [f64],
}

/// Validated view producing centered windows on demand
///
/// The windower borrows the series and performs no copies; [`SignalWindower::iter`]
/// can be called any number of times, each call restarting from the first
/// valid center.
#[derive(Debug, Clone, Copy)]
pub struct SignalWindower<'a> {
    reference: &'a [f64],
    signal: &'a [f64],
    times: &'a [f64],
    window: usize,
}

impl<'a> SignalWindower<'a> {
    /// Create a windower over aligned series
    ///
    /// # Errors
    ///
    /// [`PyroError::Configuration`] if `window` is even or zero, larger than
    /// the series, or if the three series differ in length.
    pub fn new(
        reference: &'a [f64],
        signal: &'a [f64],
        times: &'a [f64],
        window: usize,
    ) -> Result<Self> {
        validate_window_length(window)?;
        if reference.len() != signal.len() || reference.len() != times.len() {
            return Err(PyroError::Configuration(format!(
                "series length mismatch: reference={}, signal={}, times={}",
                reference.len(),
                signal.len(),
                times.len()
            )));
        }
        if window > reference.len() {
            return Err(PyroError::Configuration(format!(
                "window length {} exceeds series length {}",
                window,
                reference.len()
            )));
        }
        Ok(Self {
            reference,
            signal,
            times,
            window,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn margin(&self) -> usize {
        (self.window - 1) / 2
    }

    /// Number of windows the iterator yields
    pub fn window_count(&self) -> usize {
        self.reference.len() + 1 - self.window
    }

    /// Iterate over all valid window centers in index order
    pub fn iter(&self) -> Windows<'a> {
        let margin = self.margin();
        Windows {
            windower: *self,
            next_center: margin,
            end: self.reference.len() - margin,
        }
    }
}

impl<'a> IntoIterator for &SignalWindower<'a> {
    type Item = AnalysisWindow<'a>;
    type IntoIter = Windows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the windows of a [`SignalWindower`]
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    windower: SignalWindower<'a>,
    next_center: usize,
    end: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = AnalysisWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_center >= self.end {
            return None;
        }
        let index = self.next_center;
        self.next_center += 1;

        let margin = self.windower.margin();
        let range = (index - margin)..(index + margin + 1);
        Some(AnalysisWindow {
            index,
            reference: &self.windower.reference[range.clone()],
            signal: &self.windower.signal[range.clone()],
            times: &self.windower.times[range],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next_center);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Reject even (or zero) window lengths
pub fn validate_window_length(window: usize) -> Result<()> {
    if window == 0 || window % 2 == 0 {
        return Err(PyroError::Configuration(format!(
            "window length must be odd and positive, got {}",
            window
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_window_count_and_centers() {
        let data = ramp(20);
        let windower = SignalWindower::new(&data, &data, &data, 5).unwrap();
        let windows: Vec<_> = windower.iter().collect();

        assert_eq!(windows.len(), 16);
        assert_eq!(windower.window_count(), 16);
        assert_eq!(windows.first().unwrap().index, 2);
        assert_eq!(windows.last().unwrap().index, 17);
        for w in &windows {
            assert_eq!(w.reference.len(), 5);
            // Centered: the middle sample is the window index
            assert_eq!(w.times[2], w.index as f64);
        }
    }

    #[test]
    fn test_iteration_is_restartable() {
        let data = ramp(11);
        let windower = SignalWindower::new(&data, &data, &data, 3).unwrap();
        let first: Vec<usize> = windower.iter().map(|w| w.index).collect();
        let second: Vec<usize> = (&windower).into_iter().map(|w| w.index).collect();
        assert_eq!(first, second);
        assert_eq!(windower.iter().len(), 9);
    }

    #[test]
    fn test_window_equal_to_series_yields_single_window() {
        let data = ramp(7);
        let windower = SignalWindower::new(&data, &data, &data, 7).unwrap();
        let windows: Vec<_> = windower.iter().collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].index, 3);
    }

    #[test]
    fn test_invalid_windows_are_rejected() {
        let data = ramp(10);
        assert!(matches!(
            SignalWindower::new(&data, &data, &data, 4),
            Err(PyroError::Configuration(_))
        ));
        assert!(matches!(
            SignalWindower::new(&data, &data, &data, 11),
            Err(PyroError::Configuration(_))
        ));
        let short = ramp(9);
        assert!(matches!(
            SignalWindower::new(&data, &short, &data, 3),
            Err(PyroError::Configuration(_))
        ));
    }
}

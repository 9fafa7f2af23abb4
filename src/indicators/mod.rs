//! Trend indicators over close (and volume) columns.
//!
//! Every function returns one entry per input bar. Entries are `None` while
//! the lookback window fills and `Some` from the first bar where the value
//! is defined; no NaN is ever used as a placeholder. A column shorter than
//! an indicator's lookback fails with [`Error::InsufficientHistory`].
//!
//! [`Error::InsufficientHistory`]: crate::Error::InsufficientHistory

pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod wma;

pub use macd::{convergence_indicator, Convergence};
pub use obv::volume_accumulation;
pub use rsi::momentum_oscillator;
pub use sma::moving_average;
pub use wma::weighted_moving_average;

use crate::{Error, Result};

/// Per-bar indicator values; `None` where the lookback has not filled yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSeries(Vec<Option<f64>>);

impl IndicatorSeries {
    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    /// `len` undefined entries
    pub(crate) fn undefined(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub(crate) fn set(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = Some(value);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    /// Value on the final bar, if defined
    pub fn last(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }

    /// Most recent defined value
    pub fn latest_defined(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }

    pub fn first_defined_index(&self) -> Option<usize> {
        self.0.iter().position(Option::is_some)
    }
}

/// Reject columns shorter than `need`
#[inline]
pub(crate) fn require_len(got: usize, need: usize) -> Result<()> {
    if got < need {
        return Err(Error::InsufficientHistory { need, got });
    }
    Ok(())
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_defined_skips_trailing_none() {
        let s = IndicatorSeries::from_values(vec![None, Some(1.0), Some(2.0), None]);
        assert_eq!(s.last(), None);
        assert_eq!(s.latest_defined(), Some(2.0));
        assert_eq!(s.first_defined_index(), Some(1));
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(9), None);
    }

    #[test]
    fn test_require_len() {
        assert!(require_len(14, 14).is_ok());
        assert_eq!(
            require_len(3, 14),
            Err(Error::InsufficientHistory { need: 14, got: 3 })
        );
    }
}

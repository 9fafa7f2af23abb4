//! Threshold classification of indicator readings into trend labels.
//!
//! Only the most recent defined value of each indicator is looked at; there
//! is no smoothing and no hysteresis.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{Convergence, IndicatorSeries};
use crate::{Error, Result};

/// Categorical trend reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendLabel {
    Up,
    Down,
    Sideways,
}

impl TrendLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendLabel::Up => "UP",
            TrendLabel::Down => "DOWN",
            TrendLabel::Sideways => "SIDEWAYS",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `value > overbought` is UP, `value < oversold` is DOWN, anything else SIDEWAYS
#[inline]
pub fn classify_momentum(value: f64, overbought: f64, oversold: f64) -> TrendLabel {
    if value > overbought {
        TrendLabel::Up
    } else if value < oversold {
        TrendLabel::Down
    } else {
        TrendLabel::Sideways
    }
}

/// Fast line above signal is UP, below is DOWN, equal is SIDEWAYS
#[inline]
pub fn classify_convergence(fast: f64, signal: f64) -> TrendLabel {
    if fast > signal {
        TrendLabel::Up
    } else if fast < signal {
        TrendLabel::Down
    } else {
        TrendLabel::Sideways
    }
}

/// Momentum thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendClassifier {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl TrendClassifier {
    pub fn new(overbought: f64, oversold: f64) -> Result<Self> {
        if !(overbought.is_finite() && oversold.is_finite()) || oversold >= overbought {
            return Err(Error::InvalidConfig(format!(
                "momentum thresholds must satisfy oversold < overbought (got {oversold} / {overbought})"
            )));
        }
        Ok(Self {
            overbought,
            oversold,
        })
    }

    /// Classify the latest defined momentum value
    pub fn momentum(&self, series: &IndicatorSeries) -> Result<TrendLabel> {
        let value = latest(series)?;
        Ok(classify_momentum(value, self.overbought, self.oversold))
    }

    /// Classify the latest defined fast/signal pair
    pub fn convergence(&self, lines: &Convergence) -> Result<TrendLabel> {
        let fast = latest(&lines.fast)?;
        let signal = latest(&lines.signal)?;
        Ok(classify_convergence(fast, signal))
    }
}

fn latest(series: &IndicatorSeries) -> Result<f64> {
    let value = series.latest_defined().ok_or(Error::InsufficientHistory {
        need: 1,
        got: 0,
    })?;
    if !value.is_finite() {
        return Err(Error::MalformedSeries {
            index: series.len().saturating_sub(1),
            reason: "non-finite indicator value",
        });
    }
    Ok(value)
}

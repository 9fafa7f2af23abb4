//! MACD (Moving Average Convergence/Divergence), the convergence indicator.
//!
//! Fast line = EMA(fast) - EMA(slow); signal line = EMA(fast line, signal).
//! Each EMA is seeded with the SMA of its first `period` inputs.
//! Fast line defined from index `slow - 1`, signal line from `slow + signal - 2`.

use super::{require_len, IndicatorSeries};
use crate::{Error, Period, Result};

/// Fast and signal lines, aligned with the input closes
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    pub fast: IndicatorSeries,
    pub signal: IndicatorSeries,
}

impl Convergence {
    /// Fast minus signal, where both are defined
    pub fn histogram(&self) -> IndicatorSeries {
        let values = self
            .fast
            .values()
            .iter()
            .zip(self.signal.values())
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        IndicatorSeries::from_values(values)
    }
}

pub fn convergence_indicator(
    closes: &[f64],
    fast: Period,
    slow: Period,
    signal: Period,
) -> Result<Convergence> {
    let (fast, slow, signal) = (fast.get(), slow.get(), signal.get());
    if fast >= slow {
        return Err(Error::InvalidValue("MACD fast period must be less than slow period"));
    }
    require_len(closes.len(), slow + signal - 1)?;

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let mut fast_line = IndicatorSeries::undefined(closes.len());
    let mut line_values = Vec::with_capacity(closes.len() - (slow - 1));
    for i in (slow - 1)..closes.len() {
        if let (Some(f), Some(s)) = (ema_fast[i], ema_slow[i]) {
            fast_line.set(i, f - s);
            line_values.push(f - s);
        }
    }

    let mut signal_line = IndicatorSeries::undefined(closes.len());
    for (k, value) in ema(&line_values, signal).into_iter().enumerate() {
        if let Some(v) = value {
            signal_line.set(slow - 1 + k, v);
        }
    }

    Ok(Convergence {
        fast: fast_line,
        signal: signal_line,
    })
}

/// EMA over a contiguous column; `None` before index `period - 1`.
fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);

    for (i, &v) in values.iter().enumerate().skip(period) {
        prev += k * (v - prev);
        out[i] = Some(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn standard(closes: &[f64]) -> Result<Convergence> {
        convergence_indicator(
            closes,
            Period::new_const(12),
            Period::new_const(26),
            Period::new_const(9),
        )
    }

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_definedness_offsets() {
        let result = standard(&trending_up(60)).unwrap();
        assert_eq!(result.fast.first_defined_index(), Some(25));
        assert_eq!(result.signal.first_defined_index(), Some(33));
        assert_eq!(result.fast.len(), 60);
    }

    #[test]
    fn macd_minimum_length() {
        assert!(standard(&trending_up(34)).is_ok());
        let err = standard(&trending_up(33)).unwrap_err();
        assert_eq!(err, Error::InsufficientHistory { need: 34, got: 33 });
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let result = standard(&[100.0; 50]).unwrap();
        assert_eq!(result.fast.last(), Some(0.0));
        assert_eq!(result.signal.last(), Some(0.0));
    }

    #[test]
    fn macd_fast_above_zero_in_uptrend() {
        let result = standard(&trending_up(80)).unwrap();
        assert!(result.fast.last().unwrap() > 0.0);
    }

    #[test]
    fn macd_rejects_inverted_periods() {
        let err = convergence_indicator(
            &trending_up(80),
            Period::new_const(26),
            Period::new_const(12),
            Period::new_const(9),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn ema_seeded_by_sma() {
        let out = ema(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[1], None);
        assert_approx(out[2].unwrap(), 2.0, DEFAULT_EPSILON);
        // 2 + 0.5 * (4 - 2)
        assert_approx(out[3].unwrap(), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn histogram_defined_with_signal() {
        let result = standard(&trending_up(60)).unwrap();
        assert_eq!(result.histogram().first_defined_index(), Some(33));
    }
}

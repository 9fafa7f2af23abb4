//! Simple Moving Average (SMA).
//!
//! Rolling mean of closes over a lookback window.
//! First defined value at index `period - 1`.

use super::{require_len, IndicatorSeries};
use crate::{Period, Result};

pub fn moving_average(closes: &[f64], period: Period) -> Result<IndicatorSeries> {
    let p = period.get();
    require_len(closes.len(), p)?;

    let mut out = IndicatorSeries::undefined(closes.len());
    let mut sum: f64 = closes[..p].iter().sum();
    out.set(p - 1, sum / p as f64);

    // Roll the window forward
    for i in p..closes.len() {
        sum += closes[i] - closes[i - p];
        out.set(i, sum / p as f64);
    }

    Ok(out)
}

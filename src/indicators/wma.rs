//! Weighted Moving Average (WMA).
//!
//! Linear weights 1..=period, the most recent bar weighted highest.
//! First defined value at index `period - 1`.

use super::{require_len, IndicatorSeries};
use crate::{Period, Result};

pub fn weighted_moving_average(closes: &[f64], period: Period) -> Result<IndicatorSeries> {
    let p = period.get();
    require_len(closes.len(), p)?;

    let denom = (p * (p + 1)) as f64 / 2.0;
    let mut out = IndicatorSeries::undefined(closes.len());

    for end in (p - 1)..closes.len() {
        let window = &closes[end + 1 - p..=end];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(k, close)| (k + 1) as f64 * close)
            .sum();
        out.set(end, weighted / denom);
    }

    Ok(out)
}

//! Per-bar candle averages used as detector thresholds.
//!
//! TA-Lib compares a candle's body and shadows against trailing averages of
//! the bars before it (`TA_CANDLEAVGPERIOD = 10`; the Near/Far/Equal settings
//! use 5). The averages here follow the same convention: at bar `i` they are
//! taken over `[i - period, i)` and exclude bar `i` itself.

use crate::series::{CandleExt, Candles};

/// Trailing period for body, range and shadow averages
pub const CANDLE_AVG_PERIOD: usize = 10;
/// Trailing period for the Near/Far/Equal range average
pub const NEAR_AVG_PERIOD: usize = 5;

/// Candle averages at one bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandleContext {
    pub avg_body: f64,
    pub avg_range: f64,
    /// mean(upper + lower) / 2 over the trailing window
    pub avg_shadow: f64,
    pub avg_range_5: f64,
}

/// Precompute the context for every bar.
pub fn compute_contexts(candles: &Candles) -> Vec<CandleContext> {
    let len = candles.len();
    let mut contexts = Vec::with_capacity(len);

    for i in 0..len {
        let Some(current) = candles.at(i) else {
            break;
        };

        let ctx = if i == 0 {
            // No trailing bars yet; fall back to the bar itself
            CandleContext {
                avg_body: current.body(),
                avg_range: current.range(),
                avg_shadow: (current.upper_shadow() + current.lower_shadow()) / 2.0,
                avg_range_5: current.range(),
            }
        } else {
            let start = i.saturating_sub(CANDLE_AVG_PERIOD);
            let count = (i - start) as f64;
            let (sum_body, sum_range, sum_shadow) = (start..i)
                .filter_map(|j| candles.at(j))
                .fold((0.0, 0.0, 0.0), |(b, r, s), c| {
                    (b + c.body(), r + c.range(), s + c.upper_shadow() + c.lower_shadow())
                });

            CandleContext {
                avg_body: sum_body / count,
                avg_range: sum_range / count,
                avg_shadow: sum_shadow / count / 2.0,
                avg_range_5: trailing_mean(candles, i, NEAR_AVG_PERIOD, |c| c.range()),
            }
        };

        contexts.push(ctx);
    }

    contexts
}

/// Mean of `f` over the `period` bars before `at`; bar 0 averages itself.
pub(crate) fn trailing_mean<F>(candles: &Candles, at: usize, period: usize, f: F) -> f64
where
    F: Fn(&crate::series::Candle) -> f64,
{
    if at == 0 {
        return candles.at(0).map(|c| f(&c)).unwrap_or(0.0);
    }
    let start = at.saturating_sub(period);
    let sum: f64 = (start..at).filter_map(|j| candles.at(j)).map(|c| f(&c)).sum();
    sum / (at - start) as f64
}

//! Relative Strength Index (RSI), the momentum oscillator.
//!
//! Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! First defined value at index `period`.
//! Edge cases: no movement at all -> 50; avg_loss == 0 -> 100; avg_gain == 0 -> 0.

use super::{require_len, IndicatorSeries};
use crate::{Period, Result};

pub fn momentum_oscillator(closes: &[f64], period: Period) -> Result<IndicatorSeries> {
    let p = period.get();
    require_len(closes.len(), p + 1)?;

    let mut out = IndicatorSeries::undefined(closes.len());

    // Seed: plain average over the first `period` changes
    let (mut avg_gain, mut avg_loss) = closes[..=p]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), ch| {
            if ch > 0.0 {
                (g + ch, l)
            } else {
                (g, l - ch)
            }
        });
    avg_gain /= p as f64;
    avg_loss /= p as f64;
    out.set(p, rsi_value(avg_gain, avg_loss));

    let pf = p as f64;
    for i in (p + 1)..closes.len() {
        let ch = closes[i] - closes[i - 1];
        let (gain, loss) = if ch > 0.0 { (ch, 0.0) } else { (0.0, -ch) };
        avg_gain = (avg_gain * (pf - 1.0) + gain) / pf;
        avg_loss = (avg_loss * (pf - 1.0) + loss) / pf;
        out.set(i, rsi_value(avg_gain, avg_loss));
    }

    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

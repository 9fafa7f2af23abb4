//! Threshold predicates shared by the detector modules.
//!
//! Factors follow TA-Lib's candle settings (ta_global.c). Every predicate
//! falls back to a ratio of the bar's own range when the trailing average is
//! zero, which only happens at the very start of a series.

use crate::context::trailing_mean;
use crate::series::{CandleExt, Candles};

// ============================================================
// TA-Lib FACTORS
// ============================================================

/// BodyDoji: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// BodyShort: body < avg_body * BODY_SHORT_FACTOR
pub const BODY_SHORT_FACTOR: f64 = 1.0;
/// BodyLong: body > avg_body * BODY_LONG_FACTOR
pub const BODY_LONG_FACTOR: f64 = 1.0;
/// ShadowVeryLong: shadow > body * SHADOW_VERYLONG_FACTOR
pub const SHADOW_VERYLONG_FACTOR: f64 = 2.0;
/// ShadowVeryShort: shadow < avg_range * SHADOW_VERYSHORT_FACTOR
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
pub const NEAR_FACTOR: f64 = 0.2;
pub const FAR_FACTOR: f64 = 0.6;
pub const EQUAL_FACTOR: f64 = 0.05;

// Ratio fallbacks
pub const DOJI_RATIO: f64 = 0.1;
pub const BODY_SHORT_RATIO: f64 = 0.3;
pub const BODY_LONG_RATIO: f64 = 0.7;
pub const SHADOW_SHORT_RATIO: f64 = 0.1;

// ============================================================
// PREDICATES
// ============================================================

#[inline]
pub fn is_doji(body: f64, avg_range: f64, range: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * DOJI_FACTOR
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

#[inline]
pub fn is_body_short(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body * BODY_SHORT_FACTOR
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

#[inline]
pub fn is_body_long(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body * BODY_LONG_FACTOR
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// ShadowLong compares against the bar's own body (TA-Lib Period=0)
#[inline]
pub fn is_shadow_long(shadow: f64, body: f64) -> bool {
    shadow > body
}

#[inline]
pub fn is_shadow_verylong(shadow: f64, body: f64) -> bool {
    shadow > body * SHADOW_VERYLONG_FACTOR
}

#[inline]
pub fn is_shadow_short(shadow: f64, avg_shadow: f64, range: f64) -> bool {
    if avg_shadow > 0.0 {
        shadow < avg_shadow
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

#[inline]
pub fn is_shadow_very_short(shadow: f64, avg_range: f64, range: f64) -> bool {
    if avg_range > 0.0 {
        shadow < avg_range * SHADOW_VERYSHORT_FACTOR
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

/// Inverse of [`is_shadow_very_short`]: the shadow is meaningfully long.
#[inline]
pub fn exceeds_very_short(shadow: f64, avg_range: f64, range: f64) -> bool {
    let threshold = avg_range * SHADOW_VERYSHORT_FACTOR;
    if threshold > 0.0 {
        shadow > threshold
    } else {
        range > 0.0 && shadow / range > SHADOW_SHORT_RATIO
    }
}

// ============================================================
// PER-CANDLE TRAILING AVERAGES
// ============================================================

/// Multi-bar patterns judge each of their candles against that candle's
/// own trailing window, not the window of the last bar.
#[inline]
pub fn trailing_avg_body(candles: &Candles, at: usize) -> f64 {
    trailing_mean(candles, at, crate::context::CANDLE_AVG_PERIOD, |c| c.body())
}

#[inline]
pub fn trailing_avg_range(candles: &Candles, at: usize) -> f64 {
    trailing_mean(candles, at, crate::context::CANDLE_AVG_PERIOD, |c| c.range())
}

/// ShadowShort unit at `at`: mean of (upper + lower) / 2
#[inline]
pub fn trailing_avg_shadow(candles: &Candles, at: usize) -> f64 {
    trailing_mean(candles, at, crate::context::CANDLE_AVG_PERIOD, |c| {
        (c.upper_shadow() + c.lower_shadow()) / 2.0
    })
}

/// Near/Far/Equal distance unit at `at`
#[inline]
pub fn trailing_avg_range_5(candles: &Candles, at: usize) -> f64 {
    trailing_mean(candles, at, crate::context::NEAR_AVG_PERIOD, |c| c.range())
}

/// Long body judged at `at`
#[inline]
pub fn body_long_at(candles: &Candles, at: usize) -> bool {
    candles
        .at(at)
        .is_some_and(|c| is_body_long(c.body(), trailing_avg_body(candles, at), c.range()))
}

/// Short body judged at `at`
#[inline]
pub fn body_short_at(candles: &Candles, at: usize) -> bool {
    candles
        .at(at)
        .is_some_and(|c| is_body_short(c.body(), trailing_avg_body(candles, at), c.range()))
}

/// Doji judged at `at`
#[inline]
pub fn doji_at(candles: &Candles, at: usize) -> bool {
    candles
        .at(at)
        .is_some_and(|c| is_doji(c.body(), trailing_avg_range(candles, at), c.range()))
}

/// Real body of `curr` sits entirely above the real body of `prev`
#[inline]
pub fn body_gap_up<A: CandleExt, B: CandleExt>(prev: &A, curr: &B) -> bool {
    curr.body_bottom() > prev.body_top()
}

/// Real body of `curr` sits entirely below the real body of `prev`
#[inline]
pub fn body_gap_down<A: CandleExt, B: CandleExt>(prev: &A, curr: &B) -> bool {
    curr.body_top() < prev.body_bottom()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    #[test]
    fn test_doji_zero_body_always_doji() {
        assert!(is_doji(0.0, 5.0, 10.0));
        assert!(is_doji(0.4, 5.0, 10.0));
        assert!(!is_doji(0.6, 5.0, 10.0));
        // Fallback on own range
        assert!(is_doji(0.5, 0.0, 10.0));
        assert!(!is_doji(2.0, 0.0, 10.0));
    }

    #[test]
    fn test_body_long_short_fallbacks() {
        assert!(is_body_long(3.0, 2.0, 4.0));
        assert!(!is_body_long(1.0, 2.0, 4.0));
        assert!(is_body_long(8.0, 0.0, 10.0));
        assert!(is_body_short(1.0, 2.0, 4.0));
        assert!(is_body_short(2.0, 0.0, 10.0));
    }

    #[test]
    fn test_shadow_verylong_is_twice_body() {
        assert!(is_shadow_verylong(2.1, 1.0));
        assert!(!is_shadow_verylong(2.0, 1.0));
        assert!(is_shadow_long(1.5, 1.0));
    }

    #[test]
    fn test_trailing_avg_shadow_excludes_bar() {
        let mut bars = vec![Candle::new(10.0, 11.0, 9.0, 10.5); 10];
        bars.push(Candle::new(10.0, 30.0, 0.0, 10.0));
        let candles: Candles = bars.into_iter().collect();
        // upper 0.5, lower 1.0 on every earlier bar
        assert!((trailing_avg_shadow(&candles, 10) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_body_gaps() {
        let prev = Candle::new(10.0, 11.0, 9.0, 10.5);
        let up = Candle::new(11.0, 12.0, 10.8, 11.5);
        let down = Candle::new(9.5, 9.9, 9.0, 9.2);
        assert!(body_gap_up(&prev, &up));
        assert!(!body_gap_down(&prev, &up));
        assert!(body_gap_down(&prev, &down));
    }
}

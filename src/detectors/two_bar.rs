//! Two-bar candlestick pattern detectors (TA-Lib compatible)
//!
//! TA-Lib patterns: CDLENGULFING, CDLHARAMI, CDLHARAMICROSS, CDLPIERCING,
//! CDLDARKCLOUDCOVER, CDLDOJISTAR, CDLKICKING, CDLMATCHINGLOW, CDLHOMINGPIGEON,
//! CDLCOUNTERATTACK, CDLINNECK, CDLONNECK, CDLTHRUSTING, CDLSEPARATINGLINES,
//! CDLKICKINGBYLENGTH
//!
//! The first candle of each pair is judged against its own trailing window;
//! the second against the context at `index`.

use super::helpers::{
    self, body_gap_down, body_gap_up, body_long_at, is_body_long, is_body_short, is_doji,
    is_shadow_very_short,
};
use super::{BEARISH, BULLISH, WEAK};
use crate::context::CandleContext;
use crate::registry::PatternDetector;
use crate::series::{Candle, CandleExt, Candles};

impl_with_defaults!(
    EngulfingDetector,
    HaramiDetector,
    HaramiCrossDetector,
    PiercingDetector,
    DarkCloudCoverDetector,
    DojiStarDetector,
    KickingDetector,
    KickingByLengthDetector,
    MatchingLowDetector,
    HomingPigeonDetector,
    CounterattackDetector,
    InNeckDetector,
    OnNeckDetector,
    ThrustingDetector,
    SeparatingLinesDetector,
);

/// `(prev, curr)` for a detector evaluated at `index`
#[inline]
fn pair(candles: &Candles, index: usize) -> Option<(Candle, Candle)> {
    Some((candles.at(index.checked_sub(1)?)?, candles.at(index)?))
}

/// Equal distance unit of the first candle
#[inline]
fn equal_at(candles: &Candles, at: usize) -> f64 {
    helpers::trailing_avg_range_5(candles, at) * helpers::EQUAL_FACTOR
}

// ============================================================
// ENGULFING / HARAMI
// ============================================================

/// CDLENGULFING - Engulfing Pattern (bullish and bearish)
#[derive(Debug, Clone, Copy, Default)]
pub struct EngulfingDetector;

impl PatternDetector for EngulfingDetector {
    fn name(&self) -> &'static str {
        "CDLENGULFING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        // At most one end of the bodies may coincide
        let engulfs = if curr.is_white() && prev.is_black() {
            (curr.close >= prev.open && curr.open < prev.close)
                || (curr.close > prev.open && curr.open <= prev.close)
        } else if curr.is_black() && prev.is_white() {
            (curr.close <= prev.open && curr.open > prev.close)
                || (curr.close < prev.open && curr.open >= prev.close)
        } else {
            false
        };
        if !engulfs {
            return None;
        }

        let strict = curr.open != prev.close && curr.close != prev.open;
        let code = if strict { BULLISH } else { WEAK };
        Some(curr.color() * code)
    }
}

/// Harami containment of `curr`'s body inside `prev`'s: 100 strict, 80 touching
fn harami_code(prev: &Candle, curr: &Candle) -> Option<i32> {
    let strict = curr.body_top() < prev.body_top() && curr.body_bottom() > prev.body_bottom();
    let loose = curr.body_top() <= prev.body_top() && curr.body_bottom() >= prev.body_bottom();
    if strict {
        Some(-prev.color() * BULLISH)
    } else if loose {
        Some(-prev.color() * WEAK)
    } else {
        None
    }
}

/// CDLHARAMI - Harami: small body inside a long prior body
#[derive(Debug, Clone, Copy, Default)]
pub struct HaramiDetector;

impl PatternDetector for HaramiDetector {
    fn name(&self) -> &'static str {
        "CDLHARAMI"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;
        if !body_long_at(candles, index - 1) {
            return None;
        }
        if !is_body_short(curr.body(), ctx.avg_body, curr.range()) {
            return None;
        }
        harami_code(&prev, &curr)
    }
}

/// CDLHARAMICROSS - Harami Cross: doji inside a long prior body
#[derive(Debug, Clone, Copy, Default)]
pub struct HaramiCrossDetector;

impl PatternDetector for HaramiCrossDetector {
    fn name(&self) -> &'static str {
        "CDLHARAMICROSS"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;
        if !body_long_at(candles, index - 1) {
            return None;
        }
        if !is_doji(curr.body(), ctx.avg_range, curr.range()) {
            return None;
        }
        harami_code(&prev, &curr)
    }
}

// ============================================================
// PENETRATION PATTERNS
// ============================================================

/// CDLPIERCING - Piercing: white opens below the prior low, closes past mid-body
#[derive(Debug, Clone, Copy, Default)]
pub struct PiercingDetector;

impl PatternDetector for PiercingDetector {
    fn name(&self) -> &'static str {
        "CDLPIERCING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if !prev.is_black() || !body_long_at(candles, index - 1) {
            return None;
        }
        if !curr.is_white() || !is_body_long(curr.body(), ctx.avg_body, curr.range()) {
            return None;
        }
        let matched = curr.open < prev.low
            && curr.close < prev.open
            && curr.close > prev.close + prev.body() * 0.5;
        matched.then_some(BULLISH)
    }
}

/// CDLDARKCLOUDCOVER - Dark Cloud Cover
#[derive(Debug, Clone, Copy)]
pub struct DarkCloudCoverDetector {
    pub penetration: f64,
}

impl Default for DarkCloudCoverDetector {
    fn default() -> Self {
        Self { penetration: 0.5 }
    }
}

impl PatternDetector for DarkCloudCoverDetector {
    fn name(&self) -> &'static str {
        "CDLDARKCLOUDCOVER"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if !prev.is_white() || !body_long_at(candles, index - 1) || !curr.is_black() {
            return None;
        }
        let matched = curr.open > prev.high
            && curr.close > prev.open
            && curr.close < prev.close - prev.body() * self.penetration;
        matched.then_some(BEARISH)
    }
}

// ============================================================
// STARS / GAPS
// ============================================================

/// CDLDOJISTAR - Doji Star: doji gapping away from a long body
#[derive(Debug, Clone, Copy, Default)]
pub struct DojiStarDetector;

impl PatternDetector for DojiStarDetector {
    fn name(&self) -> &'static str {
        "CDLDOJISTAR"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if !body_long_at(candles, index - 1) {
            return None;
        }
        if !is_doji(curr.body(), ctx.avg_range, curr.range()) {
            return None;
        }
        if prev.is_white() && body_gap_up(&prev, &curr) {
            Some(BEARISH)
        } else if prev.is_black() && body_gap_down(&prev, &curr) {
            Some(BULLISH)
        } else {
            None
        }
    }
}

fn is_marubozu_at(candles: &Candles, at: usize) -> bool {
    let Some(c) = candles.at(at) else {
        return false;
    };
    let avg_range = helpers::trailing_avg_range(candles, at);
    let range = c.range();
    body_long_at(candles, at)
        && is_shadow_very_short(c.upper_shadow(), avg_range, range)
        && is_shadow_very_short(c.lower_shadow(), avg_range, range)
}

/// CDLKICKING - Kicking: two opposite marubozu separated by a gap
#[derive(Debug, Clone, Copy, Default)]
pub struct KickingDetector;

impl PatternDetector for KickingDetector {
    fn name(&self) -> &'static str {
        "CDLKICKING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if prev.color() == curr.color() {
            return None;
        }
        if !is_marubozu_at(candles, index - 1) || !is_marubozu_at(candles, index) {
            return None;
        }
        if prev.is_black() && curr.low > prev.high {
            Some(BULLISH)
        } else if prev.is_white() && curr.high < prev.low {
            Some(BEARISH)
        } else {
            None
        }
    }
}

/// CDLKICKINGBYLENGTH - Kicking, direction taken from the longer marubozu
#[derive(Debug, Clone, Copy, Default)]
pub struct KickingByLengthDetector;

impl PatternDetector for KickingByLengthDetector {
    fn name(&self) -> &'static str {
        "CDLKICKINGBYLENGTH"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if prev.color() == curr.color() {
            return None;
        }
        if !is_marubozu_at(candles, index - 1) || !is_marubozu_at(candles, index) {
            return None;
        }
        let gapped = if prev.is_black() {
            curr.low > prev.high
        } else {
            curr.high < prev.low
        };
        if !gapped {
            return None;
        }
        let longer = if curr.body() > prev.body() { curr } else { prev };
        Some(longer.color() * BULLISH)
    }
}

// ============================================================
// MATCHING CLOSES
// ============================================================

/// CDLMATCHINGLOW - Matching Low: two black candles closing at the same level
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingLowDetector;

impl PatternDetector for MatchingLowDetector {
    fn name(&self) -> &'static str {
        "CDLMATCHINGLOW"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;
        if !prev.is_black() || !curr.is_black() {
            return None;
        }
        let equal = equal_at(candles, index - 1);
        ((curr.close - prev.close).abs() <= equal).then_some(BULLISH)
    }
}

/// CDLHOMINGPIGEON - Homing Pigeon: black harami inside a long black body
#[derive(Debug, Clone, Copy, Default)]
pub struct HomingPigeonDetector;

impl PatternDetector for HomingPigeonDetector {
    fn name(&self) -> &'static str {
        "CDLHOMINGPIGEON"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if !prev.is_black() || !curr.is_black() || !body_long_at(candles, index - 1) {
            return None;
        }
        if !is_body_short(curr.body(), ctx.avg_body, curr.range()) {
            return None;
        }
        (curr.open < prev.open && curr.close > prev.close).then_some(BULLISH)
    }
}

/// CDLCOUNTERATTACK - Counterattack: opposite long bodies closing level
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterattackDetector;

impl PatternDetector for CounterattackDetector {
    fn name(&self) -> &'static str {
        "CDLCOUNTERATTACK"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;

        if prev.color() == curr.color() {
            return None;
        }
        if !body_long_at(candles, index - 1) || !is_body_long(curr.body(), ctx.avg_body, curr.range()) {
            return None;
        }
        let equal = equal_at(candles, index - 1);
        ((curr.close - prev.close).abs() <= equal).then(|| curr.color() * BULLISH)
    }
}

// ============================================================
// NECK LINES
// ============================================================

/// Long black candle followed by a white one opening under its low.
/// Shared opening of the in-neck, on-neck and thrusting lines.
fn neck_setup(candles: &Candles, index: usize) -> Option<(Candle, Candle)> {
    let (prev, curr) = pair(candles, index)?;
    let matched = prev.is_black()
        && curr.is_white()
        && body_long_at(candles, index - 1)
        && curr.open < prev.low;
    matched.then_some((prev, curr))
}

/// CDLINNECK - In-Neck: white closes just into the prior black body
#[derive(Debug, Clone, Copy, Default)]
pub struct InNeckDetector;

impl PatternDetector for InNeckDetector {
    fn name(&self) -> &'static str {
        "CDLINNECK"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = neck_setup(candles, index)?;
        let equal = equal_at(candles, index - 1);
        (curr.close >= prev.close && curr.close <= prev.close + equal).then_some(BEARISH)
    }
}

/// CDLONNECK - On-Neck: white closes at the prior low
#[derive(Debug, Clone, Copy, Default)]
pub struct OnNeckDetector;

impl PatternDetector for OnNeckDetector {
    fn name(&self) -> &'static str {
        "CDLONNECK"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = neck_setup(candles, index)?;
        let equal = equal_at(candles, index - 1);
        ((curr.close - prev.low).abs() <= equal).then_some(BEARISH)
    }
}

/// CDLTHRUSTING - Thrusting: white closes into the prior body, short of its midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrustingDetector;

impl PatternDetector for ThrustingDetector {
    fn name(&self) -> &'static str {
        "CDLTHRUSTING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = neck_setup(candles, index)?;
        let equal = equal_at(candles, index - 1);
        let matched =
            curr.close > prev.close + equal && curr.close <= prev.close + prev.body() * 0.5;
        matched.then_some(BEARISH)
    }
}

/// CDLSEPARATINGLINES - Separating Lines: opposite colors opening at the same level
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatingLinesDetector;

impl PatternDetector for SeparatingLinesDetector {
    fn name(&self) -> &'static str {
        "CDLSEPARATINGLINES"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let (prev, curr) = pair(candles, index)?;
        let range = curr.range();

        if prev.color() == curr.color() {
            return None;
        }
        if (curr.open - prev.open).abs() > equal_at(candles, index - 1) {
            return None;
        }
        if !is_body_long(curr.body(), ctx.avg_body, range) {
            return None;
        }
        // Second line opens on its extreme
        let opening_shadow = if curr.is_white() {
            curr.lower_shadow()
        } else {
            curr.upper_shadow()
        };
        is_shadow_very_short(opening_shadow, ctx.avg_range, range).then(|| curr.color() * BULLISH)
    }
}

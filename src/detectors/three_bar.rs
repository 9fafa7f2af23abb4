//! Three-bar candlestick pattern detectors (TA-Lib compatible)
//!
//! TA-Lib patterns: CDL3WHITESOLDIERS, CDL3BLACKCROWS, CDL3INSIDE, CDL3OUTSIDE,
//! CDLMORNINGSTAR, CDLEVENINGSTAR, CDLMORNINGDOJISTAR, CDLEVENINGDOJISTAR, CDL2CROWS,
//! CDLABANDONEDBABY, CDL3STARSINSOUTH, CDLADVANCEBLOCK, CDLIDENTICAL3CROWS,
//! CDLSTALLEDPATTERN, CDLSTICKSANDWICH, CDLTASUKIGAP, CDLTRISTAR, CDLUNIQUE3RIVER,
//! CDLUPSIDEGAP2CROWS, CDLXSIDEGAP3METHODS, CDLGAPSIDESIDEWHITE
//!
//! Every candle is judged against its own trailing window, so the three
//! bars of one pattern can see different averages.

use super::helpers::{
    self, body_gap_down, body_gap_up, body_long_at, body_short_at, doji_at, exceeds_very_short,
    is_body_short, is_doji, is_shadow_long, is_shadow_short, is_shadow_very_short,
    trailing_avg_body,
};
use super::{BEARISH, BULLISH};
use crate::context::CandleContext;
use crate::registry::PatternDetector;
use crate::series::{Candle, CandleExt, Candles};

impl_with_defaults!(
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
    ThreeInsideDetector,
    ThreeOutsideDetector,
    MorningStarDetector,
    EveningStarDetector,
    MorningDojiStarDetector,
    EveningDojiStarDetector,
    TwoCrowsDetector,
    AbandonedBabyDetector,
    ThreeStarsInSouthDetector,
    AdvanceBlockDetector,
    IdenticalThreeCrowsDetector,
    StalledPatternDetector,
    StickSandwichDetector,
    TasukiGapDetector,
    TristarDetector,
    UniqueThreeRiverDetector,
    UpsideGapTwoCrowsDetector,
    XSideGapThreeMethodsDetector,
    GapSideSideWhiteDetector,
);

/// `(first, second, third)` ending at `index`
#[inline]
fn triple(candles: &Candles, index: usize) -> Option<(Candle, Candle, Candle)> {
    let start = index.checked_sub(2)?;
    Some((candles.at(start)?, candles.at(start + 1)?, candles.at(index)?))
}

#[inline]
fn very_short_at(candles: &Candles, at: usize, shadow: f64, range: f64) -> bool {
    is_shadow_very_short(shadow, helpers::trailing_avg_range(candles, at), range)
}

#[inline]
fn shadow_short_at(candles: &Candles, at: usize, shadow: f64, range: f64) -> bool {
    is_shadow_short(shadow, helpers::trailing_avg_shadow(candles, at), range)
}

/// Near/Far/Equal distance at `at` for the given factor
#[inline]
fn distance_at(candles: &Candles, at: usize, factor: f64) -> f64 {
    helpers::trailing_avg_range_5(candles, at) * factor
}

// ============================================================
// SOLDIERS / CROWS
// ============================================================

/// CDL3WHITESOLDIERS - Three Advancing White Soldiers
#[derive(Debug, Clone, Copy)]
pub struct ThreeWhiteSoldiersDetector {
    pub near_factor: f64,
}

impl Default for ThreeWhiteSoldiersDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for ThreeWhiteSoldiersDetector {
    fn name(&self) -> &'static str {
        "CDL3WHITESOLDIERS"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_white() && second.is_white() && third.is_white()) {
            return None;
        }
        if second.close <= first.close || third.close <= second.close {
            return None;
        }
        for (at, c) in [(index - 2, first), (index - 1, second), (index, third)] {
            if !very_short_at(candles, at, c.upper_shadow(), c.range()) {
                return None;
            }
        }

        // Each opens within (or just above) the previous body
        let near_first = helpers::trailing_avg_range_5(candles, index - 2) * self.near_factor;
        let near_second = helpers::trailing_avg_range_5(candles, index - 1) * self.near_factor;
        let opens_ok = second.open > first.open
            && second.open <= first.close + near_first
            && third.open > second.open
            && third.open <= second.close + near_second;
        if !opens_ok {
            return None;
        }

        // The advance must not stall: last body not short
        (!body_short_at(candles, index)).then_some(BULLISH)
    }
}

/// CDL3BLACKCROWS - Three Black Crows after a white candle
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl PatternDetector for ThreeBlackCrowsDetector {
    fn name(&self) -> &'static str {
        "CDL3BLACKCROWS"
    }

    fn min_bars(&self) -> usize {
        4
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let prior = candles.at(index.checked_sub(3)?)?;
        let (first, second, third) = triple(candles, index)?;

        if !prior.is_white() {
            return None;
        }
        if !(first.is_black() && second.is_black() && third.is_black()) {
            return None;
        }
        for (at, c) in [(index - 2, first), (index - 1, second), (index, third)] {
            if !very_short_at(candles, at, c.lower_shadow(), c.range()) {
                return None;
            }
        }
        // Each opens within the previous black body
        if second.open >= first.open || second.open <= first.close {
            return None;
        }
        if third.open >= second.open || third.open <= second.close {
            return None;
        }
        (prior.high > first.close && second.close < first.close && third.close < second.close)
            .then_some(BEARISH)
    }
}

// ============================================================
// INSIDE / OUTSIDE
// ============================================================

/// CDL3INSIDE - Three Inside Up/Down: harami confirmed by the third bar
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeInsideDetector;

impl PatternDetector for ThreeInsideDetector {
    fn name(&self) -> &'static str {
        "CDL3INSIDE"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !body_long_at(candles, index - 2) || !body_short_at(candles, index - 1) {
            return None;
        }
        if second.body_top() >= first.body_top() || second.body_bottom() <= first.body_bottom() {
            return None;
        }
        if first.is_white() && third.is_black() && third.close < first.open {
            Some(BEARISH)
        } else if first.is_black() && third.is_white() && third.close > first.open {
            Some(BULLISH)
        } else {
            None
        }
    }
}

/// CDL3OUTSIDE - Three Outside Up/Down: engulfing confirmed by the third bar
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeOutsideDetector;

impl PatternDetector for ThreeOutsideDetector {
    fn name(&self) -> &'static str {
        "CDL3OUTSIDE"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        let bullish = first.is_black()
            && second.is_white()
            && second.close > first.open
            && second.open < first.close
            && third.close > second.close;
        let bearish = first.is_white()
            && second.is_black()
            && second.open > first.close
            && second.close < first.open
            && third.close < second.close;

        if bullish {
            Some(BULLISH)
        } else if bearish {
            Some(BEARISH)
        } else {
            None
        }
    }
}

// ============================================================
// STARS
// ============================================================

/// CDLMORNINGSTAR - Morning Star
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
    pub penetration: f64,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

impl PatternDetector for MorningStarDetector {
    fn name(&self) -> &'static str {
        "CDLMORNINGSTAR"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_black() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !body_short_at(candles, index - 1) || !body_gap_down(&first, &second) {
            return None;
        }
        // Third body longer than short, judged at its own window
        let third_short = is_body_short(third.body(), trailing_avg_body(candles, index), third.range());
        if !third.is_white() || third_short {
            return None;
        }
        (third.close > first.close + first.body() * self.penetration).then_some(BULLISH)
    }
}

/// CDLEVENINGSTAR - Evening Star
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
    pub penetration: f64,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

impl PatternDetector for EveningStarDetector {
    fn name(&self) -> &'static str {
        "CDLEVENINGSTAR"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_white() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !body_short_at(candles, index - 1) || !body_gap_up(&first, &second) {
            return None;
        }
        let third_short = is_body_short(third.body(), trailing_avg_body(candles, index), third.range());
        if !third.is_black() || third_short {
            return None;
        }
        (third.close < first.close - first.body() * self.penetration).then_some(BEARISH)
    }
}

/// CDLMORNINGDOJISTAR - Morning Doji Star
#[derive(Debug, Clone, Copy)]
pub struct MorningDojiStarDetector {
    pub penetration: f64,
}

impl Default for MorningDojiStarDetector {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

impl PatternDetector for MorningDojiStarDetector {
    fn name(&self) -> &'static str {
        "CDLMORNINGDOJISTAR"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_black() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !doji_at(candles, index - 1) || !body_gap_down(&first, &second) {
            return None;
        }
        if !third.is_white() || body_short_at(candles, index) {
            return None;
        }
        (third.close > first.close + first.body() * self.penetration).then_some(BULLISH)
    }
}

/// CDLEVENINGDOJISTAR - Evening Doji Star
#[derive(Debug, Clone, Copy)]
pub struct EveningDojiStarDetector {
    pub penetration: f64,
}

impl Default for EveningDojiStarDetector {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

impl PatternDetector for EveningDojiStarDetector {
    fn name(&self) -> &'static str {
        "CDLEVENINGDOJISTAR"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_white() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !doji_at(candles, index - 1) || !body_gap_up(&first, &second) {
            return None;
        }
        if !third.is_black() || body_short_at(candles, index) {
            return None;
        }
        (third.close < first.close - first.body() * self.penetration).then_some(BEARISH)
    }
}

/// CDL2CROWS - Two Crows
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoCrowsDetector;

impl PatternDetector for TwoCrowsDetector {
    fn name(&self) -> &'static str {
        "CDL2CROWS"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_white() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !second.is_black() || !body_gap_up(&first, &second) {
            return None;
        }
        let matched = third.is_black()
            && third.open < second.open
            && third.open > second.close
            && third.close > first.open
            && third.close < first.close;
        matched.then_some(BEARISH)
    }
}

/// CDLABANDONEDBABY - Abandoned Baby: doji isolated by shadow gaps
#[derive(Debug, Clone, Copy)]
pub struct AbandonedBabyDetector {
    pub penetration: f64,
}

impl Default for AbandonedBabyDetector {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

impl PatternDetector for AbandonedBabyDetector {
    fn name(&self) -> &'static str {
        "CDLABANDONEDBABY"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !body_long_at(candles, index - 2) || !doji_at(candles, index - 1) {
            return None;
        }
        let third_short = is_body_short(third.body(), trailing_avg_body(candles, index), third.range());
        if third_short {
            return None;
        }

        let bullish = first.is_black()
            && third.is_white()
            && second.high < first.low
            && third.low > second.high
            && third.close > first.close + first.body() * self.penetration;
        let bearish = first.is_white()
            && third.is_black()
            && second.low > first.high
            && third.high < second.low
            && third.close < first.close - first.body() * self.penetration;

        if bullish {
            Some(BULLISH)
        } else if bearish {
            Some(BEARISH)
        } else {
            None
        }
    }
}

// ============================================================
// BOTTOMS
// ============================================================

/// CDL3STARSINSOUTH - Three Stars in the South: shrinking black candles
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeStarsInSouthDetector;

impl PatternDetector for ThreeStarsInSouthDetector {
    fn name(&self) -> &'static str {
        "CDL3STARSINSOUTH"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_black() && second.is_black() && third.is_black()) {
            return None;
        }
        // Long first candle with a long lower shadow
        if !body_long_at(candles, index - 2) || !is_shadow_long(first.lower_shadow(), first.body()) {
            return None;
        }
        // Smaller second candle opening inside the first range, low held above the first low
        let second_ok = second.body() < first.body()
            && second.open > first.close
            && second.open <= first.high
            && second.low < first.close
            && second.low >= first.low
            && exceeds_very_short(
                second.lower_shadow(),
                helpers::trailing_avg_range(candles, index - 1),
                second.range(),
            );
        if !second_ok {
            return None;
        }
        // Small marubozu inside the second range
        let third_ok = body_short_at(candles, index)
            && very_short_at(candles, index, third.upper_shadow(), third.range())
            && very_short_at(candles, index, third.lower_shadow(), third.range())
            && third.low >= second.low
            && third.high <= second.high;
        third_ok.then_some(BULLISH)
    }
}

/// CDLUNIQUE3RIVER - Unique 3 River
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueThreeRiverDetector;

impl PatternDetector for UniqueThreeRiverDetector {
    fn name(&self) -> &'static str {
        "CDLUNIQUE3RIVER"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_black() || !body_long_at(candles, index - 2) {
            return None;
        }
        // Black harami body that still prints a new low
        let second_ok = second.is_black()
            && second.close > first.close
            && second.open <= first.open
            && second.low < first.low;
        if !second_ok {
            return None;
        }
        let third_ok = third.is_white() && body_short_at(candles, index) && third.open > second.low;
        third_ok.then_some(BULLISH)
    }
}

/// CDLSTICKSANDWICH - Stick Sandwich: two equal black closes around a white candle
#[derive(Debug, Clone, Copy, Default)]
pub struct StickSandwichDetector;

impl PatternDetector for StickSandwichDetector {
    fn name(&self) -> &'static str {
        "CDLSTICKSANDWICH"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_black() && second.is_white() && third.is_black()) {
            return None;
        }
        if second.low <= first.close {
            return None;
        }
        let equal = distance_at(candles, index - 2, helpers::EQUAL_FACTOR);
        ((third.close - first.close).abs() <= equal).then_some(BULLISH)
    }
}

// ============================================================
// STALLING ADVANCES
// ============================================================

/// CDLADVANCEBLOCK - Advance Block: three white candles losing strength
#[derive(Debug, Clone, Copy)]
pub struct AdvanceBlockDetector {
    pub near_factor: f64,
    pub far_factor: f64,
}

impl Default for AdvanceBlockDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
            far_factor: helpers::FAR_FACTOR,
        }
    }
}

impl PatternDetector for AdvanceBlockDetector {
    fn name(&self) -> &'static str {
        "CDLADVANCEBLOCK"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_white() && second.is_white() && third.is_white()) {
            return None;
        }
        if second.close <= first.close || third.close <= second.close {
            return None;
        }
        let near_first = distance_at(candles, index - 2, self.near_factor);
        let near_second = distance_at(candles, index - 1, self.near_factor);
        if second.open <= first.open || second.open > first.close + near_first {
            return None;
        }
        if third.open <= second.open || third.open > second.close + near_second {
            return None;
        }
        if !body_long_at(candles, index - 2)
            || !shadow_short_at(candles, index - 2, first.upper_shadow(), first.range())
        {
            return None;
        }

        let (b1, b2, b3) = (first.body(), second.body(), third.body());
        let far_first = distance_at(candles, index - 2, self.far_factor);
        let far_second = distance_at(candles, index - 1, self.far_factor);

        // Any one sign of weakening is enough
        let shrinking_second = b2 < b1 - far_first && b3 < b2 + near_second;
        let shrinking_third = b3 < b2 - far_second;
        let tiring = b3 < b2
            && b2 < b1
            && (!shadow_short_at(candles, index, third.upper_shadow(), third.range())
                || !shadow_short_at(candles, index - 1, second.upper_shadow(), second.range()));
        let rejected = b3 < b2 && is_shadow_long(third.upper_shadow(), b3);

        (shrinking_second || shrinking_third || tiring || rejected).then_some(BEARISH)
    }
}

/// CDLSTALLEDPATTERN - Stalled Pattern: two long white candles, then a small one
#[derive(Debug, Clone, Copy)]
pub struct StalledPatternDetector {
    pub near_factor: f64,
}

impl Default for StalledPatternDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for StalledPatternDetector {
    fn name(&self) -> &'static str {
        "CDLSTALLEDPATTERN"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_white() && second.is_white() && third.is_white()) {
            return None;
        }
        if second.close <= first.close || third.close <= second.close {
            return None;
        }
        if !body_long_at(candles, index - 2) || !body_long_at(candles, index - 1) {
            return None;
        }
        if !very_short_at(candles, index - 1, second.upper_shadow(), second.range()) {
            return None;
        }
        let near_first = distance_at(candles, index - 2, self.near_factor);
        if second.open <= first.open || second.open > first.close + near_first {
            return None;
        }
        if !body_short_at(candles, index) {
            return None;
        }
        // Third rides on the shoulder of the second body
        let near_second = distance_at(candles, index - 1, self.near_factor);
        (third.open >= second.close - third.body() - near_second).then_some(BEARISH)
    }
}

/// CDLIDENTICAL3CROWS - Identical Three Crows: each opens at the prior close
#[derive(Debug, Clone, Copy, Default)]
pub struct IdenticalThreeCrowsDetector;

impl PatternDetector for IdenticalThreeCrowsDetector {
    fn name(&self) -> &'static str {
        "CDLIDENTICAL3CROWS"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !(first.is_black() && second.is_black() && third.is_black()) {
            return None;
        }
        for (at, c) in [(index - 2, first), (index - 1, second), (index, third)] {
            if !very_short_at(candles, at, c.lower_shadow(), c.range()) {
                return None;
            }
        }
        let equal_first = distance_at(candles, index - 2, helpers::EQUAL_FACTOR);
        let equal_second = distance_at(candles, index - 1, helpers::EQUAL_FACTOR);
        if (second.open - first.close).abs() > equal_first {
            return None;
        }
        if (third.open - second.close).abs() > equal_second {
            return None;
        }
        (second.close < first.close && third.close < second.close).then_some(BEARISH)
    }
}

/// CDLUPSIDEGAP2CROWS - Upside Gap Two Crows
#[derive(Debug, Clone, Copy, Default)]
pub struct UpsideGapTwoCrowsDetector;

impl PatternDetector for UpsideGapTwoCrowsDetector {
    fn name(&self) -> &'static str {
        "CDLUPSIDEGAP2CROWS"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !first.is_white() || !body_long_at(candles, index - 2) {
            return None;
        }
        if !second.is_black() || !body_short_at(candles, index - 1) || !body_gap_up(&first, &second) {
            return None;
        }
        // Third engulfs the second body but the gap over the first close holds
        let matched = third.is_black()
            && third.open > second.open
            && third.close < second.close
            && third.close > first.close;
        matched.then_some(BEARISH)
    }
}

// ============================================================
// GAPS
// ============================================================

/// CDLTASUKIGAP - Upside/Downside Tasuki Gap
#[derive(Debug, Clone, Copy)]
pub struct TasukiGapDetector {
    pub near_factor: f64,
}

impl Default for TasukiGapDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for TasukiGapDetector {
    fn name(&self) -> &'static str {
        "CDLTASUKIGAP"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if second.color() == third.color() {
            return None;
        }
        // Third opens inside the second body and closes into, not across, the gap
        let matched = if second.is_white() {
            body_gap_up(&first, &second)
                && third.open < second.close
                && third.open > second.open
                && third.close < second.open
                && third.close > first.body_top()
        } else {
            body_gap_down(&first, &second)
                && third.open < second.open
                && third.open > second.close
                && third.close > second.open
                && third.close < first.body_bottom()
        };
        if !matched {
            return None;
        }
        let near = distance_at(candles, index - 1, self.near_factor);
        ((second.body() - third.body()).abs() < near).then(|| second.color() * BULLISH)
    }
}

/// CDLXSIDEGAP3METHODS - Upside/Downside Gap Three Methods
#[derive(Debug, Clone, Copy, Default)]
pub struct XSideGapThreeMethodsDetector;

impl PatternDetector for XSideGapThreeMethodsDetector {
    fn name(&self) -> &'static str {
        "CDLXSIDEGAP3METHODS"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if first.color() != second.color() || third.color() == second.color() {
            return None;
        }
        // Third opens in the second body and closes in the first, filling the gap
        if third.open >= second.body_top() || third.open <= second.body_bottom() {
            return None;
        }
        if third.close >= first.body_top() || third.close <= first.body_bottom() {
            return None;
        }
        let gapped = if first.is_white() {
            body_gap_up(&first, &second)
        } else {
            body_gap_down(&first, &second)
        };
        gapped.then(|| first.color() * BULLISH)
    }
}

/// CDLGAPSIDESIDEWHITE - Up/Down-gap side-by-side white lines
#[derive(Debug, Clone, Copy)]
pub struct GapSideSideWhiteDetector {
    pub near_factor: f64,
}

impl Default for GapSideSideWhiteDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for GapSideSideWhiteDetector {
    fn name(&self) -> &'static str {
        "CDLGAPSIDESIDEWHITE"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        if !second.is_white() || !third.is_white() {
            return None;
        }
        let up = body_gap_up(&first, &second) && body_gap_up(&first, &third);
        let down = body_gap_down(&first, &second) && body_gap_down(&first, &third);
        if !up && !down {
            return None;
        }
        // Side by side: similar bodies opening at the same level
        let near = distance_at(candles, index - 1, self.near_factor);
        let equal = distance_at(candles, index - 1, helpers::EQUAL_FACTOR);
        if (third.body() - second.body()).abs() > near || (third.open - second.open).abs() > equal {
            return None;
        }
        Some(if up { BULLISH } else { BEARISH })
    }
}

/// CDLTRISTAR - Tristar: three dojis, the middle one gapping away
#[derive(Debug, Clone, Copy, Default)]
pub struct TristarDetector;

impl PatternDetector for TristarDetector {
    fn name(&self) -> &'static str {
        "CDLTRISTAR"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let (first, second, third) = triple(candles, index)?;

        // All three judged against the first candle's window
        let avg_range = helpers::trailing_avg_range(candles, index - 2);
        if [first, second, third]
            .iter()
            .any(|c| !is_doji(c.body(), avg_range, c.range()))
        {
            return None;
        }
        if body_gap_up(&first, &second) && third.body_top() < second.body_top() {
            Some(BEARISH)
        } else if body_gap_down(&first, &second) && third.body_bottom() > second.body_bottom() {
            Some(BULLISH)
        } else {
            None
        }
    }
}

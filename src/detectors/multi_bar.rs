//! Multi-bar candlestick pattern detectors (TA-Lib compatible)
//!
//! TA-Lib patterns: CDL3LINESTRIKE, CDLRISEFALL3METHODS, CDLMATHOLD, CDLBREAKAWAY,
//! CDLCONCEALBABYSWALL, CDLLADDERBOTTOM, CDLHIKKAKE, CDLHIKKAKEMOD
//!
//! CDLHIKKAKE and CDLHIKKAKEMOD only report the setup bar (`+-100`); the
//! delayed `+-200` confirmation TA-Lib emits a few bars later is not produced.

use super::helpers::{
    self, body_gap_down, body_gap_up, body_long_at, body_short_at, exceeds_very_short,
    is_shadow_very_short,
};
use super::{BEARISH, BULLISH};
use crate::context::CandleContext;
use crate::registry::PatternDetector;
use crate::series::{Candle, CandleExt, Candles};

impl_with_defaults!(
    ThreeLineStrikeDetector,
    RiseFallThreeMethodsDetector,
    MatHoldDetector,
    BreakawayDetector,
    ConcealBabySwallowDetector,
    LadderBottomDetector,
    HikkakeDetector,
    HikkakeModDetector,
);

/// The `N` candles ending at `index`, oldest first
fn window<const N: usize>(candles: &Candles, index: usize) -> Option<[Candle; N]> {
    let start = (index + 1).checked_sub(N)?;
    let mut out = [Candle::new(0.0, 0.0, 0.0, 0.0); N];
    for (k, slot) in out.iter_mut().enumerate() {
        *slot = candles.at(start + k)?;
    }
    Some(out)
}

// ============================================================
// THREE-LINE STRIKE
// ============================================================

/// CDL3LINESTRIKE - Three-Line Strike
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeLineStrikeDetector;

impl PatternDetector for ThreeLineStrikeDetector {
    fn name(&self) -> &'static str {
        "CDL3LINESTRIKE"
    }

    fn min_bars(&self) -> usize {
        4
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [a, b, c, strike] = window::<4>(candles, index)?;

        let color = a.color();
        if b.color() != color || c.color() != color || strike.color() != -color {
            return None;
        }

        // Three rising white lines wiped out by one black, or the mirror image
        if color > 0 {
            let matched = b.close > a.close
                && c.close > b.close
                && strike.open > c.close
                && strike.close < a.open;
            matched.then_some(BULLISH)
        } else {
            let matched = b.close < a.close
                && c.close < b.close
                && strike.open < c.close
                && strike.close > a.open;
            matched.then_some(BEARISH)
        }
    }
}

// ============================================================
// THREE METHODS
// ============================================================

/// CDLRISEFALL3METHODS - Rising/Falling Three Methods
#[derive(Debug, Clone, Copy, Default)]
pub struct RiseFallThreeMethodsDetector;

impl PatternDetector for RiseFallThreeMethodsDetector {
    fn name(&self) -> &'static str {
        "CDLRISEFALL3METHODS"
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let bars = window::<5>(candles, index)?;
        let [first, r1, r2, r3, last] = bars;
        let start = index - 4;

        if !body_long_at(candles, start) || !body_long_at(candles, index) {
            return None;
        }
        if (1..=3).any(|k| !body_short_at(candles, start + k)) {
            return None;
        }

        let color = first.color();
        if [r1, r2, r3].iter().any(|r| r.color() != -color) || last.color() != color {
            return None;
        }
        // Reaction bodies stay inside the first candle's range
        if [r1, r2, r3]
            .iter()
            .any(|r| r.body_bottom() >= first.high || r.body_top() <= first.low)
        {
            return None;
        }

        let sign = f64::from(color);
        let drifts_back = r2.close * sign < r1.close * sign && r3.close * sign < r2.close * sign;
        let resumes = last.open * sign > r3.close * sign && last.close * sign > first.close * sign;
        (drifts_back && resumes).then(|| color * BULLISH)
    }
}

/// CDLMATHOLD - Mat Hold: a gapped reaction held inside the first body
#[derive(Debug, Clone, Copy)]
pub struct MatHoldDetector {
    pub penetration: f64,
}

impl Default for MatHoldDetector {
    fn default() -> Self {
        Self { penetration: 0.5 }
    }
}

impl PatternDetector for MatHoldDetector {
    fn name(&self) -> &'static str {
        "CDLMATHOLD"
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [first, r1, r2, r3, last] = window::<5>(candles, index)?;
        let start = index - 4;

        if !first.is_white() || !body_long_at(candles, start) {
            return None;
        }
        if (1..=3).any(|k| !body_short_at(candles, start + k)) {
            return None;
        }
        if !r1.is_black() || !body_gap_up(&first, &r1) || !last.is_white() {
            return None;
        }
        // Reaction stays in the upper part of the first body and keeps falling
        let floor = first.close - first.body() * self.penetration;
        if [r2, r3]
            .iter()
            .any(|r| r.body_bottom() >= first.close || r.body_bottom() <= floor)
        {
            return None;
        }
        if r2.body_top() >= r1.open || r3.body_top() >= r2.body_top() {
            return None;
        }
        let reaction_high = r1.high.max(r2.high).max(r3.high);
        (last.open > r3.close && last.close > reaction_high).then_some(BULLISH)
    }
}

// ============================================================
// BREAKAWAY
// ============================================================

/// CDLBREAKAWAY - Breakaway: a gapped run that closes back into the gap
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakawayDetector;

impl PatternDetector for BreakawayDetector {
    fn name(&self) -> &'static str {
        "CDLBREAKAWAY"
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [a, b, c, d, e] = window::<5>(candles, index)?;

        let color = a.color();
        if b.color() != color || d.color() != color || e.color() != -color {
            return None;
        }
        if !body_long_at(candles, index - 4) {
            return None;
        }

        if color > 0 {
            let matched = body_gap_up(&a, &b)
                && c.high > b.high
                && c.low > b.low
                && d.high > c.high
                && d.low > c.low
                && e.close < b.open
                && e.close > a.close;
            matched.then_some(BEARISH)
        } else {
            let matched = body_gap_down(&a, &b)
                && c.high < b.high
                && c.low < b.low
                && d.high < c.high
                && d.low < c.low
                && e.close > b.open
                && e.close < a.close;
            matched.then_some(BULLISH)
        }
    }
}

// ============================================================
// CONCEALING BABY SWALLOW
// ============================================================

/// CDLCONCEALBABYSWALL - Concealing Baby Swallow
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcealBabySwallowDetector;

impl PatternDetector for ConcealBabySwallowDetector {
    fn name(&self) -> &'static str {
        "CDLCONCEALBABYSWALL"
    }

    fn min_bars(&self) -> usize {
        4
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [a, b, c, d] = window::<4>(candles, index)?;

        if !(a.is_black() && b.is_black() && c.is_black() && d.is_black()) {
            return None;
        }
        // Two black marubozu
        for (at, m) in [(index - 3, a), (index - 2, b)] {
            let avg_range = helpers::trailing_avg_range(candles, at);
            if !is_shadow_very_short(m.upper_shadow(), avg_range, m.range())
                || !is_shadow_very_short(m.lower_shadow(), avg_range, m.range())
            {
                return None;
            }
        }
        // Third gaps down but its upper shadow reaches into the second body
        let avg_range = helpers::trailing_avg_range(candles, index - 1);
        if !body_gap_down(&b, &c)
            || !exceeds_very_short(c.upper_shadow(), avg_range, c.range())
            || c.high <= b.close
        {
            return None;
        }
        (d.high > c.high && d.low < c.low).then_some(BULLISH)
    }
}

// ============================================================
// LADDER BOTTOM
// ============================================================

/// CDLLADDERBOTTOM - Ladder Bottom
#[derive(Debug, Clone, Copy, Default)]
pub struct LadderBottomDetector;

impl PatternDetector for LadderBottomDetector {
    fn name(&self) -> &'static str {
        "CDLLADDERBOTTOM"
    }

    fn min_bars(&self) -> usize {
        5
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [a, b, c, d, e] = window::<5>(candles, index)?;

        if !(a.is_black() && b.is_black() && c.is_black() && d.is_black() && e.is_white()) {
            return None;
        }
        // Three descending black candles
        let descending = a.open > b.open && b.open > c.open && a.close > b.close && b.close > c.close;
        if !descending {
            return None;
        }
        // Fourth black candle shows an upper shadow
        let avg_range = helpers::trailing_avg_range(candles, index - 1);
        if !exceeds_very_short(d.upper_shadow(), avg_range, d.range()) {
            return None;
        }
        (e.open > d.open && e.close > d.high).then_some(BULLISH)
    }
}

// ============================================================
// HIKKAKE
// ============================================================

/// CDLHIKKAKE - Hikkake: false breakout of an inside bar
#[derive(Debug, Clone, Copy, Default)]
pub struct HikkakeDetector;

impl PatternDetector for HikkakeDetector {
    fn name(&self) -> &'static str {
        "CDLHIKKAKE"
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [mother, inside, breakout] = window::<3>(candles, index)?;

        if !(inside.high < mother.high && inside.low > mother.low) {
            return None;
        }
        if breakout.high < inside.high && breakout.low < inside.low {
            Some(BULLISH)
        } else if breakout.high > inside.high && breakout.low > inside.low {
            Some(BEARISH)
        } else {
            None
        }
    }
}

/// CDLHIKKAKEMOD - Modified Hikkake: two nested inside bars, the second
/// closing near the extreme the breakout then runs through
#[derive(Debug, Clone, Copy)]
pub struct HikkakeModDetector {
    pub near_factor: f64,
}

impl Default for HikkakeModDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for HikkakeModDetector {
    fn name(&self) -> &'static str {
        "CDLHIKKAKEMOD"
    }

    fn min_bars(&self) -> usize {
        4
    }

    fn detect(&self, candles: &Candles, index: usize, _ctx: &CandleContext) -> Option<i32> {
        let [mother, second, inside, breakout] = window::<4>(candles, index)?;

        let nested = second.high < mother.high
            && second.low > mother.low
            && inside.high < second.high
            && inside.low > second.low;
        if !nested {
            return None;
        }
        let near = helpers::trailing_avg_range_5(candles, index - 2) * self.near_factor;
        if breakout.high < inside.high
            && breakout.low < inside.low
            && second.close <= second.low + near
        {
            Some(BULLISH)
        } else if breakout.high > inside.high
            && breakout.low > inside.low
            && second.close >= second.high - near
        {
            Some(BEARISH)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::compute_contexts;

    fn run<D: PatternDetector>(detector: &D, bars: Vec<Candle>) -> Option<i32> {
        let candles: Candles = bars.into_iter().collect();
        let ctx = compute_contexts(&candles);
        let last = candles.len() - 1;
        detector.detect(&candles, last, &ctx[last])
    }

    /// Ten quiet white candles (body 1, range 2) ahead of `tail`
    fn after_baseline<D: PatternDetector>(detector: &D, tail: &[Candle]) -> Option<i32> {
        let mut bars = vec![Candle::new(100.0, 101.5, 99.5, 101.0); 10];
        bars.extend_from_slice(tail);
        run(detector, bars)
    }

    #[test]
    fn test_window_too_short() {
        let candles: Candles = vec![Candle::new(1.0, 2.0, 0.5, 1.5); 3].into_iter().collect();
        assert!(window::<4>(&candles, 2).is_none());
        assert!(window::<3>(&candles, 2).is_some());
    }

    #[test]
    fn test_three_line_strike_bullish() {
        let bars = vec![
            Candle::new(100.0, 101.2, 99.9, 101.0),
            Candle::new(100.8, 102.2, 100.7, 102.0),
            Candle::new(101.8, 103.2, 101.7, 103.0),
            Candle::new(103.5, 103.6, 99.0, 99.5),
        ];
        assert_eq!(run(&ThreeLineStrikeDetector, bars), Some(100));
    }

    #[test]
    fn test_hikkake_directions() {
        let mother = Candle::new(100.0, 105.0, 95.0, 101.0);
        let inside = Candle::new(100.0, 103.0, 97.0, 101.0);

        let down = Candle::new(99.0, 102.0, 96.0, 97.0);
        assert_eq!(run(&HikkakeDetector, vec![mother, inside, down]), Some(100));

        let up = Candle::new(101.0, 104.0, 98.0, 103.0);
        assert_eq!(run(&HikkakeDetector, vec![mother, inside, up]), Some(-100));
    }

    #[test]
    fn test_hikkake_requires_inside_bar() {
        let mother = Candle::new(100.0, 105.0, 95.0, 101.0);
        let wide = Candle::new(100.0, 106.0, 97.0, 101.0);
        let down = Candle::new(99.0, 102.0, 96.0, 97.0);
        assert_eq!(run(&HikkakeDetector, vec![mother, wide, down]), None);
    }

    #[test]
    fn test_rising_three_methods() {
        let mut bars = vec![
            Candle::new(100.0, 104.1, 99.9, 104.0),
            Candle::new(103.6, 103.8, 103.0, 103.2),
            Candle::new(103.1, 103.3, 102.5, 102.7),
            Candle::new(102.6, 102.8, 102.0, 102.2),
            Candle::new(102.4, 105.2, 102.3, 105.0),
        ];
        assert_eq!(after_baseline(&RiseFallThreeMethodsDetector, &bars), Some(100));

        // Last close does not clear the first close
        bars[4] = Candle::new(102.4, 104.0, 102.3, 103.8);
        assert_eq!(after_baseline(&RiseFallThreeMethodsDetector, &bars), None);
    }

    #[test]
    fn test_ladder_bottom() {
        let mut bars = vec![
            Candle::new(104.0, 104.1, 102.9, 103.0),
            Candle::new(103.0, 103.1, 101.9, 102.0),
            Candle::new(102.0, 102.1, 100.9, 101.0),
            Candle::new(101.0, 102.0, 100.4, 100.5),
            Candle::new(101.5, 102.8, 101.4, 102.6),
        ];
        assert_eq!(after_baseline(&LadderBottomDetector, &bars), Some(100));

        // Fourth candle without an upper shadow
        bars[3] = Candle::new(101.0, 101.05, 100.4, 100.5);
        assert_eq!(after_baseline(&LadderBottomDetector, &bars), None);
    }

    #[test]
    fn test_mat_hold() {
        let mut bars = vec![
            Candle::new(100.0, 104.1, 99.9, 104.0),
            Candle::new(104.8, 105.0, 104.3, 104.5),
            Candle::new(104.2, 104.4, 103.3, 103.6),
            Candle::new(103.9, 104.0, 102.9, 103.2),
            Candle::new(103.5, 106.2, 103.4, 106.0),
        ];
        assert_eq!(after_baseline(&MatHoldDetector::default(), &bars), Some(100));

        // Closes under the reaction high
        bars[4] = Candle::new(103.5, 105.0, 103.4, 104.8);
        assert_eq!(after_baseline(&MatHoldDetector::default(), &bars), None);
    }

    #[test]
    fn test_bearish_breakaway() {
        let mut bars = vec![
            Candle::new(100.0, 104.2, 99.9, 104.0),
            Candle::new(105.0, 106.2, 104.9, 106.0),
            Candle::new(106.2, 107.0, 105.5, 106.5),
            Candle::new(106.8, 107.8, 106.0, 107.5),
            Candle::new(107.4, 107.5, 104.4, 104.5),
        ];
        assert_eq!(after_baseline(&BreakawayDetector, &bars), Some(-100));

        // Closing under the first close fills the gap completely
        bars[4] = Candle::new(107.4, 107.5, 103.4, 103.5);
        assert_eq!(after_baseline(&BreakawayDetector, &bars), None);
    }

    #[test]
    fn test_concealing_baby_swallow() {
        let mut bars = vec![
            Candle::new(106.0, 106.0, 104.0, 104.0),
            Candle::new(104.0, 104.0, 102.0, 102.0),
            Candle::new(101.5, 102.5, 100.8, 101.0),
            Candle::new(103.0, 103.0, 100.0, 100.2),
        ];
        assert_eq!(after_baseline(&ConcealBabySwallowDetector, &bars), Some(100));

        // Fourth does not engulf the third's upper shadow
        bars[3] = Candle::new(102.0, 102.2, 100.0, 100.2);
        assert_eq!(after_baseline(&ConcealBabySwallowDetector, &bars), None);
    }

    #[test]
    fn test_hikkake_mod() {
        let mut bars = vec![
            Candle::new(100.0, 105.0, 95.0, 101.0),
            Candle::new(100.0, 104.0, 96.0, 96.5),
            Candle::new(98.0, 103.0, 97.0, 99.0),
            Candle::new(98.0, 102.0, 96.5, 97.0),
        ];
        assert_eq!(after_baseline(&HikkakeModDetector::default(), &bars), Some(100));

        // Second inside bar closes mid-range
        bars[1] = Candle::new(100.0, 104.0, 96.0, 98.0);
        assert_eq!(after_baseline(&HikkakeModDetector::default(), &bars), None);
    }
}

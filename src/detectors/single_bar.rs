//! Single-bar candlestick pattern detectors (TA-Lib compatible)
//!
//! TA-Lib patterns: CDLDOJI, CDLDRAGONFLYDOJI, CDLGRAVESTONEDOJI, CDLLONGLEGGEDDOJI,
//! CDLHAMMER, CDLHANGINGMAN, CDLINVERTEDHAMMER, CDLSHOOTINGSTAR, CDLMARUBOZU,
//! CDLSPINNINGTOP, CDLBELTHOLD, CDLLONGLINE, CDLSHORTLINE, CDLTAKURI, CDLRICKSHAWMAN,
//! CDLCLOSINGMARUBOZU, CDLHIGHWAVE
//!
//! Body and shadow sizes are judged against the trailing averages in
//! [`CandleContext`]. The hammer family also looks at the previous bar for
//! its position check, so those need two bars.

use super::helpers::{
    self, body_gap_down, body_gap_up, exceeds_very_short, is_body_long, is_body_short, is_doji,
    is_shadow_long, is_shadow_short, is_shadow_very_short, is_shadow_verylong,
};
use super::{BEARISH, BULLISH};
use crate::context::CandleContext;
use crate::registry::PatternDetector;
use crate::series::{CandleExt, Candles};

impl_with_defaults!(
    DojiDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
    LongLeggedDojiDetector,
    TakuriDetector,
    RickshawManDetector,
    HammerDetector,
    HangingManDetector,
    InvertedHammerDetector,
    ShootingStarDetector,
    MarubozuDetector,
    ClosingMarubozuDetector,
    SpinningTopDetector,
    HighWaveDetector,
    BeltHoldDetector,
    LongLineDetector,
    ShortLineDetector,
);

// ============================================================
// DOJI FAMILY
// ============================================================

/// CDLDOJI - Doji
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub doji_factor: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_factor: helpers::DOJI_FACTOR,
        }
    }
}

impl PatternDetector for DojiDetector {
    fn name(&self) -> &'static str {
        "CDLDOJI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let scaled = ctx.avg_range * self.doji_factor / helpers::DOJI_FACTOR;
        is_doji(bar.body(), scaled, bar.range()).then_some(BULLISH)
    }
}

/// CDLDRAGONFLYDOJI - Dragonfly Doji: no upper shadow, long lower shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct DragonflyDojiDetector;

impl PatternDetector for DragonflyDojiDetector {
    fn name(&self) -> &'static str {
        "CDLDRAGONFLYDOJI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        if !is_doji(bar.body(), ctx.avg_range, range) {
            return None;
        }
        if !is_shadow_very_short(bar.upper_shadow(), ctx.avg_range, range) {
            return None;
        }
        exceeds_very_short(bar.lower_shadow(), ctx.avg_range, range).then_some(BULLISH)
    }
}

/// CDLGRAVESTONEDOJI - Gravestone Doji: no lower shadow, long upper shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct GravestoneDojiDetector;

impl PatternDetector for GravestoneDojiDetector {
    fn name(&self) -> &'static str {
        "CDLGRAVESTONEDOJI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        if !is_doji(bar.body(), ctx.avg_range, range) {
            return None;
        }
        if !is_shadow_very_short(bar.lower_shadow(), ctx.avg_range, range) {
            return None;
        }
        exceeds_very_short(bar.upper_shadow(), ctx.avg_range, range).then_some(BULLISH)
    }
}

/// CDLLONGLEGGEDDOJI - Long Legged Doji: doji with at least one long shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct LongLeggedDojiDetector;

impl PatternDetector for LongLeggedDojiDetector {
    fn name(&self) -> &'static str {
        "CDLLONGLEGGEDDOJI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let body = bar.body();

        if !is_doji(body, ctx.avg_range, bar.range()) {
            return None;
        }
        let long_leg =
            is_shadow_long(bar.upper_shadow(), body) || is_shadow_long(bar.lower_shadow(), body);
        long_leg.then_some(BULLISH)
    }
}

/// CDLTAKURI - Takuri: dragonfly doji with a very long lower shadow
#[derive(Debug, Clone, Copy, Default)]
pub struct TakuriDetector;

impl PatternDetector for TakuriDetector {
    fn name(&self) -> &'static str {
        "CDLTAKURI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        let matched = is_doji(body, ctx.avg_range, range)
            && is_shadow_very_short(bar.upper_shadow(), ctx.avg_range, range)
            && is_shadow_verylong(bar.lower_shadow(), body);
        matched.then_some(BULLISH)
    }
}

/// CDLRICKSHAWMAN - Rickshaw Man: long-legged doji with its body mid-range
#[derive(Debug, Clone, Copy)]
pub struct RickshawManDetector {
    pub near_factor: f64,
}

impl Default for RickshawManDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for RickshawManDetector {
    fn name(&self) -> &'static str {
        "CDLRICKSHAWMAN"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        if !is_doji(body, ctx.avg_range, range) {
            return None;
        }
        if !is_shadow_long(bar.upper_shadow(), body) || !is_shadow_long(bar.lower_shadow(), body) {
            return None;
        }
        let midpoint = bar.low + range / 2.0;
        let near = ctx.avg_range_5 * self.near_factor;
        let centred = bar.body_bottom() <= midpoint + near && bar.body_top() >= midpoint - near;
        centred.then_some(BULLISH)
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// CDLHAMMER - Hammer: small body near the prior low, long lower shadow
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    pub near_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn name(&self) -> &'static str {
        "CDLHAMMER"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let prev = candles.at(index.checked_sub(1)?)?;
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        if !is_body_short(body, ctx.avg_body, range) {
            return None;
        }
        if !is_shadow_long(bar.lower_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.upper_shadow(), ctx.avg_range, range) {
            return None;
        }
        // Body at or below the prior low
        let near = helpers::trailing_avg_range_5(candles, index - 1) * self.near_factor;
        (bar.body_bottom() <= prev.low + near).then_some(BULLISH)
    }
}

/// CDLHANGINGMAN - Hanging Man: hammer shape at or above the prior high
#[derive(Debug, Clone, Copy)]
pub struct HangingManDetector {
    pub near_factor: f64,
}

impl Default for HangingManDetector {
    fn default() -> Self {
        Self {
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl PatternDetector for HangingManDetector {
    fn name(&self) -> &'static str {
        "CDLHANGINGMAN"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let prev = candles.at(index.checked_sub(1)?)?;
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        if !is_body_short(body, ctx.avg_body, range) {
            return None;
        }
        if !is_shadow_long(bar.lower_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.upper_shadow(), ctx.avg_range, range) {
            return None;
        }
        let near = helpers::trailing_avg_range_5(candles, index - 1) * self.near_factor;
        (bar.body_bottom() >= prev.high - near).then_some(BEARISH)
    }
}

/// CDLINVERTEDHAMMER - Inverted Hammer: long upper shadow, body gapping down
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedHammerDetector;

impl PatternDetector for InvertedHammerDetector {
    fn name(&self) -> &'static str {
        "CDLINVERTEDHAMMER"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let prev = candles.at(index.checked_sub(1)?)?;
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        if !is_body_short(body, ctx.avg_body, range) {
            return None;
        }
        if !is_shadow_long(bar.upper_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.lower_shadow(), ctx.avg_range, range) {
            return None;
        }
        body_gap_down(&prev, &bar).then_some(BULLISH)
    }
}

/// CDLSHOOTINGSTAR - Shooting Star: long upper shadow, body gapping up
#[derive(Debug, Clone, Copy, Default)]
pub struct ShootingStarDetector;

impl PatternDetector for ShootingStarDetector {
    fn name(&self) -> &'static str {
        "CDLSHOOTINGSTAR"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let prev = candles.at(index.checked_sub(1)?)?;
        let bar = candles.at(index)?;
        let (body, range) = (bar.body(), bar.range());

        if !is_body_short(body, ctx.avg_body, range) {
            return None;
        }
        if !is_shadow_long(bar.upper_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.lower_shadow(), ctx.avg_range, range) {
            return None;
        }
        body_gap_up(&prev, &bar).then_some(BEARISH)
    }
}

// ============================================================
// BODY SHAPES
// ============================================================

/// CDLMARUBOZU - Marubozu: long body, no shadows to speak of
#[derive(Debug, Clone, Copy, Default)]
pub struct MarubozuDetector;

impl PatternDetector for MarubozuDetector {
    fn name(&self) -> &'static str {
        "CDLMARUBOZU"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        let matched = is_body_long(bar.body(), ctx.avg_body, range)
            && is_shadow_very_short(bar.upper_shadow(), ctx.avg_range, range)
            && is_shadow_very_short(bar.lower_shadow(), ctx.avg_range, range);
        matched.then(|| bar.color() * BULLISH)
    }
}

/// CDLCLOSINGMARUBOZU - Closing Marubozu: long body, no shadow on the closing end
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosingMarubozuDetector;

impl PatternDetector for ClosingMarubozuDetector {
    fn name(&self) -> &'static str {
        "CDLCLOSINGMARUBOZU"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        if !is_body_long(bar.body(), ctx.avg_body, range) {
            return None;
        }
        let closing_shadow = if bar.is_white() {
            bar.upper_shadow()
        } else {
            bar.lower_shadow()
        };
        is_shadow_very_short(closing_shadow, ctx.avg_range, range).then(|| bar.color() * BULLISH)
    }
}

/// CDLSPINNINGTOP - Spinning Top: small body, both shadows longer than it
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinningTopDetector;

impl PatternDetector for SpinningTopDetector {
    fn name(&self) -> &'static str {
        "CDLSPINNINGTOP"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let body = bar.body();

        let matched = is_body_short(body, ctx.avg_body, bar.range())
            && is_shadow_long(bar.upper_shadow(), body)
            && is_shadow_long(bar.lower_shadow(), body);
        matched.then(|| bar.color() * BULLISH)
    }
}

/// CDLHIGHWAVE - High-Wave: short body, both shadows very long
#[derive(Debug, Clone, Copy, Default)]
pub struct HighWaveDetector;

impl PatternDetector for HighWaveDetector {
    fn name(&self) -> &'static str {
        "CDLHIGHWAVE"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let body = bar.body();

        let matched = is_body_short(body, ctx.avg_body, bar.range())
            && is_shadow_verylong(bar.upper_shadow(), body)
            && is_shadow_verylong(bar.lower_shadow(), body);
        matched.then(|| bar.color() * BULLISH)
    }
}

/// CDLBELTHOLD - Belt-hold: long body opening on its extreme
#[derive(Debug, Clone, Copy, Default)]
pub struct BeltHoldDetector;

impl PatternDetector for BeltHoldDetector {
    fn name(&self) -> &'static str {
        "CDLBELTHOLD"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        if !is_body_long(bar.body(), ctx.avg_body, range) {
            return None;
        }
        // White opens on the low, black opens on the high
        let opening_shadow = if bar.is_white() {
            bar.lower_shadow()
        } else {
            bar.upper_shadow()
        };
        is_shadow_very_short(opening_shadow, ctx.avg_range, range).then(|| bar.color() * BULLISH)
    }
}

/// CDLLONGLINE - Long Line: long body, short shadows
#[derive(Debug, Clone, Copy, Default)]
pub struct LongLineDetector;

impl PatternDetector for LongLineDetector {
    fn name(&self) -> &'static str {
        "CDLLONGLINE"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        let matched = is_body_long(bar.body(), ctx.avg_body, range)
            && is_shadow_short(bar.upper_shadow(), ctx.avg_shadow, range)
            && is_shadow_short(bar.lower_shadow(), ctx.avg_shadow, range);
        matched.then(|| bar.color() * BULLISH)
    }
}

/// CDLSHORTLINE - Short Line: short body, short shadows
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortLineDetector;

impl PatternDetector for ShortLineDetector {
    fn name(&self) -> &'static str {
        "CDLSHORTLINE"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        let bar = candles.at(index)?;
        let range = bar.range();

        let matched = is_body_short(bar.body(), ctx.avg_body, range)
            && is_shadow_short(bar.upper_shadow(), ctx.avg_shadow, range)
            && is_shadow_short(bar.lower_shadow(), ctx.avg_shadow, range);
        matched.then(|| bar.color() * BULLISH)
    }
}

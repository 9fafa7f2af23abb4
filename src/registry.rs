//! The pattern detector set.
//!
//! Built-in detectors are dispatched through a macro-generated enum (no
//! vtable); user detectors plug in through the object-safe
//! [`SignalDetector`] trait. The set is fixed once built and always iterated
//! in the same order: built-ins in registry order, then custom detectors in
//! insertion order.

use std::collections::HashSet;
use std::fmt;

use crate::context::{compute_contexts, CandleContext};
use crate::detectors::*;
use crate::series::{CandleExt, Candles};
use crate::{Error, Result};

// ============================================================
// DETECTOR TRAITS
// ============================================================

/// Bar-at-a-time detector: decides whether its pattern completes at `index`.
///
/// Returns the TA-Lib style signal code (`100`, `-100`, occasionally `80`)
/// or `None` when the pattern is absent.
pub trait PatternDetector: Send + Sync {
    /// TA-Lib function name, e.g. `CDLDOJI`
    fn name(&self) -> &'static str;
    fn min_bars(&self) -> usize;
    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32>;
}

/// Whole-series detector: maps aligned OHLC columns to one signal per bar.
pub trait SignalDetector: Send + Sync {
    fn name(&self) -> &str;
    fn signals(&self, candles: &Candles) -> Vec<i32>;
}

/// Signature of a plain-function detector: `(opens, highs, lows, closes) -> signals`
pub type SignalFn = fn(&[f64], &[f64], &[f64], &[f64]) -> Vec<i32>;

/// A named plain function registered as a detector
#[derive(Debug, Clone)]
pub struct FnDetector {
    name: String,
    f: SignalFn,
}

impl FnDetector {
    pub fn new(name: impl Into<String>, f: SignalFn) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl SignalDetector for FnDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn signals(&self, candles: &Candles) -> Vec<i32> {
        (self.f)(candles.opens(), candles.highs(), candles.lows(), candles.closes())
    }
}

/// Run a bar-at-a-time detector over every bar.
///
/// Bars before `min_bars` and zero-range bars always get `0`.
pub fn scan_signals<D: PatternDetector + ?Sized>(
    detector: &D,
    candles: &Candles,
    contexts: &[CandleContext],
) -> Vec<i32> {
    let mut signals = vec![0; candles.len()];
    for (i, ctx) in contexts.iter().enumerate().take(candles.len()) {
        if i + 1 < detector.min_bars() {
            continue;
        }
        let Some(candle) = candles.at(i) else {
            break;
        };
        if candle.range() <= f64::EPSILON {
            continue;
        }
        if let Some(code) = detector.detect(candles, i, ctx) {
            signals[i] = code;
        }
    }
    signals
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect(
                &self,
                candles: &Candles,
                index: usize,
                ctx: &CandleContext,
            ) -> Option<i32> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, candles, index, ctx)),*
                }
            }

            #[inline]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(d) => PatternDetector::name(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Single bar (17)
    Doji(DojiDetector),
    DragonflyDoji(DragonflyDojiDetector),
    GravestoneDoji(GravestoneDojiDetector),
    LongLeggedDoji(LongLeggedDojiDetector),
    Takuri(TakuriDetector),
    RickshawMan(RickshawManDetector),
    Hammer(HammerDetector),
    HangingMan(HangingManDetector),
    InvertedHammer(InvertedHammerDetector),
    ShootingStar(ShootingStarDetector),
    Marubozu(MarubozuDetector),
    ClosingMarubozu(ClosingMarubozuDetector),
    SpinningTop(SpinningTopDetector),
    HighWave(HighWaveDetector),
    BeltHold(BeltHoldDetector),
    LongLine(LongLineDetector),
    ShortLine(ShortLineDetector),

    // Two bar (15)
    Engulfing(EngulfingDetector),
    Harami(HaramiDetector),
    HaramiCross(HaramiCrossDetector),
    Piercing(PiercingDetector),
    DarkCloudCover(DarkCloudCoverDetector),
    DojiStar(DojiStarDetector),
    Kicking(KickingDetector),
    KickingByLength(KickingByLengthDetector),
    MatchingLow(MatchingLowDetector),
    HomingPigeon(HomingPigeonDetector),
    Counterattack(CounterattackDetector),
    InNeck(InNeckDetector),
    OnNeck(OnNeckDetector),
    Thrusting(ThrustingDetector),
    SeparatingLines(SeparatingLinesDetector),

    // Three bar (21)
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
    ThreeInside(ThreeInsideDetector),
    ThreeOutside(ThreeOutsideDetector),
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    MorningDojiStar(MorningDojiStarDetector),
    EveningDojiStar(EveningDojiStarDetector),
    TwoCrows(TwoCrowsDetector),
    AbandonedBaby(AbandonedBabyDetector),
    ThreeStarsInSouth(ThreeStarsInSouthDetector),
    UniqueThreeRiver(UniqueThreeRiverDetector),
    StickSandwich(StickSandwichDetector),
    AdvanceBlock(AdvanceBlockDetector),
    StalledPattern(StalledPatternDetector),
    IdenticalThreeCrows(IdenticalThreeCrowsDetector),
    UpsideGapTwoCrows(UpsideGapTwoCrowsDetector),
    TasukiGap(TasukiGapDetector),
    XSideGapThreeMethods(XSideGapThreeMethodsDetector),
    GapSideSideWhite(GapSideSideWhiteDetector),
    Tristar(TristarDetector),

    // Multi-bar (8)
    ThreeLineStrike(ThreeLineStrikeDetector),
    RiseFallThreeMethods(RiseFallThreeMethodsDetector),
    MatHold(MatHoldDetector),
    Breakaway(BreakawayDetector),
    ConcealBabySwallow(ConcealBabySwallowDetector),
    LadderBottom(LadderBottomDetector),
    Hikkake(HikkakeDetector),
    HikkakeMod(HikkakeModDetector),
}

impl PatternDetector for BuiltinDetector {
    fn name(&self) -> &'static str {
        BuiltinDetector::name(self)
    }

    fn min_bars(&self) -> usize {
        BuiltinDetector::min_bars(self)
    }

    fn detect(&self, candles: &Candles, index: usize, ctx: &CandleContext) -> Option<i32> {
        BuiltinDetector::detect(self, candles, index, ctx)
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

fn single_bar_defaults() -> [BuiltinDetector; 17] {
    builtin_defaults![
        Doji,
        DragonflyDoji,
        GravestoneDoji,
        LongLeggedDoji,
        Takuri,
        RickshawMan,
        Hammer,
        HangingMan,
        InvertedHammer,
        ShootingStar,
        Marubozu,
        ClosingMarubozu,
        SpinningTop,
        HighWave,
        BeltHold,
        LongLine,
        ShortLine,
    ]
}

fn two_bar_defaults() -> [BuiltinDetector; 15] {
    builtin_defaults![
        Engulfing,
        Harami,
        HaramiCross,
        Piercing,
        DarkCloudCover,
        DojiStar,
        Kicking,
        KickingByLength,
        MatchingLow,
        HomingPigeon,
        Counterattack,
        InNeck,
        OnNeck,
        Thrusting,
        SeparatingLines,
    ]
}

fn three_bar_defaults() -> [BuiltinDetector; 21] {
    builtin_defaults![
        ThreeWhiteSoldiers,
        ThreeBlackCrows,
        ThreeInside,
        ThreeOutside,
        MorningStar,
        EveningStar,
        MorningDojiStar,
        EveningDojiStar,
        TwoCrows,
        AbandonedBaby,
        ThreeStarsInSouth,
        UniqueThreeRiver,
        StickSandwich,
        AdvanceBlock,
        StalledPattern,
        IdenticalThreeCrows,
        UpsideGapTwoCrows,
        TasukiGap,
        XSideGapThreeMethods,
        GapSideSideWhite,
        Tristar,
    ]
}

fn multi_bar_defaults() -> [BuiltinDetector; 8] {
    builtin_defaults![
        ThreeLineStrike,
        RiseFallThreeMethods,
        MatHold,
        Breakaway,
        ConcealBabySwallow,
        LadderBottom,
        Hikkake,
        HikkakeMod,
    ]
}

// ============================================================
// DETECTOR SET
// ============================================================

/// Per-bar signals of one detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSignals<'a> {
    pub name: &'a str,
    pub signals: Vec<i32>,
}

impl PatternSignals<'_> {
    /// Indices of bars where the pattern fired
    pub fn hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.signals
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s != 0)
            .map(|(i, _)| i)
    }
}

/// Fixed, ordered collection of pattern detectors
pub struct DetectorSet {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn SignalDetector>>,
}

impl fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorSet").field("names", &self.names()).finish()
    }
}

impl Default for DetectorSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl DetectorSet {
    /// Every builtin detector with default settings
    pub fn standard() -> Self {
        let mut builtin = Vec::new();
        builtin.extend(single_bar_defaults());
        builtin.extend(two_bar_defaults());
        builtin.extend(three_bar_defaults());
        builtin.extend(multi_bar_defaults());
        Self {
            builtin,
            custom: Vec::new(),
        }
    }

    pub fn builder() -> DetectorSetBuilder {
        DetectorSetBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detector names in iteration order
    pub fn names(&self) -> Vec<&str> {
        self.builtin
            .iter()
            .map(|d| d.name())
            .chain(self.custom.iter().map(|d| d.name()))
            .collect()
    }

    /// Run every detector over the full history, in iteration order.
    ///
    /// Fails if a custom detector returns a signal series whose length
    /// differs from the input.
    pub fn evaluate(&self, candles: &Candles) -> Result<Vec<PatternSignals<'_>>> {
        let contexts = compute_contexts(candles);
        let mut out = Vec::with_capacity(self.len());

        for detector in &self.builtin {
            out.push(PatternSignals {
                name: detector.name(),
                signals: scan_signals(detector, candles, &contexts),
            });
        }

        for detector in &self.custom {
            let signals = detector.signals(candles);
            if signals.len() != candles.len() {
                return Err(Error::InvalidValue(
                    "detector returned a signal series of the wrong length",
                ));
            }
            out.push(PatternSignals {
                name: detector.name(),
                signals,
            });
        }

        Ok(out)
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`DetectorSet`]
#[derive(Default)]
pub struct DetectorSetBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn SignalDetector>>,
    allow: Option<Vec<String>>,
}

impl DetectorSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
            .with_multi_bar_defaults()
    }

    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin.extend(single_bar_defaults());
        self
    }

    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(two_bar_defaults());
        self
    }

    pub fn with_three_bar_defaults(mut self) -> Self {
        self.builtin.extend(three_bar_defaults());
        self
    }

    pub fn with_multi_bar_defaults(mut self) -> Self {
        self.builtin.extend(multi_bar_defaults());
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add a custom whole-series detector
    pub fn add_custom<D: SignalDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Keep only the named patterns; registry order is preserved.
    pub fn only_patterns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Build the set. Duplicate names and unknown allow-list entries are rejected.
    pub fn build(self) -> Result<DetectorSet> {
        let mut seen = HashSet::new();
        let names = self
            .builtin
            .iter()
            .map(|d| d.name())
            .chain(self.custom.iter().map(|d| d.name()));
        for name in names {
            if !seen.insert(name.to_string()) {
                return Err(Error::InvalidConfig(format!("duplicate detector {name}")));
            }
        }

        let mut builtin = self.builtin;
        let mut custom = self.custom;

        if let Some(allow) = self.allow {
            if let Some(unknown) = allow.iter().find(|n| !seen.contains(n.as_str())) {
                return Err(Error::InvalidConfig(format!("unknown pattern {unknown}")));
            }
            builtin.retain(|d| allow.iter().any(|n| n == d.name()));
            custom.retain(|d| allow.iter().any(|n| n == d.name()));
        }

        Ok(DetectorSet { builtin, custom })
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    fn flat_then(last: Candle) -> Candles {
        let mut bars = vec![Candle::new(100.0, 102.0, 98.0, 101.0); 12];
        bars.push(last);
        bars.into_iter().collect()
    }

    fn always_on_last(_o: &[f64], _h: &[f64], _l: &[f64], c: &[f64]) -> Vec<i32> {
        let mut out = vec![0; c.len()];
        if let Some(last) = out.last_mut() {
            *last = 100;
        }
        out
    }

    fn wrong_length(_o: &[f64], _h: &[f64], _l: &[f64], _c: &[f64]) -> Vec<i32> {
        vec![0]
    }

    #[test]
    fn test_standard_set_size_and_order() {
        let set = DetectorSet::standard();
        assert_eq!(set.len(), 61);
        let names = set.names();
        assert_eq!(names[0], "CDLDOJI");
        assert_eq!(names[17], "CDLENGULFING");
        assert_eq!(names[32], "CDL3WHITESOLDIERS");
        assert_eq!(names[53], "CDL3LINESTRIKE");
        assert_eq!(*names.last().unwrap(), "CDLHIKKAKEMOD");
    }

    #[test]
    fn test_standard_names_unique() {
        let set = DetectorSet::standard();
        let names = set.names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_group_counts() {
        let single = DetectorSet::builder().with_single_bar_defaults().build().unwrap();
        let two = DetectorSet::builder().with_two_bar_defaults().build().unwrap();
        let three = DetectorSet::builder().with_three_bar_defaults().build().unwrap();
        let multi = DetectorSet::builder().with_multi_bar_defaults().build().unwrap();
        assert_eq!((single.len(), two.len(), three.len(), multi.len()), (17, 15, 21, 8));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = DetectorSet::builder()
            .with_single_bar_defaults()
            .add(BuiltinDetector::Doji(DojiDetector::default()))
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_only_patterns_keeps_registry_order() {
        let set = DetectorSet::builder()
            .with_all_defaults()
            .only_patterns(["CDLHAMMER", "CDLDOJI"])
            .build()
            .unwrap();
        assert_eq!(set.names(), vec!["CDLDOJI", "CDLHAMMER"]);
    }

    #[test]
    fn test_only_patterns_unknown_name() {
        let result = DetectorSet::builder()
            .with_all_defaults()
            .only_patterns(["CDLNOPE"])
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_evaluate_lengths_match() {
        let candles = flat_then(Candle::new(100.0, 110.0, 90.0, 100.0));
        let set = DetectorSet::standard();
        let signals = set.evaluate(&candles).unwrap();
        assert_eq!(signals.len(), set.len());
        assert!(signals.iter().all(|s| s.signals.len() == candles.len()));
    }

    #[test]
    fn test_doji_hit_on_last_bar() {
        let candles = flat_then(Candle::new(100.0, 110.0, 90.0, 100.0));
        let set = DetectorSet::builder()
            .add(BuiltinDetector::Doji(DojiDetector::default()))
            .build()
            .unwrap();
        let signals = set.evaluate(&candles).unwrap();
        assert_eq!(signals[0].hits().collect::<Vec<_>>(), vec![12]);
    }

    #[test]
    fn test_zero_range_bar_never_fires() {
        let candles = flat_then(Candle::new(100.0, 100.0, 100.0, 100.0));
        let set = DetectorSet::standard();
        let signals = set.evaluate(&candles).unwrap();
        assert!(signals.iter().all(|s| s.signals[12] == 0));
    }

    #[test]
    fn test_custom_fn_detector_runs_after_builtins() {
        let set = DetectorSet::builder()
            .add(BuiltinDetector::Doji(DojiDetector::default()))
            .add_custom(FnDetector::new("LAST_BAR", always_on_last))
            .build()
            .unwrap();
        assert_eq!(set.names(), vec!["CDLDOJI", "LAST_BAR"]);
        let candles = flat_then(Candle::new(100.0, 103.0, 97.0, 102.5));
        let signals = set.evaluate(&candles).unwrap();
        assert_eq!(signals[1].signals[12], 100);
    }

    #[test]
    fn test_custom_wrong_length_is_error() {
        let set = DetectorSet::builder()
            .add_custom(FnDetector::new("BROKEN", wrong_length))
            .build()
            .unwrap();
        let candles = flat_then(Candle::new(100.0, 103.0, 97.0, 102.5));
        assert!(matches!(set.evaluate(&candles), Err(Error::InvalidValue(_))));
    }
}

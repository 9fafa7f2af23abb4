//! # candlescan
//!
//! Daily candlestick pattern and trend screener.
//!
//! Given one instrument's daily OHLCV history, the [`InstrumentAnalyzer`]
//! runs a fixed, ordered set of candlestick pattern detectors over the whole
//! series, keeps the hits that fall inside a trailing calendar-day window,
//! computes a handful of trend indicators and folds everything into one
//! [`AnalysisResult`]. The [`BatchRunner`] does the same for a whole universe
//! of instruments in parallel.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlescan::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let bars: Vec<Bar> = (0..120)
//!     .map(|i| Bar {
//!         date: start + chrono::Duration::days(i),
//!         open: 100.0,
//!         high: 101.0,
//!         low: 99.0,
//!         close: 100.5,
//!         volume: 1_000,
//!     })
//!     .collect();
//! let series = OhlcvSeries::new(bars).unwrap();
//!
//! let analyzer = InstrumentAnalyzer::with_defaults();
//! let anchor = series.last().unwrap().date;
//! match analyzer.analyze("DEMO.NS", &series, anchor).unwrap() {
//!     Outcome::Analyzed(result) => println!("{:?}", result.momentum_trend),
//!     Outcome::Skipped(reason) => println!("skipped: {reason}"),
//! }
//! ```

pub mod analyzer;
pub mod batch;
pub mod config;
pub mod context;
pub mod data;
pub mod detectors;
pub mod indicators;
pub mod recency;
pub mod registry;
pub mod report;
pub mod series;
pub mod trend;

pub use analyzer::{AnalysisResult, AnalyzerConfig, InstrumentAnalyzer, Outcome, RecognizedPattern, SkipReason};
pub use batch::{BatchRunner, BatchSummary, InstrumentFailure, SkippedInstrument};
pub use registry::{BuiltinDetector, DetectorSet, DetectorSetBuilder, FnDetector, PatternDetector, PatternSignals, SignalDetector};
pub use series::{Bar, Candle, CandleExt, Candles, Candlestick, OhlcvSeries};
pub use trend::{TrendClassifier, TrendLabel};

pub mod prelude {
    pub use crate::{
        // Analysis
        analyzer::{AnalysisResult, AnalyzerConfig, InstrumentAnalyzer, Outcome, RecognizedPattern, SkipReason},
        // Batch
        batch::{BatchRunner, BatchSummary, InstrumentFailure, SkippedInstrument},
        // Context
        context::{compute_contexts, CandleContext},
        // External collaborators
        data::{DataError, DateRange, InMemoryProvider, MarketDataProvider, StaticUniverse, UniverseProvider},
        // Detectors
        detectors::*,
        // Indicators
        indicators::{
            convergence_indicator, momentum_oscillator, moving_average, volume_accumulation,
            weighted_moving_average, Convergence, IndicatorSeries,
        },
        recency::select_recent,
        registry::{BuiltinDetector, DetectorSet, DetectorSetBuilder, FnDetector, PatternDetector, PatternSignals, SignalDetector},
        report::{CsvReportWriter, ReportWriter},
        // Types
        series::{Bar, Candle, CandleExt, Candles, Candlestick, OhlcvSeries},
        trend::{TrendClassifier, TrendLabel},
        // Errors
        Error,
        Period,
        Result,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the analysis core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Insufficient history: need {need} bars, got {got}")]
    InsufficientHistory { need: usize, got: usize },

    #[error("Malformed series at index {index}: {reason}")]
    MalformedSeries { index: usize, reason: &'static str },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for the "not enough bars" family, which callers treat as a skip.
    #[inline]
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, Error::InsufficientHistory { .. })
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Indicator lookback period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(Error::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// TESTS
// ============================================================

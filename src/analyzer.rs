//! Per-instrument analysis: patterns, trend labels and indicator readings.
//!
//! [`InstrumentAnalyzer::analyze`] is pure with respect to its inputs: the
//! anchor date is passed in, detectors and thresholds are fixed at
//! construction, and nothing is shared between calls. Running it twice on
//! the same series and anchor yields identical output.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{
    convergence_indicator, momentum_oscillator, moving_average, volume_accumulation,
    weighted_moving_average, IndicatorSeries,
};
use crate::recency::{select_recent, DEFAULT_WINDOW_DAYS};
use crate::registry::DetectorSet;
use crate::series::OhlcvSeries;
use crate::trend::{TrendClassifier, TrendLabel};
use crate::{Error, Period, Result};

// ============================================================
// CONFIG
// ============================================================

/// Analysis knobs. Defaults reproduce the screener's fixed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Series shorter than this are skipped before any indicator runs
    pub min_bars: usize,
    /// Recency window in calendar days
    pub recency_days: u32,
    pub ma_period: usize,
    pub wma_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub overbought: f64,
    pub oversold: f64,
    /// Optional allow-list of detector names
    pub patterns: Option<Vec<String>>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_bars: 90,
            recency_days: DEFAULT_WINDOW_DAYS,
            ma_period: 14,
            wma_period: 14,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            overbought: 70.0,
            oversold: 30.0,
            patterns: None,
        }
    }
}

impl AnalyzerConfig {
    /// Bars needed by the longest configured indicator lookback
    pub fn required_bars(&self) -> usize {
        [
            self.ma_period,
            self.wma_period,
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal.saturating_sub(1),
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
    }

    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("ma_period", self.ma_period),
            ("wma_period", self.wma_period),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(Error::InvalidConfig(format!("{name} must be > 0")));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(Error::InvalidConfig(format!(
                "macd_fast ({}) must be less than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        TrendClassifier::new(self.overbought, self.oversold)?;
        let required = self.required_bars();
        if self.min_bars < required {
            return Err(Error::InvalidConfig(format!(
                "min_bars ({}) is below the longest indicator lookback ({required})",
                self.min_bars
            )));
        }
        Ok(())
    }
}

// ============================================================
// OUTPUT TYPES
// ============================================================

/// A detector hit that survived the recency window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedPattern {
    pub name: String,
    pub date: NaiveDate,
}

/// Result for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    /// Detector names, one per recent firing, in detector order
    pub patterns: Vec<String>,
    pub momentum_trend: TrendLabel,
    pub convergence_trend: TrendLabel,
    pub moving_average: f64,
    pub weighted_moving_average: f64,
    pub volume_accumulation: f64,
}

/// Why an instrument produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    InsufficientHistory { need: usize, got: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientHistory { need, got } => {
                write!(f, "insufficient history: need {need} bars, got {got}")
            }
        }
    }
}

/// Either a result or an explicit reason for skipping
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Analyzed(AnalysisResult),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Outcome::Analyzed(r) => Some(r),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            Outcome::Analyzed(r) => Some(r),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

// ============================================================
// ANALYZER
// ============================================================

/// Runs the detector set, recency window, indicators and classifier over
/// one instrument.
#[derive(Debug)]
pub struct InstrumentAnalyzer {
    detectors: DetectorSet,
    config: AnalyzerConfig,
    classifier: TrendClassifier,
}

impl InstrumentAnalyzer {
    /// Standard detector set, narrowed by `config.patterns` if given
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let mut builder = DetectorSet::builder().with_all_defaults();
        if let Some(names) = &config.patterns {
            builder = builder.only_patterns(names.iter().cloned());
        }
        Self::with_detectors(config, builder.build()?)
    }

    pub fn with_detectors(config: AnalyzerConfig, detectors: DetectorSet) -> Result<Self> {
        config.validate()?;
        let classifier = TrendClassifier::new(config.overbought, config.oversold)?;
        Ok(Self {
            detectors,
            config,
            classifier,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            detectors: DetectorSet::standard(),
            config: AnalyzerConfig::default(),
            classifier: TrendClassifier::default(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn detectors(&self) -> &DetectorSet {
        &self.detectors
    }

    /// Recent detector hits, in detector order then bar order
    pub fn recognize(&self, series: &OhlcvSeries, anchor: NaiveDate) -> Result<Vec<RecognizedPattern>> {
        let candles = series.candles();
        let dates = series.dates();
        let mut hits = Vec::new();

        for signals in self.detectors.evaluate(&candles)? {
            for date in select_recent(&signals.signals, &dates, self.config.recency_days, anchor) {
                hits.push(RecognizedPattern {
                    name: signals.name.to_string(),
                    date,
                });
            }
        }
        Ok(hits)
    }

    /// Analyze one instrument.
    ///
    /// Too-short history is a [`Outcome::Skipped`], not an error. A series
    /// whose indicator readings are not finite fails with
    /// [`Error::MalformedSeries`].
    pub fn analyze(&self, symbol: &str, series: &OhlcvSeries, anchor: NaiveDate) -> Result<Outcome> {
        self.analyze_with_hits(symbol, series, anchor)
            .map(|(outcome, _)| outcome)
    }

    /// Like [`analyze`](Self::analyze), also returning the dated hits the
    /// pattern column was built from. Skipped instruments have no hits.
    pub fn analyze_with_hits(
        &self,
        symbol: &str,
        series: &OhlcvSeries,
        anchor: NaiveDate,
    ) -> Result<(Outcome, Vec<RecognizedPattern>)> {
        if series.len() < self.config.min_bars {
            let reason = SkipReason::InsufficientHistory {
                need: self.config.min_bars,
                got: series.len(),
            };
            debug!(symbol, %reason, "skipping instrument");
            return Ok((Outcome::Skipped(reason), Vec::new()));
        }

        let hits = self.recognize(series, anchor)?;
        match self.compute(symbol, series, &hits) {
            Ok(result) => {
                debug!(symbol, patterns = result.patterns.len(), "instrument analysed");
                Ok((Outcome::Analyzed(result), hits))
            }
            Err(Error::InsufficientHistory { need, got }) => {
                let reason = SkipReason::InsufficientHistory { need, got };
                debug!(symbol, %reason, "skipping instrument");
                Ok((Outcome::Skipped(reason), Vec::new()))
            }
            Err(e) => Err(e),
        }
    }

    fn compute(
        &self,
        symbol: &str,
        series: &OhlcvSeries,
        hits: &[RecognizedPattern],
    ) -> Result<AnalysisResult> {
        let cfg = &self.config;
        let patterns = hits.iter().map(|p| p.name.clone()).collect();

        let closes = series.closes();
        let volumes = series.volumes();

        let momentum = momentum_oscillator(&closes, Period::new(cfg.rsi_period)?)?;
        let convergence = convergence_indicator(
            &closes,
            Period::new(cfg.macd_fast)?,
            Period::new(cfg.macd_slow)?,
            Period::new(cfg.macd_signal)?,
        )?;
        let momentum_trend = self.classifier.momentum(&momentum)?;
        let convergence_trend = self.classifier.convergence(&convergence)?;

        let ma = moving_average(&closes, Period::new(cfg.ma_period)?)?;
        let wma = weighted_moving_average(&closes, Period::new(cfg.wma_period)?)?;
        let obv = volume_accumulation(&closes, &volumes)?;

        Ok(AnalysisResult {
            symbol: symbol.to_string(),
            patterns,
            momentum_trend,
            convergence_trend,
            moving_average: latest_value(&ma)?,
            weighted_moving_average: latest_value(&wma)?,
            volume_accumulation: latest_value(&obv)?,
        })
    }
}

fn latest_value(series: &IndicatorSeries) -> Result<f64> {
    series.latest_defined().ok_or(Error::InsufficientHistory {
        need: 1,
        got: 0,
    })
}

//! Daily bars, validated bar series and the columnar candle view the
//! pattern detectors run on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================
// CANDLESTICK TRAITS
// ============================================================

/// Anything with an open, high, low and close price
pub trait Candlestick {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
}

/// Extension trait with computed candle geometry
pub trait CandleExt: Candlestick {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    /// TA-Lib candle colour: close >= open is white
    #[inline]
    fn is_white(&self) -> bool {
        self.close() >= self.open()
    }

    #[inline]
    fn is_black(&self) -> bool {
        self.close() < self.open()
    }

    /// +1 for white, -1 for black
    #[inline]
    fn color(&self) -> i32 {
        if self.is_white() {
            1
        } else {
            -1
        }
    }
}

impl<T: Candlestick> CandleExt for T {}

// ============================================================
// BAR / SERIES
// ============================================================

/// One trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candlestick for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

impl Bar {
    fn validate(&self, index: usize) -> Result<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(Error::MalformedSeries {
                index,
                reason: "non-finite price",
            });
        }
        if self.high < self.low {
            return Err(Error::MalformedSeries {
                index,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

/// Ordered daily history of one instrument.
///
/// Dates are strictly increasing and every price is finite; both are checked
/// once at construction and the series is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate(i)?;
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(Error::MalformedSeries {
                    index: i,
                    reason: "dates not strictly increasing",
                });
            }
        }
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Columnar OHLC view for the detectors
    pub fn candles(&self) -> Candles {
        let mut candles = Candles::with_capacity(self.bars.len());
        for bar in &self.bars {
            candles.push(bar.open, bar.high, bar.low, bar.close);
        }
        candles
    }
}

// ============================================================
// COLUMNAR CANDLES
// ============================================================

/// A single candle read out of [`Candles`]. Copy, no allocations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }
}

impl Candlestick for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// Aligned open/high/low/close columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candles {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
}

impl Candles {
    /// Build from four columns; they must all have the same length.
    pub fn new(open: Vec<f64>, high: Vec<f64>, low: Vec<f64>, close: Vec<f64>) -> Result<Self> {
        let n = open.len();
        if high.len() != n || low.len() != n || close.len() != n {
            return Err(Error::InvalidValue("OHLC columns must have equal length"));
        }
        Ok(Self {
            open,
            high,
            low,
            close,
        })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            open: Vec::with_capacity(capacity),
            high: Vec::with_capacity(capacity),
            low: Vec::with_capacity(capacity),
            close: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, open: f64, high: f64, low: f64, close: f64) {
        self.open.push(open);
        self.high.push(high);
        self.low.push(low);
        self.close.push(close);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    #[inline]
    pub fn at(&self, index: usize) -> Option<Candle> {
        Some(Candle {
            open: *self.open.get(index)?,
            high: *self.high.get(index)?,
            low: *self.low.get(index)?,
            close: *self.close.get(index)?,
        })
    }

    pub fn opens(&self) -> &[f64] {
        &self.open
    }

    pub fn highs(&self) -> &[f64] {
        &self.high
    }

    pub fn lows(&self) -> &[f64] {
        &self.low
    }

    pub fn closes(&self) -> &[f64] {
        &self.close
    }

    pub fn iter(&self) -> impl Iterator<Item = Candle> + '_ {
        (0..self.len()).filter_map(move |i| self.at(i))
    }
}

impl FromIterator<Candle> for Candles {
    fn from_iter<I: IntoIterator<Item = Candle>>(iter: I) -> Self {
        let mut candles = Candles::default();
        for c in iter {
            candles.push(c.open, c.high, c.low, c.close);
        }
        candles
    }
}

// ============================================================
// TESTS
// ============================================================

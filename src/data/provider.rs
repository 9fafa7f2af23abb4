//! Market data and universe provider traits, with their error type.
//!
//! Providers sit outside the analysis core: they resolve network or disk
//! access into a validated [`OhlcvSeries`] (or a symbol list) and report
//! everything else as a [`DataError`]. The batch runner treats every
//! `DataError` the same way: the instrument is skipped and the scan goes on.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::series::OhlcvSeries;

/// Errors from data sources.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Malformed(#[from] crate::Error),
}

/// Inclusive calendar date range of requested history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        if start > end {
            return Err(crate::Error::InvalidValue("date range start is after its end"));
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Source of daily OHLCV history.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `range`.
    fn fetch(&self, symbol: &str, range: DateRange) -> Result<OhlcvSeries, DataError>;
}

/// Source of the instrument identifiers to scan.
pub trait UniverseProvider {
    /// Final, filtered symbol list in scan order
    fn symbols(&self) -> Result<Vec<String>, DataError>;
}

/// Fixed series keyed by symbol. Bars outside the requested range are dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, OhlcvSeries>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, series: OhlcvSeries) -> Self {
        self.series.insert(symbol.into(), series);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, series: OhlcvSeries) {
        self.series.insert(symbol.into(), series);
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn fetch(&self, symbol: &str, range: DateRange) -> Result<OhlcvSeries, DataError> {
        let series = self.series.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        let bars = series
            .bars()
            .iter()
            .filter(|b| range.contains(b.date))
            .copied()
            .collect();
        Ok(OhlcvSeries::new(bars)?)
    }
}

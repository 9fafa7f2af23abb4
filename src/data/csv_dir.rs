//! Offline provider reading `<dir>/<SYMBOL>.csv` files.
//!
//! Expected header: `Date,Open,High,Low,Close,Volume`; extra columns (such
//! as `Adj Close`) are ignored. The date column may carry a time suffix,
//! only its first ten characters are read. Rows with an empty or
//! unparseable value are dropped.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DateRange, MarketDataProvider};
use crate::series::{Bar, OhlcvSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(rename = "Volume", deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

impl CsvRow {
    fn into_bar(self) -> Option<Bar> {
        let date = NaiveDate::parse_from_str(self.date.get(..10).unwrap_or(&self.date), "%Y-%m-%d").ok()?;
        let volume = self.volume?;
        if !(volume.is_finite() && volume >= 0.0) {
            return None;
        }
        Some(Bar {
            date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: volume.round() as u64,
        })
    }
}

/// Reads one CSV file per symbol from a directory.
#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| match e.kind() {
            csv::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                DataError::Io(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
            }
            _ => DataError::Parse(e.to_string()),
        })?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;
            if let Some(bar) = row.into_bar() {
                bars.push(bar);
            }
        }
        Ok(bars)
    }
}

impl MarketDataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(&self, symbol: &str, range: DateRange) -> Result<OhlcvSeries, DataError> {
        let path = self.path_for(symbol);
        let mut bars = match Self::read_bars(&path) {
            Err(DataError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            other => other?,
        };
        bars.retain(|b| range.contains(b.date));
        bars.sort_by_key(|b| b.date);
        Ok(OhlcvSeries::new(bars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_reads_and_drops_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("ABC.NS.csv")).unwrap();
        writeln!(f, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
        writeln!(f, "2024-01-02,10,11,9,10.5,10.5,1000").unwrap();
        writeln!(f, "2024-01-03,10.5,,10,11,11,1200").unwrap();
        writeln!(f, "2024-01-04 00:00:00+05:30,11,12,10.5,11.5,11.5,900").unwrap();
        writeln!(f, "2023-12-29,9,10,8,9.5,9.5,800").unwrap();
        drop(f);

        let provider = CsvDirProvider::new(dir.path());
        let series = provider.fetch("ABC.NS", range()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.5, 11.5]);
        assert_eq!(series.bars()[1].volume, 900);
    }

    #[test]
    fn test_missing_file_is_symbol_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvDirProvider::new(dir.path());
        let err = provider.fetch("NOPE.NS", range()).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }
}

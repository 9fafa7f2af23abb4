//! Instrument universe: which symbols get scanned.
//!
//! The usual source is a broker instrument dump (CSV with at least the
//! `tradingsymbol` and `segment` columns), read from disk or fetched over
//! HTTP. Rows are kept for one segment, symbols with an excluded suffix are
//! dropped and the exchange suffix is appended, so `RELIANCE` in segment
//! `NSE` becomes `RELIANCE.NS`.

use std::collections::HashSet;
use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::provider::{DataError, UniverseProvider};

/// Default instrument dump location
pub const DEFAULT_INSTRUMENTS_URL: &str = "https://api.kite.trade/instruments";

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    tradingsymbol: String,
    segment: String,
}

/// Segment and suffix rules applied to the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseFilter {
    pub segment: String,
    pub exclude_suffixes: Vec<String>,
    pub symbol_suffix: String,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self {
            segment: "NSE".into(),
            exclude_suffixes: vec!["-SG".into()],
            symbol_suffix: ".NS".into(),
        }
    }
}

impl UniverseFilter {
    /// Provider symbol for a dump row, or `None` if the row is filtered out
    pub fn apply(&self, tradingsymbol: &str, segment: &str) -> Option<String> {
        if segment != self.segment {
            return None;
        }
        let symbol = tradingsymbol.trim();
        if symbol.is_empty() || self.exclude_suffixes.iter().any(|s| symbol.ends_with(s.as_str())) {
            return None;
        }
        Some(format!("{symbol}{}", self.symbol_suffix))
    }
}

/// Parse an instrument dump, keeping first occurrences in file order.
pub fn parse_instruments<R: Read>(reader: R, filter: &UniverseFilter) -> Result<Vec<String>, DataError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for row in rdr.deserialize::<InstrumentRow>() {
        let row = row.map_err(|e| DataError::Parse(format!("instrument dump: {e}")))?;
        if let Some(symbol) = filter.apply(&row.tradingsymbol, &row.segment) {
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }
    }
    Ok(symbols)
}

/// Universe read from an instrument dump at a path or http(s) URL
#[derive(Debug, Clone)]
pub struct DumpUniverse {
    source: String,
    filter: UniverseFilter,
}

impl DumpUniverse {
    pub fn new(source: impl Into<String>, filter: UniverseFilter) -> Self {
        Self {
            source: source.into(),
            filter,
        }
    }

    fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    fn fetch_remote(&self) -> Result<Vec<String>, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DataError::Network(e.to_string()))?;
        let resp = client
            .get(&self.source)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} fetching {}",
                resp.status(),
                self.source
            )));
        }
        let body = resp.bytes().map_err(|e| DataError::Network(e.to_string()))?;
        parse_instruments(&body[..], &self.filter)
    }
}

impl UniverseProvider for DumpUniverse {
    fn symbols(&self) -> Result<Vec<String>, DataError> {
        let symbols = if self.is_remote() {
            self.fetch_remote()?
        } else {
            let file = std::fs::File::open(&self.source)?;
            parse_instruments(file, &self.filter)?
        };
        info!(source = %self.source, count = symbols.len(), "universe loaded");
        Ok(symbols)
    }
}

/// Explicit symbol list, used as-is
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

impl UniverseProvider for StaticUniverse {
    fn symbols(&self) -> Result<Vec<String>, DataError> {
        Ok(self.symbols.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange
1,1,RELIANCE,RELIANCE INDUSTRIES,0,,0,0.05,1,EQ,NSE,NSE
2,2,GOLDBOND-SG,SGB,0,,0,0.01,1,EQ,NSE,NSE
3,3,NIFTY24JANFUT,,0,2024-01-25,0,0.05,50,FUT,NFO-FUT,NFO
4,4,TCS,TATA CONSULTANCY,0,,0,0.05,1,EQ,NSE,NSE
5,5,RELIANCE,RELIANCE INDUSTRIES,0,,0,0.05,1,EQ,NSE,NSE
6,6,INFY,INFOSYS,0,,0,0.05,1,EQ,BSE,BSE
";

    #[test]
    fn test_filter_segment_suffix_and_dedupe() {
        let symbols = parse_instruments(DUMP.as_bytes(), &UniverseFilter::default()).unwrap();
        assert_eq!(symbols, vec!["RELIANCE.NS", "TCS.NS"]);
    }

    #[test]
    fn test_custom_segment() {
        let filter = UniverseFilter {
            segment: "BSE".into(),
            exclude_suffixes: Vec::new(),
            symbol_suffix: ".BO".into(),
        };
        let symbols = parse_instruments(DUMP.as_bytes(), &filter).unwrap();
        assert_eq!(symbols, vec!["INFY.BO"]);
    }

    #[test]
    fn test_dump_universe_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instruments.csv");
        std::fs::write(&path, DUMP).unwrap();
        let universe = DumpUniverse::new(path.to_string_lossy(), UniverseFilter::default());
        assert_eq!(universe.symbols().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_columns_is_parse_error() {
        let err = parse_instruments("name,segment\nX,NSE\n".as_bytes(), &UniverseFilter::default());
        assert!(matches!(err, Err(DataError::Parse(_))));
    }
}

//! Universe-wide scan: fetch, analyze and collect per instrument, in parallel.
//!
//! One instrument's failure never aborts the batch. Fetch errors and
//! malformed series are recorded as failures, short histories as skips, and
//! every successful analysis becomes one result row. All three lists keep
//! universe order.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analyzer::{AnalysisResult, InstrumentAnalyzer, Outcome, SkipReason};
use crate::data::{DateRange, MarketDataProvider};

/// An instrument skipped for lack of history
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: SkipReason,
}

/// An instrument whose fetch or analysis failed
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentFailure {
    pub symbol: String,
    pub reason: String,
}

/// Aggregate of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedInstrument>,
    pub failed: Vec<InstrumentFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len() + self.failed.len()
    }
}

enum Processed {
    Done(AnalysisResult),
    Skipped(SkippedInstrument),
    Failed(InstrumentFailure),
}

/// Runs the analyzer over a universe with a shared provider and anchor date
pub struct BatchRunner<'a> {
    analyzer: &'a InstrumentAnalyzer,
    provider: &'a dyn MarketDataProvider,
    range: DateRange,
    anchor: NaiveDate,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        analyzer: &'a InstrumentAnalyzer,
        provider: &'a dyn MarketDataProvider,
        range: DateRange,
        anchor: NaiveDate,
    ) -> Self {
        Self {
            analyzer,
            provider,
            range,
            anchor,
        }
    }

    /// Scan every symbol on the current rayon pool.
    pub fn run(&self, symbols: &[String]) -> BatchSummary {
        info!(
            instruments = symbols.len(),
            provider = self.provider.name(),
            anchor = %self.anchor,
            "scan started"
        );

        let processed: Vec<Processed> = symbols.par_iter().map(|s| self.process(s)).collect();

        let mut summary = BatchSummary::default();
        for item in processed {
            match item {
                Processed::Done(r) => summary.results.push(r),
                Processed::Skipped(s) => summary.skipped.push(s),
                Processed::Failed(f) => summary.failed.push(f),
            }
        }

        info!(
            analysed = summary.results.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "scan finished"
        );
        summary
    }

    fn process(&self, symbol: &str) -> Processed {
        let series = match self.provider.fetch(symbol, self.range) {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol, error = %e, "fetch failed");
                return Processed::Failed(InstrumentFailure {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        debug!(symbol, bars = series.len(), "fetched");

        match self.analyzer.analyze(symbol, &series, self.anchor) {
            Ok(Outcome::Analyzed(result)) => Processed::Done(result),
            Ok(Outcome::Skipped(reason)) => Processed::Skipped(SkippedInstrument {
                symbol: symbol.to_string(),
                reason,
            }),
            Err(e) => {
                warn!(symbol, error = %e, "analysis failed");
                Processed::Failed(InstrumentFailure {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

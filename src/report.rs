//! Tabular scan report.
//!
//! One row per analysed instrument. The pattern list is written as a JSON
//! array so that names survive the round trip through a single CSV cell.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::analyzer::AnalysisResult;

pub const HEADER: [&str; 7] = [
    "Symbol",
    "Recognised Pattern Names",
    "Momentum Trend",
    "Convergence Trend",
    "Moving Average",
    "Weighted Moving Average",
    "Volume Accumulation",
];

/// Errors while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sink for analysis results
pub trait ReportWriter {
    fn write_all(&mut self, results: &[AnalysisResult]) -> Result<(), ReportError>;
}

/// CSV report with the fixed column set.
///
/// The header goes out with the first `write_all`; later calls append rows.
pub struct CsvReportWriter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvReportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W, ReportError> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}

impl CsvReportWriter<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> ReportWriter for CsvReportWriter<W> {
    fn write_all(&mut self, results: &[AnalysisResult]) -> Result<(), ReportError> {
        if !self.header_written {
            self.writer.write_record(HEADER)?;
            self.header_written = true;
        }
        for r in results {
            let patterns = serde_json::to_string(&r.patterns)?;
            let ma = r.moving_average.to_string();
            let wma = r.weighted_moving_average.to_string();
            let obv = r.volume_accumulation.to_string();
            self.writer.write_record([
                r.symbol.as_str(),
                patterns.as_str(),
                r.momentum_trend.as_str(),
                r.convergence_trend.as_str(),
                ma.as_str(),
                wma.as_str(),
                obv.as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

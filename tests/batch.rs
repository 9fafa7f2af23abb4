//! Universe scans through in-memory and on-disk providers, down to the report.

use std::io::Write;

use candlescan::data::CsvDirProvider;
use candlescan::prelude::*;
use chrono::NaiveDate;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

fn rising(n: usize) -> OhlcvSeries {
    let bars = (0..n)
        .map(|i| {
            let c = 100.0 + i as f64;
            Bar {
                date: day(i),
                open: c - 0.5,
                high: c + 1.0,
                low: c - 1.5,
                close: c,
                volume: 500,
            }
        })
        .collect();
    OhlcvSeries::new(bars).unwrap()
}

fn full_range() -> DateRange {
    DateRange::new(day(0), day(400)).unwrap()
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_batch_partitions_outcomes() {
    let provider = InMemoryProvider::new()
        .with_series("AAA.NS", rising(120))
        .with_series("BBB.NS", rising(50))
        .with_series("DDD.NS", rising(95));
    let analyzer = InstrumentAnalyzer::with_defaults();
    let runner = BatchRunner::new(&analyzer, &provider, full_range(), day(119));

    let summary = runner.run(&symbols(&["AAA.NS", "BBB.NS", "CCC.NS", "DDD.NS"]));

    assert_eq!(summary.total(), 4);
    let analysed: Vec<_> = summary.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(analysed, vec!["AAA.NS", "DDD.NS"]);

    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].symbol, "BBB.NS");
    assert_eq!(
        summary.skipped[0].reason,
        SkipReason::InsufficientHistory { need: 90, got: 50 }
    );

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].symbol, "CCC.NS");
    assert!(summary.failed[0].reason.contains("CCC.NS"));
}

#[test]
fn test_batch_matches_single_analysis() {
    let provider = InMemoryProvider::new().with_series("AAA.NS", rising(120));
    let analyzer = InstrumentAnalyzer::with_defaults();
    let anchor = day(119);

    let summary = BatchRunner::new(&analyzer, &provider, full_range(), anchor).run(&symbols(&["AAA.NS"]));
    let direct = analyzer
        .analyze("AAA.NS", &rising(120), anchor)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(summary.results, vec![direct]);
}

#[test]
fn test_range_clipping_can_cause_skip() {
    let provider = InMemoryProvider::new().with_series("AAA.NS", rising(120));
    let analyzer = InstrumentAnalyzer::with_defaults();
    let range = DateRange::new(day(60), day(400)).unwrap();

    let summary = BatchRunner::new(&analyzer, &provider, range, day(119)).run(&symbols(&["AAA.NS"]));
    assert!(summary.results.is_empty());
    assert_eq!(
        summary.skipped[0].reason,
        SkipReason::InsufficientHistory { need: 90, got: 60 }
    );
}

#[test]
fn test_empty_universe() {
    let provider = InMemoryProvider::new();
    let analyzer = InstrumentAnalyzer::with_defaults();
    let summary = BatchRunner::new(&analyzer, &provider, full_range(), day(0)).run(&[]);
    assert_eq!(summary, BatchSummary::default());
}

#[test]
fn test_static_universe_to_report() {
    let provider = InMemoryProvider::new()
        .with_series("AAA.NS", rising(120))
        .with_series("EEE.NS", rising(100));
    let universe = StaticUniverse::new(["AAA.NS", "EEE.NS"]);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let summary = BatchRunner::new(&analyzer, &provider, full_range(), day(119))
        .run(&universe.symbols().unwrap());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis_data.csv");
    let mut writer = CsvReportWriter::from_path(&path).unwrap();
    writer.write_all(&summary.results).unwrap();
    drop(writer);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers[0], "Symbol");
    assert_eq!(headers[1], "Recognised Pattern Names");
    assert_eq!(headers.len(), 7);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "AAA.NS");
    assert_eq!(&rows[1][0], "EEE.NS");
    assert_eq!(&rows[0][2], "UP");

    let patterns: Vec<String> = serde_json::from_str(&rows[0][1]).unwrap();
    assert_eq!(patterns, summary.results[0].patterns);
}

#[test]
fn test_csv_directory_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = std::fs::File::create(dir.path().join("AAA.NS.csv")).unwrap();
    writeln!(f, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    for bar in rising(100).bars() {
        writeln!(
            f,
            "{},{},{},{},{},{},{}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.close, bar.volume
        )
        .unwrap();
    }
    drop(f);

    let provider = CsvDirProvider::new(dir.path());
    let analyzer = InstrumentAnalyzer::with_defaults();
    let summary = BatchRunner::new(&analyzer, &provider, full_range(), day(99))
        .run(&symbols(&["AAA.NS", "MISSING.NS"]));

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].symbol, "AAA.NS");
    assert!((summary.results[0].moving_average - 192.5).abs() < 1e-9);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].symbol, "MISSING.NS");
}

//! End-to-end behaviour of `InstrumentAnalyzer::analyze`.

use candlescan::prelude::*;
use chrono::NaiveDate;

const EPS: f64 = 1e-9;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// Series with the given closes; opens trail by a little so bars have range.
fn series_from_closes(closes: &[f64]) -> OhlcvSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let o = if i == 0 { c } else { closes[i - 1] };
            Bar {
                date: day(i),
                open: o,
                high: o.max(c) + 1.0,
                low: o.min(c) - 1.0,
                close: c,
                volume: 1_000 + i as u64,
            }
        })
        .collect();
    OhlcvSeries::new(bars).unwrap()
}

fn flat(n: usize) -> OhlcvSeries {
    let bars = (0..n)
        .map(|i| Bar {
            date: day(i),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 1_000,
        })
        .collect();
    OhlcvSeries::new(bars).unwrap()
}

/// Small white candles followed by `dojis` doji bars on consecutive days
fn with_trailing_dojis(n: usize, dojis: usize) -> OhlcvSeries {
    let bars = (0..n + dojis)
        .map(|i| {
            let (o, h, l, c) = if i < n {
                (100.0, 101.5, 99.5, 101.0)
            } else {
                (101.0, 103.0, 99.0, 101.05)
            };
            Bar {
                date: day(i),
                open: o,
                high: h,
                low: l,
                close: c,
                volume: 1_000,
            }
        })
        .collect();
    OhlcvSeries::new(bars).unwrap()
}

fn analyzed(outcome: Outcome) -> AnalysisResult {
    match outcome {
        Outcome::Analyzed(r) => r,
        Outcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
    }
}

fn last_date(series: &OhlcvSeries) -> NaiveDate {
    series.last().unwrap().date
}

// ============================================================
// SKIPS
// ============================================================

#[test]
fn test_short_history_is_skipped() {
    let analyzer = InstrumentAnalyzer::with_defaults();
    let series = flat(89);
    let outcome = analyzer.analyze("SHORT.NS", &series, last_date(&series)).unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::InsufficientHistory { need: 90, got: 89 })
    );
}

#[test]
fn test_empty_history_is_skipped() {
    let analyzer = InstrumentAnalyzer::with_defaults();
    let series = OhlcvSeries::new(Vec::new()).unwrap();
    let outcome = analyzer.analyze("EMPTY.NS", &series, day(0)).unwrap();
    assert!(outcome.is_skipped());
}

#[test]
fn test_exactly_min_bars_is_analyzed() {
    let analyzer = InstrumentAnalyzer::with_defaults();
    let series = flat(90);
    let outcome = analyzer.analyze("EXACT.NS", &series, last_date(&series)).unwrap();
    assert!(!outcome.is_skipped());
}

#[test]
fn test_lower_min_bars_still_guards_indicators() {
    let config = AnalyzerConfig {
        min_bars: 34,
        ..Default::default()
    };
    let analyzer = InstrumentAnalyzer::new(config).unwrap();
    let series = flat(34);
    assert!(!analyzer
        .analyze("X.NS", &series, last_date(&series))
        .unwrap()
        .is_skipped());
}

// ============================================================
// READINGS
// ============================================================

#[test]
fn test_flat_series() {
    let analyzer = InstrumentAnalyzer::with_defaults();
    let series = flat(100);
    let result = analyzed(analyzer.analyze("FLAT.NS", &series, last_date(&series)).unwrap());

    assert_eq!(result.symbol, "FLAT.NS");
    assert!(result.patterns.is_empty());
    assert_eq!(result.momentum_trend, TrendLabel::Sideways);
    assert_eq!(result.convergence_trend, TrendLabel::Sideways);
    assert!((result.moving_average - 100.0).abs() < EPS);
    assert!((result.weighted_moving_average - 100.0).abs() < EPS);
    assert_eq!(result.volume_accumulation, 0.0);
}

#[test]
fn test_accelerating_rise_is_up() {
    let closes: Vec<f64> = (0..120).map(|i| 100.0 + 0.05 * (i * i) as f64).collect();
    let series = series_from_closes(&closes);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("UP.NS", &series, last_date(&series)).unwrap());

    assert_eq!(result.momentum_trend, TrendLabel::Up);
    assert_eq!(result.convergence_trend, TrendLabel::Up);
    // Every close after the first is higher, so volume only accumulates
    let expected_obv: u64 = (1..120u64).map(|i| 1_000 + i).sum();
    assert_eq!(result.volume_accumulation, expected_obv as f64);
    // WMA leans toward recent closes
    assert!(result.weighted_moving_average > result.moving_average);
}

#[test]
fn test_late_rally_is_momentum_up() {
    // 75 unchanged closes, then 20 straight gains
    let closes: Vec<f64> = (0..95)
        .map(|i| if i < 75 { 100.0 } else { 100.0 + 2.0 * (i - 74) as f64 })
        .collect();
    let series = series_from_closes(&closes);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("RALLY.NS", &series, last_date(&series)).unwrap());

    assert_eq!(result.momentum_trend, TrendLabel::Up);
    assert!(closes[94] > result.moving_average);
}

#[test]
fn test_accelerating_fall_is_down() {
    let closes: Vec<f64> = (0..120).map(|i| 1_000.0 - 0.05 * (i * i) as f64).collect();
    let series = series_from_closes(&closes);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("DOWN.NS", &series, last_date(&series)).unwrap());

    assert_eq!(result.momentum_trend, TrendLabel::Down);
    assert_eq!(result.convergence_trend, TrendLabel::Down);
    assert!(result.volume_accumulation < 0.0);
    assert!(result.weighted_moving_average < result.moving_average);
}

#[test]
fn test_moving_average_is_last_fourteen_closes() {
    let closes: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let series = series_from_closes(&closes);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("LIN.NS", &series, last_date(&series)).unwrap());

    // mean(86..=99)
    assert!((result.moving_average - 92.5).abs() < EPS);
    // sum(k * (85 + k)) / 105 for k in 1..=14
    let wma: f64 = (1..=14).map(|k| (k * (85 + k)) as f64).sum::<f64>() / 105.0;
    assert!((result.weighted_moving_average - wma).abs() < EPS);
}

// ============================================================
// PATTERNS AND RECENCY
// ============================================================

#[test]
fn test_recent_doji_reported() {
    let series = with_trailing_dojis(100, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("DOJI.NS", &series, last_date(&series)).unwrap());
    assert!(result.patterns.iter().any(|p| p == "CDLDOJI"));
}

#[test]
fn test_duplicate_pattern_names_kept() {
    let series = with_trailing_dojis(100, 2);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let result = analyzed(analyzer.analyze("DOJI.NS", &series, last_date(&series)).unwrap());
    let dojis = result.patterns.iter().filter(|p| *p == "CDLDOJI").count();
    assert_eq!(dojis, 2);
}

#[test]
fn test_stale_patterns_dropped() {
    let series = with_trailing_dojis(100, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let anchor = last_date(&series) + chrono::Duration::days(30);
    let result = analyzed(analyzer.analyze("DOJI.NS", &series, anchor).unwrap());
    assert!(result.patterns.is_empty());
}

#[test]
fn test_window_edge() {
    let series = with_trailing_dojis(100, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let doji_day = last_date(&series);

    // Four days on is still inside a five-day window, five days is not
    let inside = analyzer.recognize(&series, doji_day + chrono::Duration::days(4)).unwrap();
    assert!(inside.iter().any(|p| p.name == "CDLDOJI" && p.date == doji_day));
    let outside = analyzer.recognize(&series, doji_day + chrono::Duration::days(5)).unwrap();
    assert!(!outside.iter().any(|p| p.name == "CDLDOJI"));
}

#[test]
fn test_hits_after_anchor_excluded() {
    let series = with_trailing_dojis(100, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let anchor = last_date(&series) - chrono::Duration::days(1);
    let result = analyzed(analyzer.analyze("DOJI.NS", &series, anchor).unwrap());
    assert!(!result.patterns.iter().any(|p| p == "CDLDOJI"));
}

#[test]
fn test_patterns_follow_detector_order() {
    let series = with_trailing_dojis(100, 2);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let hits = analyzer.recognize(&series, last_date(&series)).unwrap();
    let order = analyzer.detectors().names();
    let positions: Vec<usize> = hits
        .iter()
        .map(|h| order.iter().position(|n| *n == h.name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_allow_list_limits_output() {
    let config = AnalyzerConfig {
        patterns: Some(vec!["CDLENGULFING".into()]),
        ..Default::default()
    };
    let analyzer = InstrumentAnalyzer::new(config).unwrap();
    let series = with_trailing_dojis(100, 2);
    let result = analyzed(analyzer.analyze("DOJI.NS", &series, last_date(&series)).unwrap());
    assert!(result.patterns.iter().all(|p| p == "CDLENGULFING"));
}

#[test]
fn test_hits_match_pattern_column() {
    let series = with_trailing_dojis(100, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let (outcome, hits) = analyzer
        .analyze_with_hits("DOJI.NS", &series, last_date(&series))
        .unwrap();
    let result = analyzed(outcome);

    let names: Vec<String> = hits.iter().map(|h| h.name.clone()).collect();
    assert_eq!(names, result.patterns);
    assert!(hits.iter().any(|h| h.name == "CDLDOJI" && h.date == last_date(&series)));
}

#[test]
fn test_skipped_series_has_no_hits() {
    let series = with_trailing_dojis(50, 1);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let (outcome, hits) = analyzer
        .analyze_with_hits("SHORT.NS", &series, last_date(&series))
        .unwrap();
    assert!(outcome.is_skipped());
    assert!(hits.is_empty());
}

// ============================================================
// PURITY
// ============================================================

#[test]
fn test_analyze_is_idempotent() {
    let closes: Vec<f64> = (0..150)
        .map(|i| 100.0 + ((i * 37 % 23) as f64 - 11.0) * 0.7)
        .collect();
    let series = series_from_closes(&closes);
    let analyzer = InstrumentAnalyzer::with_defaults();
    let anchor = last_date(&series);
    let first = analyzer.analyze("JIT.NS", &series, anchor).unwrap();
    let second = analyzer.analyze("JIT.NS", &series, anchor).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_result_serializes_with_uppercase_labels() {
    let analyzer = InstrumentAnalyzer::with_defaults();
    let series = flat(100);
    let result = analyzed(analyzer.analyze("FLAT.NS", &series, last_date(&series)).unwrap());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["momentum_trend"], "SIDEWAYS");
    assert_eq!(json["patterns"], serde_json::json!([]));
}

#[test]
fn test_malformed_series_rejected_at_construction() {
    let bars = vec![
        Bar {
            date: day(1),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        },
        Bar {
            date: day(0),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        },
    ];
    assert!(matches!(
        OhlcvSeries::new(bars),
        Err(Error::MalformedSeries { index: 1, .. })
    ));
}

//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with retries and
//! exponential backoff. Rows with any missing price or volume are dropped
//! before the series is built.

use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use tracing::warn;

use super::provider::{DataError, DateRange, MarketDataProvider};
use crate::series::{Bar, OhlcvSeries};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

const SECONDS_PER_DAY: i64 = 86_400;

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, range: DateRange) -> String {
        let start_ts = range.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = range.end.and_time(NaiveTime::MIN).and_utc().timestamp() + SECONDS_PER_DAY - 1;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into bars.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::ResponseFormat(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormat("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormat("result array is empty".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormat("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| DataError::ResponseFormat(format!("invalid timestamp: {ts}")))?;

            let row = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            // Any gap in the row drops the whole bar
            if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row {
                bars.push(Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
            }
        }

        if bars.is_empty() {
            return Err(DataError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no complete bars in range".into(),
            });
        }

        // Intraday timestamps of the last session can repeat a date
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    /// Execute the request with retry and exponential backoff.
    fn fetch_with_retry(&self, symbol: &str, range: DateRange) -> Result<Vec<Bar>, DataError> {
        let url = Self::chart_url(symbol, range);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        last_error = Some(DataError::Network(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::DataUnavailable {
                            symbol: symbol.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
                    })?;
                    return Self::parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::Network(e.to_string()));
                        continue;
                    }
                    return Err(DataError::Network(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Network("max retries exceeded".into())))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, range: DateRange) -> Result<OhlcvSeries, DataError> {
        let bars = self.fetch_with_retry(symbol, range)?;
        Ok(OhlcvSeries::new(bars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(json: &str) -> Result<Vec<Bar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("TEST.NS", resp)
    }

    #[test]
    fn test_chart_url_covers_whole_end_day() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        )
        .unwrap();
        let url = YahooProvider::chart_url("RELIANCE.NS", range);
        assert!(url.contains("/chart/RELIANCE.NS?"));
        assert!(url.contains("period1=1640995200"));
        assert!(url.contains("period2=1641081599"));
    }

    #[test]
    fn test_parse_drops_incomplete_rows() {
        let bars = parse(
            r#"{"chart":{"result":[{"timestamp":[1704153600,1704240000,1704326400],
            "indicators":{"quote":[{"open":[10.0,null,12.0],"high":[11.0,12.0,13.0],
            "low":[9.0,10.0,11.0],"close":[10.5,11.5,12.5],"volume":[100,200,300]}]}}],
            "error":null}}"#,
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 12.5);
        assert_eq!(bars[1].volume, 300);
    }

    #[test]
    fn test_parse_not_found() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn test_parse_all_rows_missing() {
        let err = parse(
            r#"{"chart":{"result":[{"timestamp":[1704153600],
            "indicators":{"quote":[{"open":[null],"high":[null],"low":[null],
            "close":[null],"volume":[null]}]}}],"error":null}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }
}

//! Scan configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives
//! the standard NSE scan: 2022-01-01 to 2024-12-31 history from Yahoo, the
//! full detector set and a five-day recency window.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::AnalyzerConfig;
use crate::data::universe::DEFAULT_INSTRUMENTS_URL;
use crate::data::{DateRange, UniverseFilter};

/// Errors while loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level scan configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub analysis: AnalyzerConfig,
    pub data: DataConfig,
    pub universe: UniverseConfig,
    pub report: ReportConfig,
}

/// Which market data provider to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub provider: ProviderKind,
    /// Directory of `<SYMBOL>.csv` files, required for the csv provider
    pub csv_dir: Option<PathBuf>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Yahoo,
            csv_dir: None,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseConfig {
    /// Path or http(s) URL of the instrument dump
    pub source: String,
    pub segment: String,
    pub exclude_suffixes: Vec<String>,
    pub symbol_suffix: String,
    /// Explicit symbols; when set the dump is not read
    pub symbols: Option<Vec<String>>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let filter = UniverseFilter::default();
        Self {
            source: DEFAULT_INSTRUMENTS_URL.to_string(),
            segment: filter.segment,
            exclude_suffixes: filter.exclude_suffixes,
            symbol_suffix: filter.symbol_suffix,
            symbols: None,
        }
    }
}

impl UniverseConfig {
    pub fn filter(&self) -> UniverseFilter {
        UniverseFilter {
            segment: self.segment.clone(),
            exclude_suffixes: self.exclude_suffixes.clone(),
            symbol_suffix: self.symbol_suffix.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("analysis_data.csv"),
        }
    }
}

impl ScanConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.date_range()?;
        if self.data.provider == ProviderKind::Csv && self.data.csv_dir.is_none() {
            return Err(ConfigError::Invalid(
                "data.csv_dir is required when data.provider = \"csv\"".into(),
            ));
        }
        if self.universe.symbols.is_none() && self.universe.source.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "universe.source or universe.symbols must be set".into(),
            ));
        }
        Ok(())
    }

    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        DateRange::new(self.data.start, self.data.end).map_err(|_| {
            ConfigError::Invalid(format!(
                "data.start ({}) is after data.end ({})",
                self.data.start, self.data.end
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_defaults() {
        let config = ScanConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.analysis.min_bars, 90);
        assert_eq!(config.data.start.to_string(), "2022-01-01");
        assert_eq!(config.universe.symbol_suffix, ".NS");
        assert_eq!(config.report.path, PathBuf::from("analysis_data.csv"));
    }

    #[test]
    fn test_full_config() {
        let config = ScanConfig::from_toml_str(
            r#"
            [analysis]
            recency_days = 7
            overbought = 80.0
            oversold = 20.0

            [data]
            provider = "csv"
            csv_dir = "bars"
            start = "2023-01-01"
            end = "2023-12-31"

            [universe]
            symbols = ["TCS.NS", "INFY.NS"]

            [report]
            path = "out.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.recency_days, 7);
        assert_eq!(config.data.provider, ProviderKind::Csv);
        assert_eq!(config.data.csv_dir, Some(PathBuf::from("bars")));
        assert_eq!(config.universe.symbols.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.report.path, PathBuf::from("out.csv"));
    }

    #[test]
    fn test_csv_provider_requires_dir() {
        let err = ScanConfig::from_toml_str("[data]\nprovider = \"csv\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_inverted_dates_rejected() {
        let err = ScanConfig::from_toml_str("[data]\nstart = \"2024-01-01\"\nend = \"2023-01-01\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = ScanConfig::from_toml_str("[analysis]\noverbought = 20.0\noversold = 80.0")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = ScanConfig::from_toml_str("[analysis]\nmin_barz = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScanConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

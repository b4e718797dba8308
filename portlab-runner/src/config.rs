//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! [data]
//! source = "prices.csv"
//! delimiter = ","
//!
//! [metrics]
//! frequency = "monthly"
//!
//! [portfolio]
//! SPY = 0.6
//! AGG = 0.4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use portlab_core::{CsvOptions, Frequency, WeightMap};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
    #[error("portfolio section is empty")]
    EmptyPortfolio,
}

/// Everything needed to reproduce one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub data: DataConfig,
    pub metrics: MetricsConfig,
    pub portfolio: WeightMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Price file; a caller-supplied path takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: None,
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub frequency: Frequency,
}

impl BacktestConfig {
    pub fn new(portfolio: WeightMap, frequency: Frequency) -> Self {
        Self {
            data: DataConfig::default(),
            metrics: MetricsConfig { frequency },
            portfolio,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portfolio.is_empty() {
            return Err(ConfigError::EmptyPortfolio);
        }
        self.csv_options().map(|_| ())
    }

    pub fn frequency(&self) -> Frequency {
        self.metrics.frequency
    }

    pub fn csv_options(&self) -> Result<CsvOptions, ConfigError> {
        let delimiter = self.data.delimiter;
        if !delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        Ok(CsvOptions {
            delimiter: delimiter as u8,
        })
    }

    /// Deterministic hash of this configuration.
    ///
    /// Identical configs share a RunId, so it can key caches and name
    /// artifact directories.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[data]
source = "prices.csv"

[metrics]
frequency = "monthly"

[portfolio]
SPY = 0.5
AGG = 0.3
EFA = 0.2
"#;

    #[test]
    fn parses_sample() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.data.source.as_deref(), Some(Path::new("prices.csv")));
        assert_eq!(config.data.delimiter, ',');
        assert_eq!(config.frequency(), Frequency::Monthly);
        assert_eq!(config.portfolio.len(), 3);
        assert_eq!(config.portfolio.get("AGG"), Some(0.3));
    }

    #[test]
    fn numeric_frequency() {
        let config =
            BacktestConfig::from_toml("[metrics]\nfrequency = 252\n[portfolio]\nSPY = 1.0\n")
                .unwrap();
        assert_eq!(config.frequency().periods_per_year(), 252.0);
        assert!(config.data.source.is_none());
    }

    #[test]
    fn unknown_frequency_is_a_parse_error() {
        let err =
            BacktestConfig::from_toml("[metrics]\nfrequency = \"hourly\"\n[portfolio]\nSPY = 1.0\n")
                .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("hourly"));
    }

    #[test]
    fn empty_portfolio_is_rejected() {
        let err = BacktestConfig::from_toml("[metrics]\nfrequency = \"daily\"\n[portfolio]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPortfolio));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let toml = "[data]\ndelimiter = \"§\"\n[metrics]\nfrequency = \"daily\"\n[portfolio]\nA = 1.0\n";
        let err = BacktestConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter('§')));
    }

    #[test]
    fn semicolon_delimiter() {
        let toml = "[data]\ndelimiter = \";\"\n[metrics]\nfrequency = \"daily\"\n[portfolio]\nA = 1.0\n";
        let config = BacktestConfig::from_toml(toml).unwrap();
        assert_eq!(config.csv_options().unwrap().delimiter, b';');
    }

    #[test]
    fn toml_round_trip() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let back = BacktestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn run_id_is_deterministic() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let id = config.run_id().unwrap();
        assert_eq!(id, config.run_id().unwrap());
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn run_id_changes_with_weights() {
        let a = BacktestConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        b.portfolio.insert("SPY", 0.6);
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }
}

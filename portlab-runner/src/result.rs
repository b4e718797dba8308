//! Backtest result and the engine that produces it from a loaded table.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use portlab_core::{
    compute_metrics, compute_returns, DataError, Frequency, MetricsReport, PriceTable,
    ReturnSeries, WeightError, WeightMap,
};

use crate::config::ConfigError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("weight error: {0}")]
    Weights(#[from] WeightError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single portfolio backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Weights as requested, before normalization.
    pub weights: WeightMap,
    /// Weights divided by their raw sum (absent assets included).
    pub normalized_weights: WeightMap,
    pub assets_used: Vec<String>,
    pub missing_assets: Vec<String>,
    pub frequency: Frequency,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub dataset_hash: String,
    pub returns: ReturnSeries,
    pub metrics: MetricsReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn num_periods(&self) -> usize {
        self.returns.len()
    }
}

/// Run a backtest against an already-loaded table. No I/O.
///
/// Selects the weight map's assets from `table` (absent ones are skipped
/// with a warning), builds the return series and computes the metrics.
/// `source` is recorded on the result for provenance only.
pub fn backtest_table(
    table: &PriceTable,
    weights: &WeightMap,
    frequency: Frequency,
    source: Option<&Path>,
) -> Result<BacktestResult, RunError> {
    let requested: Vec<&str> = weights.assets().collect();
    let selected = table.select(&requested)?;
    let normalized_weights = weights.normalized()?;
    let returns = compute_returns(&selected, weights)?;
    let metrics = compute_metrics(&returns, frequency);

    let missing_assets: Vec<String> = requested
        .iter()
        .filter(|a| !selected.contains(a))
        .map(|a| a.to_string())
        .collect();
    debug!(
        used = selected.assets().len(),
        missing = missing_assets.len(),
        "portfolio assets resolved"
    );
    info!(
        periods = returns.len(),
        %frequency,
        total_return = metrics.get("total_return"),
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        weights: weights.clone(),
        normalized_weights,
        assets_used: selected.assets().to_vec(),
        missing_assets,
        frequency,
        start_date: selected.first_date(),
        end_date: selected.last_date(),
        source: source.map(Path::to_path_buf),
        dataset_hash: selected.dataset_hash(),
        returns,
        metrics,
    })
}

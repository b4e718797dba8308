//! Tool-style entry points over a price file.
//!
//! Every function takes the data source explicitly; there is no global
//! default path at this layer. Each call reloads the file, so results
//! always reflect the file's current contents.

use std::path::Path;

use tracing::info;

use portlab_core::{CsvOptions, DataError, Frequency, PriceIngestor, PriceTable, WeightMap};

use crate::config::BacktestConfig;
use crate::result::{backtest_table, BacktestResult, RunError};

/// Load a full price table with explicit reader options.
pub fn load_prices(source: &Path, options: CsvOptions) -> Result<PriceTable, DataError> {
    PriceIngestor::with_options(options).ingest_path(source)
}

/// Prices for the requested assets that exist in `source`.
///
/// Absent assets are skipped with a warning; fails if none are present.
pub fn fetch_prices<S: AsRef<str>>(asset_ids: &[S], source: &Path) -> Result<PriceTable, DataError> {
    PriceTable::load(source)?.select(asset_ids)
}

/// Non-date columns of `source`, in file order.
pub fn list_available_assets(source: &Path) -> Result<Vec<String>, DataError> {
    let table = PriceTable::load(source)?;
    Ok(table.assets().to_vec())
}

/// Backtest a weight map against `source`.
pub fn run_backtest(
    weights: &WeightMap,
    source: &Path,
    frequency: Frequency,
) -> Result<BacktestResult, RunError> {
    let table = PriceTable::load(source)?;
    backtest_table(&table, weights, frequency, Some(source))
}

/// Backtest a parsed configuration against `source`, honouring its reader options.
pub fn run_config(config: &BacktestConfig, source: &Path) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let table = load_prices(source, config.csv_options()?)?;
    info!(
        source = %source.display(),
        assets = config.portfolio.len(),
        frequency = %config.frequency(),
        "running configured backtest"
    );
    backtest_table(&table, &config.portfolio, config.frequency(), Some(source))
}

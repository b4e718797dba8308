//! Parallel evaluation of many portfolios against one price table.

use rayon::prelude::*;
use tracing::info;

use portlab_core::{Frequency, PriceTable, WeightMap};

use crate::result::{backtest_table, BacktestResult, RunError};

/// Backtest every weight map against `table` in parallel.
///
/// Results come back in input order; one portfolio failing does not affect
/// the others.
pub fn run_batch(
    table: &PriceTable,
    portfolios: &[WeightMap],
    frequency: Frequency,
) -> Vec<Result<BacktestResult, RunError>> {
    let results: Vec<_> = portfolios
        .par_iter()
        .map(|weights| backtest_table(table, weights, frequency, None))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        portfolios = portfolios.len(),
        failed,
        "batch complete"
    );
    results
}

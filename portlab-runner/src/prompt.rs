//! Narrative backtest prompt from comma-separated tickers and weights.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use portlab_core::weights::PERCENT_TOTAL;
use portlab_core::{DataError, WeightError};

use crate::tools::list_available_assets;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("number of tickers ({tickers}) must match number of weights ({weights})")]
    WeightMismatch { tickers: usize, weights: usize },
    #[error("weight {value:?} for {ticker} is not a number")]
    InvalidWeight { ticker: String, value: String },
    #[error("none of the requested tickers {requested:?} are available in the data")]
    NoAssetsAvailable { requested: Vec<String> },
    #[error(transparent)]
    Weights(#[from] WeightError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Build the backtest instruction for `tickers`/`weights` against `universe`.
///
/// Tickers are trimmed and uppercased; those outside `universe` are dropped
/// along with their weights. Surviving weights lose any `%` sign and are
/// rescaled to sum to 100, keeping input order.
pub fn backtest_prompt<S: AsRef<str>>(
    tickers: &str,
    weights: &str,
    universe: &[S],
) -> Result<String, PromptError> {
    let input_tickers: Vec<&str> = tickers.split(',').collect();
    let input_weights: Vec<&str> = weights.split(',').collect();
    if input_tickers.len() != input_weights.len() {
        return Err(PromptError::WeightMismatch {
            tickers: input_tickers.len(),
            weights: input_weights.len(),
        });
    }

    let mut allocation: Vec<(String, f64)> = Vec::new();
    let mut unavailable: Vec<String> = Vec::new();
    for (raw_ticker, raw_weight) in input_tickers.iter().zip(&input_weights) {
        let ticker = raw_ticker.trim().to_uppercase();
        if !universe.iter().any(|u| u.as_ref() == ticker) {
            unavailable.push(ticker);
            continue;
        }
        let weight = parse_weight(raw_weight).ok_or_else(|| PromptError::InvalidWeight {
            ticker: ticker.clone(),
            value: raw_weight.trim().to_string(),
        })?;
        allocation.push((ticker, weight));
    }

    if !unavailable.is_empty() {
        warn!(unavailable = ?unavailable, "tickers not in price data were dropped");
    }
    if allocation.is_empty() {
        return Err(PromptError::NoAssetsAvailable {
            requested: input_tickers.iter().map(|t| t.to_string()).collect(),
        });
    }

    let sum: f64 = allocation.iter().map(|(_, w)| w).sum();
    if sum == 0.0 {
        return Err(WeightError::DegenerateNormalization.into());
    }
    if !sum.is_finite() {
        return Err(WeightError::NonFiniteSum { sum }.into());
    }

    let portfolio = allocation
        .iter()
        .map(|(ticker, w)| format!("{:.2}% to {}", w * PERCENT_TOTAL / sum, ticker))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(render(&portfolio))
}

/// [`backtest_prompt`] with the universe read from a price file.
pub fn backtest_prompt_from_source(
    tickers: &str,
    weights: &str,
    source: &Path,
) -> Result<String, PromptError> {
    let universe = list_available_assets(source)?;
    backtest_prompt(tickers, weights, &universe)
}

fn parse_weight(raw: &str) -> Option<f64> {
    raw.replace('%', "").trim().parse::<f64>().ok()
}

fn render(portfolio: &str) -> String {
    format!(
        "Please use the tools you have and run a backtest for a portfolio that allocates \
         {portfolio} and then display some useful charts and tables from the result."
    )
}

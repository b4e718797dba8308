//! Portfolio return series: normalized-weight combination of per-asset simple returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::PriceTable;
use crate::metrics::{drawdown_curve, wealth_curve};
use crate::weights::{WeightError, WeightMap};

/// One observation of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub value: f64,
}

/// Date-indexed sequence of simple period returns.
///
/// A series built from a price table has exactly one entry per consecutive
/// pair of table dates, dated at the later one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ReturnPoint>", into = "Vec<ReturnPoint>")]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_points(points: Vec<ReturnPoint>) -> Self {
        let (dates, values) = points.into_iter().map(|p| (p.date, p.value)).unzip();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = ReturnPoint> + '_ {
        self.dates
            .iter()
            .zip(&self.values)
            .map(|(&date, &value)| ReturnPoint { date, value })
    }

    /// Growth of one unit of wealth: `Π_{s≤t}(1 + r_s)`.
    pub fn wealth(&self) -> Vec<f64> {
        wealth_curve(&self.values)
    }

    /// Cumulative return at each date: wealth − 1.
    pub fn cumulative_returns(&self) -> Vec<f64> {
        self.wealth().into_iter().map(|w| w - 1.0).collect()
    }

    /// Fractional decline from the running wealth peak at each date (≤ 0).
    pub fn drawdowns(&self) -> Vec<f64> {
        drawdown_curve(&self.wealth())
    }
}

impl From<Vec<ReturnPoint>> for ReturnSeries {
    fn from(points: Vec<ReturnPoint>) -> Self {
        Self::from_points(points)
    }
}

impl From<ReturnSeries> for Vec<ReturnPoint> {
    fn from(series: ReturnSeries) -> Self {
        series.iter().collect()
    }
}

/// Simple returns `p[t]/p[t-1] − 1` for t ≥ 1.
///
/// The result is one shorter than the input. An entry is `None` when either
/// neighbouring price is missing.
pub fn simple_returns(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    prices
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
            _ => None,
        })
        .collect()
}

/// Portfolio return series for `weights` over `table`.
///
/// Weights are normalized by their raw sum (zero sum is rejected). Weighted
/// assets that are not columns of `table` contribute nothing, as do assets
/// whose return is undefined on a given date. Tables with fewer than two
/// rows produce an empty series.
pub fn compute_returns(table: &PriceTable, weights: &WeightMap) -> Result<ReturnSeries, WeightError> {
    let normalized = weights.normalized()?;
    if table.len() < 2 {
        return Ok(ReturnSeries::default());
    }

    let mut portfolio = vec![0.0; table.len() - 1];
    for (asset, weight) in normalized.iter() {
        let Some(prices) = table.column(asset) else {
            debug!(asset, "weighted asset has no price column, skipping");
            continue;
        };
        for (acc, r) in portfolio.iter_mut().zip(simple_returns(prices)) {
            if let Some(r) = r {
                *acc += weight * r;
            }
        }
    }

    Ok(ReturnSeries {
        dates: table.dates()[1..].to_vec(),
        values: portfolio,
    })
}

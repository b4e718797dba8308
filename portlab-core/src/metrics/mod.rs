//! Performance metrics: pure functions that compute portfolio statistics.
//!
//! Every metric is a pure function: a slice of period returns in, scalar out.
//! Ratio metrics all divide through [`safe_ratio`], which yields 0.0 for a
//! zero denominator instead of an infinity or NaN.

pub mod tail;

use serde::{Deserialize, Serialize};

use crate::frequency::Frequency;
use crate::returns::ReturnSeries;

pub use tail::{conditional_value_at_risk, excess_kurtosis, quantile, skewness, value_at_risk};

/// Tail level used for the reported VaR / CVaR.
pub const TAIL_LEVEL: f64 = 0.05;

/// Report keys in presentation order.
pub const METRIC_NAMES: [&str; 15] = [
    "total_return",
    "annualized_return",
    "annualized_volatility",
    "sharpe_ratio",
    "sortino_ratio",
    "max_drawdown",
    "calmar_ratio",
    "downside_deviation",
    "win_rate",
    "var_5_percent",
    "cvar_5_percent",
    "skewness",
    "kurtosis",
    "num_periods",
    "years_of_data",
];

/// Aggregate statistics for one non-empty return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub downside_deviation: f64,
    pub win_rate: f64,
    #[serde(rename = "var_5_percent")]
    pub var_5: f64,
    #[serde(rename = "cvar_5_percent")]
    pub cvar_5: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub num_periods: usize,
    pub years_of_data: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from period returns. `None` for an empty slice.
    pub fn compute(returns: &[f64], frequency: Frequency) -> Option<Self> {
        if returns.is_empty() {
            return None;
        }
        let periods_per_year = frequency.periods_per_year();
        let years = returns.len() as f64 / periods_per_year;

        let total = total_return(returns);
        let ann_return = annualized_return(total, years);
        let ann_vol = annualized_volatility(returns, periods_per_year);
        let downside = downside_deviation(returns, periods_per_year);
        let max_dd = max_drawdown(returns);
        let var_5 = value_at_risk(returns, TAIL_LEVEL);

        Some(Self {
            total_return: total,
            annualized_return: ann_return,
            annualized_volatility: ann_vol,
            sharpe_ratio: safe_ratio(ann_return, ann_vol),
            sortino_ratio: safe_ratio(ann_return, downside),
            max_drawdown: max_dd,
            calmar_ratio: safe_ratio(ann_return, max_dd.abs()),
            downside_deviation: downside,
            win_rate: win_rate(returns),
            var_5,
            cvar_5: conditional_value_at_risk(returns, var_5),
            skewness: skewness(returns),
            kurtosis: excess_kurtosis(returns),
            num_periods: returns.len(),
            years_of_data: years,
        })
    }

    /// Look up a metric by its report key. `num_periods` is widened to f64.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "total_return" => self.total_return,
            "annualized_return" => self.annualized_return,
            "annualized_volatility" => self.annualized_volatility,
            "sharpe_ratio" => self.sharpe_ratio,
            "sortino_ratio" => self.sortino_ratio,
            "max_drawdown" => self.max_drawdown,
            "calmar_ratio" => self.calmar_ratio,
            "downside_deviation" => self.downside_deviation,
            "win_rate" => self.win_rate,
            "var_5_percent" => self.var_5,
            "cvar_5_percent" => self.cvar_5,
            "skewness" => self.skewness,
            "kurtosis" => self.kurtosis,
            "num_periods" => self.num_periods as f64,
            "years_of_data" => self.years_of_data,
            _ => return None,
        };
        Some(value)
    }
}

/// Metric name → value mapping; empty when the source series was empty.
///
/// Serializes as a flat JSON object, `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    metrics: Option<PerformanceMetrics>,
}

impl MetricsReport {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_none()
    }

    pub fn metrics(&self) -> Option<&PerformanceMetrics> {
        self.metrics.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.as_ref().and_then(|m| m.get(name))
    }

    pub fn num_periods(&self) -> usize {
        self.metrics.as_ref().map_or(0, |m| m.num_periods)
    }

    /// `(name, value)` pairs in [`METRIC_NAMES`] order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        match &self.metrics {
            Some(m) => METRIC_NAMES
                .iter()
                .filter_map(|&name| m.get(name).map(|v| (name, v)))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl From<Option<PerformanceMetrics>> for MetricsReport {
    fn from(metrics: Option<PerformanceMetrics>) -> Self {
        Self { metrics }
    }
}

/// Metrics report for a return series.
///
/// `frequency` fixes how many periods make a year; it is never inferred from
/// the series' dates.
pub fn compute_metrics(returns: &ReturnSeries, frequency: Frequency) -> MetricsReport {
    PerformanceMetrics::compute(returns.values(), frequency).into()
}

// ─── Individual metric functions ────────────────────────────────────

/// `num / den`, or 0.0 when `den` is zero or not finite.
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        0.0
    } else {
        num / den
    }
}

/// Compounded return over the whole series: Π(1 + r) − 1.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Geometric annualization of a total return spread over `years`.
///
/// 0.0 when `years` is not positive. A wealth ratio at or below zero has no
/// real root, so it reports −1.0 (everything lost).
pub fn annualized_return(total_return: f64, years: f64) -> f64 {
    if years <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Sample standard deviation scaled by √periods_per_year.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns) * periods_per_year.sqrt()
}

/// Sample standard deviation of the negative returns, annualized.
///
/// Fewer than two negative returns give 0.0.
pub fn downside_deviation(returns: &[f64], periods_per_year: f64) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    std_dev(&negatives) * periods_per_year.sqrt()
}

/// Fraction of periods with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Cumulative wealth `C[t] = Π_{s≤t}(1 + r_s)` starting from one unit.
pub fn wealth_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Drawdown from the running peak of a wealth curve, `(C − M) / M`.
///
/// The peak starts at the first point of the curve, not at the initial unit
/// of wealth.
pub fn drawdown_curve(wealth: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    wealth
        .iter()
        .map(|&w| {
            peak = peak.max(w);
            safe_ratio(w - peak, peak)
        })
        .collect()
}

/// Maximum drawdown as a non-positive fraction (−0.2 = 20% below peak).
pub fn max_drawdown(returns: &[f64]) -> f64 {
    drawdown_curve(&wealth_curve(returns))
        .into_iter()
        .fold(0.0, f64::min)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
///
/// Exactly 0.0 for fewer than two values or when every value is identical,
/// so a flat series never leaves rounding noise in a ratio's denominator.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

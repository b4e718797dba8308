//! Tail risk metrics: VaR, CVaR, skewness, excess kurtosis.
//!
//! Distribution-shape statistics of the period returns. All functions are
//! pure: returns in, scalar out. Sample-adjusted estimators are used
//! throughout, matching the n − 1 standard deviation in the parent module.

use super::{is_constant, mean_f64};

/// Linear-interpolated quantile at `q` ∈ [0, 1].
///
/// Position `q·(n−1)` in the sorted sample, interpolating between the two
/// closest ranks. 0.0 for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Value at Risk: the `level` quantile of returns (e.g. 0.05 → 5th percentile).
pub fn value_at_risk(returns: &[f64], level: f64) -> f64 {
    quantile(returns, level)
}

/// Conditional VaR (expected shortfall): mean of returns at or below `var`.
///
/// Falls back to `var` itself if no return qualifies.
pub fn conditional_value_at_risk(returns: &[f64], var: f64) -> f64 {
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    if tail.is_empty() {
        return var;
    }
    mean_f64(&tail)
}

/// Central moments m2, m3, m4 (population, 1/n).
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = mean_f64(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Adjusted Fisher–Pearson sample skewness (G1).
///
/// G1 = √(n(n−1)) / (n−2) · m3 / m2^{3/2}
///
/// 0.0 with fewer than three observations or zero dispersion.
pub fn skewness(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 3 || is_constant(returns) {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(returns);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Fisher sample excess kurtosis (G2), 0 for a normal distribution.
///
/// G2 = (n−1) / ((n−2)(n−3)) · ((n+1)·g2 + 6), with g2 = m4/m2² − 3
///
/// 0.0 with fewer than four observations or zero dispersion.
pub fn excess_kurtosis(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 4 || is_constant(returns) {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(returns);
    if m2 == 0.0 {
        return 0.0;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    (n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0)
}

// ─── Tests ───────────────────────────────────────────────────────────

//! Portfolio weights and normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sum target for internal weights.
pub const UNIT_TOTAL: f64 = 1.0;

/// Sum target for display weights.
pub const PERCENT_TOTAL: f64 = 100.0;

/// Errors from weight normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("weights sum to zero; normalization is undefined")]
    DegenerateNormalization,

    #[error("weight for '{asset}' is not finite: {value}")]
    NonFinite { asset: String, value: f64 },

    #[error("weights sum to a non-finite value: {sum}")]
    NonFiniteSum { sum: f64 },
}

/// Asset id → raw weight. Any sign or magnitude is allowed; the sum need not be 1.
///
/// Keys are kept sorted so iteration (and therefore floating-point
/// accumulation order) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<String, f64>);

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a weight.
    pub fn insert(&mut self, asset: impl Into<String>, weight: f64) -> Option<f64> {
        self.0.insert(asset.into(), weight)
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Raw sum of all weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Rescale so the weights sum to `target`, dividing each by the raw sum.
    pub fn normalize_to(&self, target: f64) -> Result<WeightMap, WeightError> {
        if let Some((asset, value)) = self.iter().find(|(_, w)| !w.is_finite()) {
            return Err(WeightError::NonFinite {
                asset: asset.to_string(),
                value,
            });
        }
        let sum = self.total();
        if sum == 0.0 {
            return Err(WeightError::DegenerateNormalization);
        }
        if !sum.is_finite() {
            return Err(WeightError::NonFiniteSum { sum });
        }
        Ok(WeightMap(
            self.0
                .iter()
                .map(|(asset, w)| (asset.clone(), w * target / sum))
                .collect(),
        ))
    }

    /// Weights summing to 1.0.
    pub fn normalized(&self) -> Result<WeightMap, WeightError> {
        self.normalize_to(UNIT_TOTAL)
    }

    /// Weights summing to 100, for display.
    pub fn normalized_percent(&self) -> Result<WeightMap, WeightError> {
        self.normalize_to(PERCENT_TOTAL)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for WeightMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        WeightMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<BTreeMap<String, f64>> for WeightMap {
    fn from(map: BTreeMap<String, f64>) -> Self {
        WeightMap(map)
    }
}

impl<'a> IntoIterator for &'a WeightMap {
    type Item = (&'a String, &'a f64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_unit_sum() {
        let w: WeightMap = [("SPY", 3.0), ("AGG", 1.0)].into_iter().collect();
        let n = w.normalized().unwrap();
        assert!((n.get("SPY").unwrap() - 0.75).abs() < 1e-12);
        assert!((n.get("AGG").unwrap() - 0.25).abs() < 1e-12);
        assert!((n.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalizes_to_percent() {
        let w: WeightMap = [("SPY", 60.0), ("AGG", 20.0), ("EFA", 20.0)].into_iter().collect();
        let n = w.normalized_percent().unwrap();
        assert!((n.get("SPY").unwrap() - 60.0).abs() < 1e-9);
        assert!((n.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn negative_weights_use_raw_sum() {
        let w: WeightMap = [("LONG", 1.5), ("SHORT", -0.5)].into_iter().collect();
        let n = w.normalized().unwrap();
        assert!((n.get("LONG").unwrap() - 1.5).abs() < 1e-12);
        assert!((n.get("SHORT").unwrap() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_sum_is_rejected() {
        let w: WeightMap = [("A", 1.0), ("B", -1.0)].into_iter().collect();
        assert_eq!(w.normalized(), Err(WeightError::DegenerateNormalization));
        assert_eq!(WeightMap::new().normalized(), Err(WeightError::DegenerateNormalization));
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let w: WeightMap = [("A", f64::NAN), ("B", 1.0)].into_iter().collect();
        assert!(matches!(w.normalized(), Err(WeightError::NonFinite { .. })));

        let w: WeightMap = [("A", f64::MAX), ("B", f64::MAX)].into_iter().collect();
        assert!(matches!(w.normalized(), Err(WeightError::NonFiniteSum { .. })));
    }

    #[test]
    fn serializes_as_plain_map() {
        let w: WeightMap = [("SPY", 0.5), ("AGG", 0.5)].into_iter().collect();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"AGG":0.5,"SPY":0.5}"#);
        let back: WeightMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}

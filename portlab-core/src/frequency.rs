//! Sampling frequency of a price table, used for annualization.
//!
//! There is no default and no inference from date spacing: callers state
//! how often the data was sampled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How often one row of price data is observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrequencyRepr", into = "FrequencyRepr")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    /// Explicit number of periods per year, built through [`Frequency::per_year`].
    PerYear(PeriodsPerYear),
}

/// A positive, finite periods-per-year count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodsPerYear(f64);

impl PeriodsPerYear {
    pub fn new(n: f64) -> Result<Self, FrequencyError> {
        if n.is_finite() && n > 0.0 {
            Ok(Self(n))
        } else {
            Err(FrequencyError(n.to_string()))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Frequency {
    /// Periods per year used to annualize returns and volatility.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::Annual => 1.0,
            Frequency::PerYear(n) => n.get(),
        }
    }

    /// Explicit periods-per-year, rejecting non-positive or non-finite values.
    pub fn per_year(n: f64) -> Result<Self, FrequencyError> {
        PeriodsPerYear::new(n).map(Frequency::PerYear)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Annual => write!(f, "annual"),
            Frequency::PerYear(n) => write!(f, "{}", n.get()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid frequency '{0}': expected daily, weekly, monthly, quarterly, annual, or a positive number of periods per year")]
pub struct FrequencyError(pub String);

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            "monthly" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "q" => Ok(Frequency::Quarterly),
            "annual" | "yearly" | "a" | "y" => Ok(Frequency::Annual),
            other => other
                .parse::<f64>()
                .map_err(|_| FrequencyError(s.to_string()))
                .and_then(Frequency::per_year),
        }
    }
}

/// Serialized form: a name (`"monthly"`) or a bare number (`252`).
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Number(f64),
    Name(String),
}

impl TryFrom<FrequencyRepr> for Frequency {
    type Error = FrequencyError;

    fn try_from(repr: FrequencyRepr) -> Result<Self, Self::Error> {
        match repr {
            FrequencyRepr::Number(n) => Frequency::per_year(n),
            FrequencyRepr::Name(s) => s.parse(),
        }
    }
}

impl From<Frequency> for FrequencyRepr {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::PerYear(n) => FrequencyRepr::Number(n.get()),
            named => FrequencyRepr::Name(named.to_string()),
        }
    }
}

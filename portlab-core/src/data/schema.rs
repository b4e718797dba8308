//! Price file schema: the mandatory date column and cell parsing rules.

use chrono::{NaiveDate, NaiveDateTime};

use super::DataError;

/// Expected layout of a wide price file.
///
/// One header row, a `Date` column (matched case-insensitively after trimming),
/// and one price column per asset. Nothing else is inferred: a file without a
/// date column is rejected, never guessed at.
pub struct PriceSchema;

impl PriceSchema {
    /// Canonical name of the date column.
    pub const DATE_COLUMN: &'static str = "Date";

    /// Accepted date-only layouts, tried in order.
    const DATE_FORMATS: [&'static str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    /// Accepted datetime layouts; only the date part is kept.
    const DATETIME_FORMATS: [&'static str; 3] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    /// Index of the date column within a header row.
    pub fn date_column_index<'a, I>(headers: I) -> Result<usize, DataError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        headers
            .into_iter()
            .position(|h| h.trim().eq_ignore_ascii_case(Self::DATE_COLUMN))
            .ok_or_else(|| {
                DataError::Format(format!(
                    "price data must contain a '{}' column",
                    Self::DATE_COLUMN
                ))
            })
    }

    /// Parse a date cell.
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        Self::DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                Self::DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            })
    }

    /// Parse a price cell. Empty cells are missing observations (`Ok(None)`).
    ///
    /// Prices must be finite and strictly positive; anything else is an error
    /// message for the caller to wrap with its location.
    pub fn parse_price(raw: &str) -> Result<Option<f64>, String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("'{raw}' is not a number"))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("price {raw} must be positive and finite"));
        }
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_date_column_case_insensitively() {
        assert_eq!(PriceSchema::date_column_index(["SPY", " date ", "AGG"]).unwrap(), 1);
        assert_eq!(PriceSchema::date_column_index(["Date", "SPY"]).unwrap(), 0);
    }

    #[test]
    fn missing_date_column_is_format_error() {
        let err = PriceSchema::date_column_index(["Timestamp", "SPY"]).unwrap_err();
        assert!(matches!(err, DataError::Format(_)));
    }

    #[test]
    fn parses_supported_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(PriceSchema::parse_date("2024-03-31"), Some(expected));
        assert_eq!(PriceSchema::parse_date("2024/03/31"), Some(expected));
        assert_eq!(PriceSchema::parse_date("03/31/2024"), Some(expected));
        assert_eq!(PriceSchema::parse_date("2024-03-31 00:00:00"), Some(expected));
        assert_eq!(PriceSchema::parse_date("2024-03-31T16:00:00"), Some(expected));
        assert_eq!(PriceSchema::parse_date("last tuesday"), None);
    }

    #[test]
    fn price_cells() {
        assert_eq!(PriceSchema::parse_price(" 101.5 ").unwrap(), Some(101.5));
        assert_eq!(PriceSchema::parse_price("").unwrap(), None);
        assert_eq!(PriceSchema::parse_price("NaN").unwrap(), None);
        assert!(PriceSchema::parse_price("abc").is_err());
        assert!(PriceSchema::parse_price("0").is_err());
        assert!(PriceSchema::parse_price("-3.2").is_err());
        assert!(PriceSchema::parse_price("inf").is_err());
    }
}

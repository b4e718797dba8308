//! Immutable, date-sorted table of per-asset prices.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::ingest::{DataError, PriceIngestor};
use super::schema::PriceSchema;

/// Wide price table: one strictly increasing date axis, one column per asset.
///
/// Missing observations are `None`, never zero. Every present price is
/// positive and finite. Tables are never mutated after construction;
/// [`PriceTable::select`] hands back a new owned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    /// `columns[a][t]` is the price of `assets[a]` on `dates[t]`.
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Build a table from a date axis and named columns.
    ///
    /// Rows are sorted by date; for duplicated dates the last row wins.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, DataError> {
        for (asset, values) in &columns {
            if values.len() != dates.len() {
                return Err(DataError::Format(format!(
                    "column '{asset}' has {} values for {} dates",
                    values.len(),
                    dates.len()
                )));
            }
        }
        let assets: Vec<String> = columns.iter().map(|(a, _)| a.clone()).collect();
        let rows = dates
            .into_iter()
            .enumerate()
            .map(|(t, date)| (date, columns.iter().map(|(_, v)| v[t]).collect()))
            .collect();
        Self::from_rows(assets, rows)
    }

    /// Load a CSV file with the default reader options.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        PriceIngestor::new().ingest_path(path)
    }

    pub(crate) fn from_rows(
        assets: Vec<String>,
        mut rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
    ) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for asset in &assets {
            if asset.trim().is_empty() {
                return Err(DataError::Format("blank asset column header".into()));
            }
            if asset.trim().eq_ignore_ascii_case(PriceSchema::DATE_COLUMN) {
                return Err(DataError::Format(format!(
                    "more than one '{}' column",
                    PriceSchema::DATE_COLUMN
                )));
            }
            if !seen.insert(asset.as_str()) {
                return Err(DataError::Format(format!("duplicate asset column '{asset}'")));
            }
        }

        for (date, prices) in &rows {
            if prices.len() != assets.len() {
                return Err(DataError::Format(format!(
                    "row {date} has {} prices for {} assets",
                    prices.len(),
                    assets.len()
                )));
            }
            if let Some((a, p)) = prices
                .iter()
                .enumerate()
                .find_map(|(a, p)| p.filter(|v| !v.is_finite() || *v <= 0.0).map(|v| (a, v)))
            {
                return Err(DataError::Format(format!(
                    "row {date}, column '{}': price {p} must be positive and finite",
                    assets[a]
                )));
            }
        }

        // Stable sort keeps file order among equal dates, so the last one wins below.
        rows.sort_by_key(|(date, _)| *date);
        let mut deduped: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::with_capacity(rows.len());
        let mut duplicates = 0usize;
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.0 == row.0 => {
                    *last = row;
                    duplicates += 1;
                }
                _ => deduped.push(row),
            }
        }
        if duplicates > 0 {
            warn!(duplicates, "duplicate dates collapsed, keeping the last row for each");
        }

        let dates: Vec<NaiveDate> = deduped.iter().map(|(d, _)| *d).collect();
        let columns = (0..assets.len())
            .map(|a| deduped.iter().map(|(_, prices)| prices[a]).collect())
            .collect();

        Ok(Self {
            dates,
            assets,
            columns,
        })
    }

    /// Number of dates (rows).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The date axis, strictly increasing.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset identifiers in column order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.asset_index(asset).is_some()
    }

    /// Price column for one asset, aligned with [`PriceTable::dates`].
    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.asset_index(asset).map(|a| self.columns[a].as_slice())
    }

    /// Price of `asset` on the `t`-th date, if observed.
    pub fn price(&self, t: usize, asset: &str) -> Option<f64> {
        self.column(asset).and_then(|col| col.get(t).copied().flatten())
    }

    fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Sub-table restricted to the requested assets that exist here.
    ///
    /// Absent assets are logged and skipped. Fails only when none of the
    /// requested assets are available. Columns come back in request order;
    /// repeated ids are taken once.
    pub fn select<S: AsRef<str>>(&self, asset_ids: &[S]) -> Result<PriceTable, DataError> {
        let mut present: Vec<usize> = Vec::new();
        let mut missing: Vec<&str> = Vec::new();
        for id in asset_ids {
            let id = id.as_ref();
            match self.asset_index(id) {
                Some(a) if !present.contains(&a) => present.push(a),
                Some(_) => {}
                None if !missing.contains(&id) => missing.push(id),
                None => {}
            }
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "requested assets not found in price data");
        }
        if present.is_empty() {
            return Err(DataError::NoAssetsAvailable {
                requested: asset_ids.iter().map(|s| s.as_ref().to_string()).collect(),
            });
        }

        Ok(PriceTable {
            dates: self.dates.clone(),
            assets: present.iter().map(|&a| self.assets[a].clone()).collect(),
            columns: present.iter().map(|&a| self.columns[a].clone()).collect(),
        })
    }

    /// BLAKE3 fingerprint over dates, asset names, and price bits.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for (asset, column) in self.assets.iter().zip(&self.columns) {
            hasher.update(asset.as_bytes());
            hasher.update(&[0]);
            for price in column {
                match price {
                    Some(p) => hasher.update(&p.to_bits().to_le_bytes()),
                    None => hasher.update(&[0xff]),
                };
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Write the table back out as CSV with a leading `Date` column.
    pub fn to_csv(&self) -> Result<String, DataError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let mut header = vec![PriceSchema::DATE_COLUMN.to_string()];
        header.extend(self.assets.iter().cloned());
        wtr.write_record(&header)?;

        for (t, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.to_string()];
            record.extend(
                self.columns
                    .iter()
                    .map(|col| col[t].map(|p| p.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| DataError::Format(format!("failed to flush CSV writer: {e}")))?;
        String::from_utf8(data).map_err(|e| DataError::Format(e.to_string()))
    }
}

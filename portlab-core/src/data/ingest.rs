//! CSV ingestion of wide price files into a [`PriceTable`], plus the data-layer error type.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::price_table::PriceTable;
use crate::data::schema::PriceSchema;

/// Reader options for delimited price files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Ingestor for wide price files (one row per date, one column per asset).
#[derive(Debug, Clone, Default)]
pub struct PriceIngestor {
    options: CsvOptions,
}

impl PriceIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Ingest a CSV file from disk.
    pub fn ingest_path(&self, path: &Path) -> Result<PriceTable, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = self.ingest_reader(file)?;
        debug!(path = %path.display(), "loaded price data");
        Ok(table)
    }

    /// Ingest CSV content from any reader.
    pub fn ingest_reader<R: Read>(&self, reader: R) -> Result<PriceTable, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let date_idx = PriceSchema::date_column_index(headers.iter())?;
        let assets: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw_date = record.get(date_idx).unwrap_or("");
            let date = PriceSchema::parse_date(raw_date).ok_or_else(|| {
                DataError::Format(format!("line {line}: cannot parse date '{raw_date}'"))
            })?;

            let mut prices = Vec::with_capacity(assets.len());
            for (i, cell) in record.iter().enumerate().filter(|(i, _)| *i != date_idx) {
                let price = PriceSchema::parse_price(cell).map_err(|msg| {
                    let column = headers.get(i).unwrap_or("?");
                    DataError::Format(format!("line {line}, column '{column}': {msg}"))
                })?;
                prices.push(price);
            }
            rows.push((date, prices));
        }

        let table = PriceTable::from_rows(assets, rows)?;
        info!(
            shape = %format!("{}x{}", table.len(), table.assets().len()),
            columns = ?table.assets(),
            "parsed price table"
        );
        Ok(table)
    }
}

/// Errors from loading and slicing price data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("data format error: {0}")]
    Format(String),

    #[error("none of the requested assets {requested:?} are available in the data")]
    NoAssetsAvailable { requested: Vec<String> },

    #[error("failed to open price data {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSORTED: &str = "\
Date,SPY,AGG
2024-03-31,110.0,50.5
2024-01-31,100.0,50.0
2024-02-29,105.0,
";

    #[test]
    fn ingests_and_sorts_by_date() {
        let table = PriceIngestor::new().ingest_reader(UNSORTED.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.assets(), ["SPY", "AGG"]);
        assert_eq!(table.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(table.column("SPY").unwrap(), &[Some(100.0), Some(105.0), Some(110.0)]);
        assert_eq!(table.column("AGG").unwrap(), &[Some(50.0), None, Some(50.5)]);
    }

    #[test]
    fn date_column_need_not_be_first() {
        let csv = "SPY,date\n100.0,2024-01-02\n101.0,2024-01-03\n";
        let table = PriceIngestor::new().ingest_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.assets(), ["SPY"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_missing_date_column() {
        let csv = "Day,SPY\n2024-01-02,100.0\n";
        let err = PriceIngestor::new().ingest_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Format(_)), "got {err:?}");
    }

    #[test]
    fn rejects_unparseable_date() {
        let csv = "Date,SPY\nyesterday,100.0\n";
        let err = PriceIngestor::new().ingest_reader(csv.as_bytes()).unwrap_err();
        match err {
            DataError::Format(msg) => assert!(msg.contains("yesterday"), "{msg}"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_price_with_location() {
        let csv = "Date,SPY\n2024-01-02,100.0\n2024-01-03,n/a\n";
        let err = PriceIngestor::new().ingest_reader(csv.as_bytes()).unwrap_err();
        match err {
            DataError::Format(msg) => {
                assert!(msg.contains("line 3"), "{msg}");
                assert!(msg.contains("SPY"), "{msg}");
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_csv_errors() {
        let csv = "Date,SPY,AGG\n2024-01-02,100.0\n";
        let err = PriceIngestor::new().ingest_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Csv(_)), "got {err:?}");
    }

    #[test]
    fn custom_delimiter() {
        let csv = "Date;SPY\n2024-01-02;100.0\n2024-01-03;102.0\n";
        let ingestor = PriceIngestor::with_options(CsvOptions { delimiter: b';' });
        let table = ingestor.ingest_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.column("SPY").unwrap(), &[Some(100.0), Some(102.0)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PriceIngestor::new()
            .ingest_path(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}

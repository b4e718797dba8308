//! Price data ingestion and access

pub mod ingest;
pub mod price_table;
pub mod schema;

pub use ingest::{CsvOptions, DataError, PriceIngestor};
pub use price_table::PriceTable;
pub use schema::PriceSchema;

//! PortLab Core: price tables, weights, portfolio returns, performance metrics.
//!
//! This crate contains the numerical heart of the backtester:
//! - Date-sorted wide price tables loaded from CSV, with asset selection
//! - Weight maps and normalization (unit sum internally, percent for display)
//! - Portfolio return series from normalized-weight simple returns
//! - A fixed battery of risk/performance metrics with guarded ratios
//!
//! Everything here is synchronous and side-effect free apart from reading the
//! price file and emitting `tracing` events.

pub mod data;
pub mod frequency;
pub mod metrics;
pub mod returns;
pub mod weights;

pub use data::{CsvOptions, DataError, PriceIngestor, PriceTable};
pub use frequency::{Frequency, FrequencyError, PeriodsPerYear};
pub use metrics::{compute_metrics, MetricsReport, PerformanceMetrics};
pub use returns::{compute_returns, ReturnPoint, ReturnSeries};
pub use weights::{WeightError, WeightMap};

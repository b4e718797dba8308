//! PortLab Runner: backtest entry points, run configuration, batch runs, export.
//!
//! This crate builds on `portlab-core` to provide:
//! - Tool-style entry points over a price file (`fetch_prices`,
//!   `run_backtest`, `list_available_assets`)
//! - The narrative backtest prompt generator
//! - TOML run configuration with content-addressed run ids
//! - Parallel evaluation of many portfolios against one table
//! - JSON / CSV / Markdown export and artifact bundles

pub mod batch;
pub mod config;
pub mod export;
pub mod prompt;
pub mod result;
pub mod tools;

pub use batch::run_batch;
pub use config::{BacktestConfig, ConfigError, DataConfig, MetricsConfig, RunId};
pub use export::{
    export_json, export_metrics_csv, export_returns_csv, import_json, load_artifacts,
    render_markdown, save_artifacts,
};
pub use prompt::{backtest_prompt, backtest_prompt_from_source, PromptError};
pub use result::{backtest_table, BacktestResult, RunError, SCHEMA_VERSION};
pub use tools::{fetch_prices, list_available_assets, load_prices, run_backtest, run_config};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<PromptError>();
        assert_sync::<PromptError>();
    }
}

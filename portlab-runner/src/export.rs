//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: the return series with wealth and drawdown, and the metrics table
//! - **Markdown**: a human-readable single-run report
//!
//! Persisted results carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::result::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Return series as CSV: `date,return,wealth,drawdown`.
pub fn export_returns_csv(result: &BacktestResult) -> Result<String> {
    let series = &result.returns;
    let wealth = series.wealth();
    let drawdowns = series.drawdowns();

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "return", "wealth", "drawdown"])?;
    for (i, point) in series.iter().enumerate() {
        wtr.write_record([
            &point.date.to_string(),
            &format!("{:.10}", point.value),
            &format!("{:.10}", wealth[i]),
            &format!("{:.10}", drawdowns[i]),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Metrics table as CSV: `metric,value`. Header only for an empty report.
pub fn export_metrics_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["metric", "value"])?;
    for (name, value) in result.metrics.entries() {
        let value = if name == "num_periods" {
            result.metrics.num_periods().to_string()
        } else {
            value.to_string()
        };
        wtr.write_record([name, value.as_str()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest.
pub fn render_markdown(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Portfolio Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let Some(source) = &result.source {
        md.push_str(&format!("| Source | {} |\n", source.display()));
    }
    match (result.start_date, result.end_date) {
        (Some(start), Some(end)) => md.push_str(&format!("| Period | {start} to {end} |\n")),
        _ => md.push_str("| Period | n/a |\n"),
    }
    md.push_str(&format!(
        "| Frequency | {} ({} periods/year) |\n",
        result.frequency,
        result.frequency.periods_per_year()
    ));
    md.push_str(&format!("| Return periods | {} |\n", result.num_periods()));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push('\n');

    md.push_str("## Allocation\n\n");
    md.push_str("| Asset | Weight | Normalized | Status |\n");
    md.push_str("| --- | ---: | ---: | --- |\n");
    for (asset, weight) in &result.weights {
        let normalized = result.normalized_weights.get(asset).unwrap_or(0.0);
        let status = if result.missing_assets.iter().any(|m| m == asset) {
            "missing"
        } else {
            "used"
        };
        md.push_str(&format!(
            "| {asset} | {weight} | {:.2}% | {status} |\n",
            normalized * 100.0
        ));
    }
    md.push('\n');

    md.push_str("## Performance\n\n");
    if result.metrics.is_empty() {
        md.push_str("_No return periods: metrics unavailable._\n");
        return md;
    }
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    for (name, value) in result.metrics.entries() {
        md.push_str(&format!("| {} | {} |\n", metric_label(name), format_metric(name, value)));
    }

    md
}

fn metric_label(name: &str) -> &'static str {
    match name {
        "total_return" => "Total Return",
        "annualized_return" => "Annualized Return",
        "annualized_volatility" => "Annualized Volatility",
        "sharpe_ratio" => "Sharpe Ratio",
        "sortino_ratio" => "Sortino Ratio",
        "max_drawdown" => "Max Drawdown",
        "calmar_ratio" => "Calmar Ratio",
        "downside_deviation" => "Downside Deviation",
        "win_rate" => "Win Rate",
        "var_5_percent" => "VaR (5%)",
        "cvar_5_percent" => "CVaR (5%)",
        "skewness" => "Skewness",
        "kurtosis" => "Excess Kurtosis",
        "num_periods" => "Periods",
        "years_of_data" => "Years of Data",
        _ => "Unknown",
    }
}

fn format_metric(name: &str, value: f64) -> String {
    match name {
        "total_return" | "annualized_return" | "annualized_volatility" | "downside_deviation"
        | "max_drawdown" | "win_rate" | "var_5_percent" | "cvar_5_percent" => {
            format!("{:+.2}%", value * 100.0)
        }
        "num_periods" => format!("{value:.0}"),
        "skewness" | "kurtosis" => format!("{value:.3}"),
        _ => format!("{value:.2}"),
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest.
///
/// Creates a fresh directory `backtest_{hash}_{timestamp}/` under
/// `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `returns.csv`: date, return, wealth, drawdown
/// - `metrics.csv`: metric, value
/// - `report.md`: the Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let hash: String = result.dataset_hash.chars().take(12).collect();
    let stem = format!(
        "backtest_{}_{}",
        hash,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = fresh_dir(output_dir, &stem)?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("returns.csv"), export_returns_csv(result)?)?;
    std::fs::write(run_dir.join("metrics.csv"), export_metrics_csv(result)?)?;
    std::fs::write(run_dir.join("report.md"), render_markdown(result))?;

    info!(dir = %run_dir.display(), "saved backtest artifacts");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Create `parent/stem`, suffixing `_1`, `_2`, ... if it already exists.
fn fresh_dir(parent: &Path, stem: &str) -> Result<PathBuf> {
    for attempt in 0u32.. {
        let name = if attempt == 0 {
            stem.to_string()
        } else {
            format!("{stem}_{attempt}")
        };
        let dir = parent.join(name);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create {}", dir.display()))
            }
        }
    }
    bail!("no free artifact directory name under {}", parent.display())
}

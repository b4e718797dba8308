//! PortLab CLI: asset listing, price slices, backtests, and prompts.
//!
//! Commands:
//! - `assets`: list the assets available in the price file
//! - `prices`: print the requested assets' prices as CSV
//! - `backtest`: backtest a portfolio from `--weights` or a TOML `--config`
//! - `prompt`: render the narrative backtest instruction

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use portlab_core::{Frequency, WeightMap};
use portlab_runner::{
    backtest_prompt_from_source, export_json, fetch_prices, list_available_assets,
    render_markdown, run_config, save_artifacts, BacktestConfig,
};

#[derive(Parser)]
#[command(
    name = "portlab",
    about = "PortLab CLI: portfolio backtests over a flat price file"
)]
struct Cli {
    /// Price file (CSV with a Date column). A config's `data.source` wins over the default.
    #[arg(long, global = true, default_value = "prices.csv")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the assets available in the price file.
    Assets {
        /// Print a JSON array instead of one asset per line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print prices for the given assets as CSV.
    Prices {
        /// Assets to select (e.g., SPY AGG).
        #[arg(required = true)]
        assets: Vec<String>,
    },
    /// Backtest a portfolio and print the result as JSON.
    Backtest {
        /// Weights as ASSET=WEIGHT pairs, e.g. SPY=0.6,AGG=0.4 (ids are case-sensitive).
        #[arg(long, conflicts_with = "config", required_unless_present = "config")]
        weights: Option<String>,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data frequency: daily, weekly, monthly, quarterly, annual, or periods per year.
        #[arg(long)]
        frequency: Option<Frequency>,

        /// Save result.json, returns.csv, metrics.csv and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the Markdown report instead of JSON.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
    /// Render the narrative backtest prompt.
    Prompt {
        /// Comma-separated tickers, e.g. "spy, agg".
        #[arg(long)]
        tickers: String,

        /// Comma-separated weights, e.g. "60%,40%".
        #[arg(long)]
        weights: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let matches = Cli::command().get_matches();
    let data_explicit = data_given(&matches);
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    match cli.command {
        Commands::Assets { json } => run_assets(&cli.data, json),
        Commands::Prices { assets } => run_prices(&cli.data, &assets),
        Commands::Backtest {
            weights,
            config,
            frequency,
            output_dir,
            markdown,
        } => run_backtest_cmd(
            &cli.data,
            data_explicit,
            weights,
            config,
            frequency,
            output_dir,
            markdown,
        ),
        Commands::Prompt { tickers, weights } => {
            println!("{}", backtest_prompt_from_source(&tickers, &weights, &cli.data)?);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Whether `--data` was typed on the command line, before or after the subcommand.
fn data_given(matches: &ArgMatches) -> bool {
    let typed = |m: &ArgMatches| m.value_source("data") == Some(ValueSource::CommandLine);
    typed(matches) || matches.subcommand().is_some_and(|(_, sub)| typed(sub))
}

/// A typed `--data`, then the config's source, then clap's default.
fn data_path(data: &Path, explicit: bool, configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(configured) if !explicit => configured.to_path_buf(),
        _ => data.to_path_buf(),
    }
}

fn run_assets(source: &Path, json: bool) -> Result<()> {
    let assets = list_available_assets(source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&assets)?);
    } else {
        for asset in &assets {
            println!("{asset}");
        }
    }
    Ok(())
}

fn run_prices(source: &Path, assets: &[String]) -> Result<()> {
    let table = fetch_prices(assets, source)?;
    print!("{}", table.to_csv()?);
    Ok(())
}

fn run_backtest_cmd(
    data: &Path,
    data_explicit: bool,
    weights: Option<String>,
    config_path: Option<PathBuf>,
    frequency: Option<Frequency>,
    output_dir: Option<PathBuf>,
    markdown: bool,
) -> Result<()> {
    let mut config = match (config_path, weights) {
        (Some(path), _) => BacktestConfig::from_file(&path)?,
        (None, Some(raw)) => {
            let Some(frequency) = frequency else {
                bail!("--frequency is required with --weights");
            };
            BacktestConfig::new(parse_weights(&raw)?, frequency)
        }
        (None, None) => bail!("one of --weights or --config is required"),
    };
    if let Some(frequency) = frequency {
        config.metrics.frequency = frequency;
    }

    let source = data_path(data, data_explicit, config.data.source.as_deref());
    debug!(source = %source.display(), "resolved price file");
    let result = run_config(&config, &source)?;

    if markdown {
        print!("{}", render_markdown(&result));
    } else {
        println!("{}", export_json(&result)?);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

/// Parse `SPY=0.6,AGG=0.4` (whitespace and a trailing `%` allowed).
///
/// Asset ids are kept as written; they must match the price file's headers.
fn parse_weights(raw: &str) -> Result<WeightMap> {
    let mut weights = WeightMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((asset, value)) = pair.split_once('=') else {
            bail!("expected ASSET=WEIGHT, got '{pair}'");
        };
        let asset = asset.trim().to_string();
        if asset.is_empty() {
            bail!("missing asset name in '{pair}'");
        }
        let weight: f64 = value
            .trim()
            .trim_end_matches('%')
            .parse()
            .with_context(|| format!("invalid weight for {asset}: '{}'", value.trim()))?;
        if weights.insert(asset.clone(), weight).is_some() {
            bail!("asset {asset} given more than once");
        }
    }
    if weights.is_empty() {
        bail!("no weights given");
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weight_pairs() {
        let w = parse_weights("SPY=0.6, AGG = 40%").unwrap();
        assert_eq!(w.get("SPY"), Some(0.6));
        assert_eq!(w.get("AGG"), Some(40.0));

        let w = parse_weights("gold=1,BRK.b=2").unwrap();
        assert_eq!(w.get("gold"), Some(1.0));
        assert_eq!(w.get("BRK.b"), Some(2.0));
        assert_eq!(w.get("GOLD"), None);
    }

    #[test]
    fn lowercase_headers_backtest_through_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, "Date,gold\n2024-01-31,100\n2024-02-29,110\n").unwrap();

        let config = BacktestConfig::new(parse_weights("gold=1").unwrap(), Frequency::Monthly);
        let result = run_config(&config, &path).unwrap();
        assert_eq!(result.assets_used, ["gold"]);
        assert!(result.missing_assets.is_empty());
        assert_eq!(result.num_periods(), 1);
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_weights("SPY").is_err());
        assert!(parse_weights("SPY=abc").is_err());
        assert!(parse_weights("=1").is_err());
        assert!(parse_weights("SPY=1, SPY =2").is_err());
        assert!(parse_weights(" , ").is_err());
    }

    #[test]
    fn data_path_precedence() {
        let cfg = Path::new("cfg.csv");
        let cli = Path::new("cli.csv");
        assert_eq!(data_path(cli, true, Some(cfg)), PathBuf::from("cli.csv"));
        assert_eq!(data_path(cli, false, Some(cfg)), PathBuf::from("cfg.csv"));
        assert_eq!(data_path(cli, false, None), PathBuf::from("cli.csv"));
    }

    fn parse(args: &[&str]) -> (Cli, bool) {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        let explicit = data_given(&matches);
        (Cli::from_arg_matches(&matches).unwrap(), explicit)
    }

    #[test]
    fn data_flag_defaults_and_tracks_its_source() {
        let (cli, explicit) = parse(&["portlab", "assets"]);
        assert_eq!(cli.data, PathBuf::from("prices.csv"));
        assert!(!explicit);

        let (cli, explicit) = parse(&["portlab", "--data", "x.csv", "assets"]);
        assert_eq!(cli.data, PathBuf::from("x.csv"));
        assert!(explicit);

        let (cli, explicit) = parse(&["portlab", "assets", "--data", "y.csv"]);
        assert_eq!(cli.data, PathBuf::from("y.csv"));
        assert!(explicit);

        // The default never shadows a config's source.
        let (cli, explicit) = parse(&["portlab", "backtest", "--config", "run.toml"]);
        let source = data_path(&cli.data, explicit, Some(Path::new("cfg.csv")));
        assert_eq!(source, PathBuf::from("cfg.csv"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn frequency_flag_parses() {
        let cli = Cli::try_parse_from([
            "portlab", "backtest", "--weights", "SPY=1", "--frequency", "monthly",
        ])
        .unwrap();
        match cli.command {
            Commands::Backtest { frequency, .. } => assert_eq!(frequency, Some(Frequency::Monthly)),
            _ => panic!("expected backtest"),
        }
    }

    #[test]
    fn weights_and_config_conflict() {
        assert!(Cli::try_parse_from([
            "portlab", "backtest", "--weights", "SPY=1", "--config", "run.toml",
        ])
        .is_err());
    }
}

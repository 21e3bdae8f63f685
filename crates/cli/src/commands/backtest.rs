//! Backtest CLI command.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use option_insight_backtest::{BacktestConfig, BacktestEngine, SummaryFormatter};
use option_insight_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use option_insight_data::{CsvMarketData, ReportWriter};
use option_insight_strategy::ScanParams;

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Underlying to backtest, overriding `backtest.symbol`
    #[arg(long)]
    pub symbol: Option<String>,

    /// First simulated day (YYYY-MM-DD), overriding `backtest.start`
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last simulated day (YYYY-MM-DD), overriding `backtest.end`
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Runs the backtest command.
///
/// # Errors
/// Returns an error if the window is missing or invalid, the price history
/// cannot be loaded, or the trade list cannot be written.
pub async fn run_backtest(args: BacktestArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from(&args.config)?;
    if let Some(symbol) = args.symbol {
        config.backtest.symbol = symbol;
    }

    let start = args
        .start
        .or(config.backtest.start)
        .ok_or_else(|| anyhow!("backtest start date must be set via --start or backtest.start"))?;
    let end = args
        .end
        .or(config.backtest.end)
        .ok_or_else(|| anyhow!("backtest end date must be set via --end or backtest.end"))?;

    let data = Arc::new(CsvMarketData::new(&config.data.data_dir));
    let engine = BacktestEngine::new(
        data.clone(),
        data,
        ScanParams::from(&config),
        BacktestConfig::from_app(&config, start, end),
    );

    let result = tokio::task::spawn_blocking(move || engine.run())
        .await
        .context("Backtest worker failed")??;

    let path = ReportWriter::new(&config.data.output_dir).write_trades(&result)?;
    println!("{}", SummaryFormatter::format(&result));
    println!("Trades written to {}", path.display());
    Ok(())
}

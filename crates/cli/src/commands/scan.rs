//! Scan CLI command.
//!
//! Evaluates every configured symbol on a bounded pool of blocking workers
//! and writes the combined report to `<output_dir>/report.csv`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use option_insight_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use option_insight_data::{CsvMarketData, ReportWriter};
use option_insight_strategy::{ReportRow, Scanner};
use tokio::sync::Semaphore;
use tracing::info;

/// Arguments for the scan command.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Symbols to scan, overriding the config (e.g., "AAPL,MSFT")
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub symbols: Vec<String>,

    /// Only contracts expiring on this date (YYYY-MM-DD)
    #[arg(long)]
    pub expiration: Option<NaiveDate>,

    /// Valuation date (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Runs the scan command.
///
/// # Errors
/// Returns an error if the configuration is invalid or the report cannot be
/// written. Per-symbol failures are logged and skipped.
pub async fn run_scan(args: ScanArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from(&args.config)?;
    if !args.symbols.is_empty() {
        config.symbols = args.symbols;
    }
    if args.expiration.is_some() {
        config.expiration = args.expiration;
    }
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    info!(
        symbols = config.symbols.len(),
        date = %as_of,
        workers = config.workers,
        data_dir = %config.data.data_dir,
        "Starting scan"
    );

    let provider = Arc::new(CsvMarketData::new(&config.data.data_dir));
    let scanner = Scanner::from_config(provider, &config);
    let rows = scan_parallel(&scanner, &config.symbols, as_of, config.workers).await?;

    let path = ReportWriter::new(&config.data.output_dir).write_report(&rows)?;
    println!("Scanned {} symbols: {} contracts", config.symbols.len(), rows.len());
    println!("Report written to {}", path.display());
    Ok(())
}

/// Scans symbols with at most `workers` running at once.
///
/// Rows keep the order of `symbols`, whatever order the workers finish in.
///
/// # Errors
/// Returns an error if a worker task panics.
pub async fn scan_parallel(
    scanner: &Scanner,
    symbols: &[String],
    as_of: NaiveDate,
    workers: usize,
) -> Result<Vec<ReportRow>> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));

    let handles: Vec<_> = symbols
        .iter()
        .map(|symbol| {
            let scanner = scanner.clone();
            let symbol = symbol.clone();
            let permits = Arc::clone(&permits);
            tokio::spawn(async move {
                let _permit = permits.acquire_owned().await?;
                let rows = tokio::task::spawn_blocking(move || {
                    scanner.scan_symbol_or_skip(&symbol, as_of)
                })
                .await?;
                anyhow::Ok(rows)
            })
        })
        .collect();

    let mut rows = Vec::new();
    for result in futures_util::future::join_all(handles).await {
        rows.extend(result.context("Scan worker failed")??);
    }
    info!(symbols = symbols.len(), rows = rows.len(), "Scan complete");
    Ok(rows)
}

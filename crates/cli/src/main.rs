use clap::{Parser, Subcommand};

mod commands;

use commands::{BacktestArgs, ScanArgs};

#[derive(Parser)]
#[command(name = "option-insight")]
#[command(about = "Option chain scanner and single-leg backtester", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price, score and rank the option chains of the configured symbols
    Scan(ScanArgs),
    /// Replay the entry/exit rules over a historical window
    Backtest(BacktestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    match cli.command {
        Commands::Scan(args) => commands::run_scan(args).await?,
        Commands::Backtest(args) => commands::run_backtest(args).await?,
    }

    Ok(())
}

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use option_insight_backtest::{BacktestConfig, BacktestEngine, SummaryFormatter};
use option_insight_core::{AppConfig, OccSymbol, OptionKind};
use option_insight_data::{CsvMarketData, ReportWriter, REPORT_FILE};
use option_insight_strategy::{ScanParams, Scanner};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn trading_days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn close_on(i: usize) -> Decimal {
    let wiggle = if i % 4 == 0 { dec!(-1.2) } else { dec!(0.4) };
    dec!(100) + dec!(0.3) * Decimal::from(i) + wiggle
}

/// Writes `prices/AAPL.csv` and `chains/AAPL.csv` for Nov 2024 to Feb 2025.
fn write_fixture(dir: &Path) {
    fs::create_dir_all(dir.join("prices")).unwrap();
    fs::create_dir_all(dir.join("chains")).unwrap();

    let days = trading_days(date(2024, 11, 1), date(2025, 2, 28));
    let mut prices = String::from("date,open,high,low,close,volume\n");
    let mut chains = String::from(
        "as_of,contract_id,kind,strike,expiration,last,bid,ask,open_interest,volume,implied_volatility\n",
    );

    for (i, day) in days.iter().enumerate() {
        let close = close_on(i);
        writeln!(prices, "{day},{close},{close},{close},{close},5000").unwrap();

        for expiration in [date(2025, 3, 21), date(2025, 6, 20)] {
            for strike in [dec!(110), dec!(120), dec!(130)] {
                let id = OccSymbol {
                    underlying: "AAPL".to_string(),
                    expiration,
                    kind: OptionKind::Call,
                    strike,
                }
                .to_contract_id();
                let last = (close - strike).max(Decimal::ZERO) + dec!(1.5);
                writeln!(
                    chains,
                    "{day},{id},call,{strike},{expiration},{last},,,400,25,0.28"
                )
                .unwrap();
            }
        }
    }

    fs::write(dir.join("prices/AAPL.csv"), prices).unwrap();
    fs::write(dir.join("chains/AAPL.csv"), chains).unwrap();
}

fn app_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
    config.max_days_to_expiry = Some(200);
    config.data.data_dir = dir.join("data").display().to_string();
    config.data.output_dir = dir.join("output").display().to_string();
    config
}

#[test]
fn scan_from_csv_directory_to_report() {
    let tmp = TempDir::new().unwrap();
    write_fixture(&tmp.path().join("data"));
    let config = app_config(tmp.path());

    let market = Arc::new(CsvMarketData::new(&config.data.data_dir));
    let scanner = Scanner::from_config(market, &config);
    // MSFT has no files and is skipped.
    let rows = scanner.scan(&config.symbols, date(2025, 2, 3));

    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.symbol == "AAPL"));
    assert!(rows.iter().all(|r| r.contract.is_priced()));
    for pair in rows.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let path = ReportWriter::new(&config.data.output_dir)
        .write_report(&rows)
        .unwrap();
    assert!(path.ends_with(REPORT_FILE));
    assert_eq!(fs::read_to_string(path).unwrap().lines().count(), 7);
}

#[test]
fn backtest_from_csv_directory() {
    let tmp = TempDir::new().unwrap();
    write_fixture(&tmp.path().join("data"));
    let config = app_config(tmp.path());
    let (start, end) = (date(2025, 2, 3), date(2025, 2, 28));

    let data = Arc::new(CsvMarketData::new(&config.data.data_dir));
    let engine = BacktestEngine::new(
        data.clone(),
        data,
        ScanParams::from(&config),
        BacktestConfig::from_app(&config, start, end),
    );
    let result = engine.run().unwrap();

    assert!(!result.trades.is_empty());
    for trade in &result.trades {
        assert!(trade.entry_date >= start);
        assert!(trade.entry_date <= trade.exit_date);
        assert!(trade.exit_date <= end);
        // every weekday has a chain row, so every trade is priced
        assert!(trade.pnl.is_some());
    }
    assert_eq!(result.summary.priced_trades, result.summary.num_trades);
    assert!(SummaryFormatter::format(&result).contains("BACKTEST RESULTS"));

    let path = ReportWriter::new(&config.data.output_dir)
        .write_trades(&result)
        .unwrap();
    assert!(path.ends_with("backtest_AAPL_2025-02-03_2025-02-28.csv"));
    let lines = fs::read_to_string(path).unwrap().lines().count();
    assert_eq!(lines, result.trades.len() + 1);
}

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use option_insight_backtest::{
    BacktestConfig, BacktestEngine, BacktestError, ExitReason, SummaryFormatter,
};
use option_insight_core::{
    ChainQuery, DataError, HistoricPricer, MarketDataProvider, OptionContract, OptionKind,
    PriceBar,
};
use option_insight_strategy::ScanParams;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn first_day() -> NaiveDate {
    date(2024, 10, 1)
}

fn is_weekday(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Steadily rising closes with a small repeating wiggle.
fn close_on(day: NaiveDate) -> Decimal {
    let i = (day - first_day()).num_days();
    let wiggle = if i % 3 == 0 { dec!(-0.3) } else { dec!(0.2) };
    dec!(100) + dec!(0.5) * Decimal::from(i) + wiggle
}

struct SyntheticMarket {
    /// Bars exist only from this day on.
    history_from: NaiveDate,
    /// After this day the close falls by 2 per calendar day.
    peak: Option<NaiveDate>,
}

impl SyntheticMarket {
    fn new() -> Self {
        Self {
            history_from: first_day(),
            peak: None,
        }
    }

    fn close(&self, day: NaiveDate) -> Decimal {
        match self.peak {
            Some(peak) if day > peak => {
                close_on(peak) - dec!(2) * Decimal::from((day - peak).num_days())
            }
            _ => close_on(day),
        }
    }
}

impl MarketDataProvider for SyntheticMarket {
    fn price_history(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        if symbol != "AAPL" {
            return Err(DataError::symbol_not_found(symbol));
        }
        let bars: Vec<PriceBar> = self
            .history_from
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| is_weekday(*d))
            .map(|d| {
                let px = self.close(d);
                PriceBar {
                    date: d,
                    open: px,
                    high: px,
                    low: px,
                    close: px,
                    volume: 1_000,
                }
            })
            .collect();
        Ok(bars[bars.len().saturating_sub(lookback_days)..].to_vec())
    }

    fn option_chain(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        query: &ChainQuery,
    ) -> Result<Vec<OptionContract>, DataError> {
        let spot = self.close(as_of).round();
        let mut chain = Vec::new();
        for offset in [14, 45] {
            let expiration = as_of + Duration::days(offset);
            for strike in [spot - dec!(5), spot, spot + dec!(5)] {
                let id = format!("{symbol}-{expiration}-{strike}");
                let mut c = OptionContract::new(symbol, &id, OptionKind::Call, strike, expiration);
                c.last_price = Some(dec!(2.00));
                c.open_interest = 250;
                c.volume = 12;
                chain.push(c);
            }
        }
        Ok(chain.into_iter().filter(|c| query.matches(c, as_of)).collect())
    }
}

/// Knows prices only on even days of the month.
struct EvenDayPricer;

impl HistoricPricer for EvenDayPricer {
    fn price_on_date(&self, _id: &str, date: NaiveDate) -> Result<Option<Decimal>, DataError> {
        Ok((date.day() % 2 == 0).then_some(dec!(3.00)))
    }
}

struct BrokenPricer;

impl HistoricPricer for BrokenPricer {
    fn price_on_date(&self, _id: &str, _date: NaiveDate) -> Result<Option<Decimal>, DataError> {
        Err(DataError::Provider("pricing service down".to_string()))
    }
}

fn config(start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig {
        symbol: "AAPL".to_string(),
        start,
        end,
        lookback_days: 30,
        max_days_to_expiry: Some(60),
    }
}

fn engine(
    pricer: Arc<dyn HistoricPricer>,
    params: ScanParams,
    cfg: BacktestConfig,
) -> BacktestEngine {
    BacktestEngine::new(Arc::new(SyntheticMarket::new()), pricer, params, cfg)
}

#[test]
fn trades_respect_date_invariants() {
    let (start, end) = (date(2025, 2, 3), date(2025, 3, 14));
    let result = engine(Arc::new(EvenDayPricer), ScanParams::default(), config(start, end))
        .run()
        .unwrap();

    assert!(!result.trades.is_empty());
    for trade in &result.trades {
        assert!(trade.entry_date >= start);
        assert!(trade.entry_date <= trade.exit_date);
        assert!(trade.exit_date <= trade.expiration);
        assert!(trade.exit_date <= end);
        assert!(is_weekday(trade.entry_date));
        assert_eq!(trade.days_held, (trade.exit_date - trade.entry_date).num_days());
        assert_eq!(trade.entry_price, Some(dec!(2.00)));
    }
    for pair in result.trades.windows(2) {
        assert!(pair[0].entry_date < pair[1].entry_date);
    }
}

#[test]
fn rising_market_exits_on_overbought_rsi() {
    let (start, end) = (date(2025, 2, 3), date(2025, 2, 28));
    let result = engine(Arc::new(EvenDayPricer), ScanParams::default(), config(start, end))
        .run()
        .unwrap();

    let first = &result.trades[0];
    assert_eq!(first.entry_date, start);
    assert_eq!(first.exit_date, date(2025, 2, 4));
    assert_eq!(first.exit_reason, ExitReason::RsiOverbought);
    assert_eq!(first.pnl, Some(dec!(100)));
    assert_eq!(result.trades[1].entry_date, date(2025, 2, 4));
}

#[test]
fn missing_exit_prices_give_undefined_pnl() {
    let (start, end) = (date(2025, 2, 3), date(2025, 3, 14));
    let result = engine(Arc::new(EvenDayPricer), ScanParams::default(), config(start, end))
        .run()
        .unwrap();

    let mut saw_missing = false;
    for trade in &result.trades {
        if trade.exit_date.day() % 2 == 0 {
            assert_eq!(trade.pnl, Some(dec!(100)));
        } else {
            saw_missing = true;
            assert_eq!(trade.exit_price, None);
            assert_eq!(trade.pnl, None);
        }
    }
    assert!(saw_missing);

    let summary = &result.summary;
    assert_eq!(summary.num_trades, result.trades.len());
    assert_eq!(
        summary.priced_trades,
        result.trades.iter().filter(|t| t.pnl.is_some()).count()
    );
    assert_eq!(summary.losses, 0);
}

#[test]
fn pricer_failures_do_not_stop_the_run() {
    let (start, end) = (date(2025, 2, 3), date(2025, 2, 14));
    let result = engine(Arc::new(BrokenPricer), ScanParams::default(), config(start, end))
        .run()
        .unwrap();

    assert!(result.trades.len() > 1);
    assert!(result.trades.iter().all(|t| t.pnl.is_none()));
    assert_eq!(result.summary.priced_trades, 0);
    assert_eq!(result.summary.average_pnl, None);
}

#[test]
fn without_exit_signal_positions_run_to_horizon() {
    let mut params = ScanParams::default();
    params.technical_filters.rsi_overbought = 101.0;
    let (start, end) = (date(2025, 2, 3), date(2025, 2, 21));
    let result = engine(Arc::new(EvenDayPricer), params, config(start, end))
        .run()
        .unwrap();

    for trade in &result.trades {
        let horizon = trade.expiration.min(end);
        assert_eq!(trade.exit_date, horizon);
        let expected = if horizon == trade.expiration {
            ExitReason::Expiration
        } else {
            ExitReason::HorizonEnd
        };
        assert_eq!(trade.exit_reason, expected);
    }
    let last = result.trades.last().unwrap();
    assert_eq!(last.entry_date, end);
    assert_eq!(last.days_held, 0);
}

#[test]
fn falling_market_exits_on_bearish_crossover() {
    let peak = date(2025, 2, 10);
    let market = SyntheticMarket {
        history_from: first_day(),
        peak: Some(peak),
    };
    let mut params = ScanParams::default();
    params.technical_filters.rsi_overbought = 101.0;
    let (start, end) = (date(2025, 2, 3), date(2025, 3, 14));
    let result = BacktestEngine::new(
        Arc::new(market),
        Arc::new(EvenDayPricer),
        params,
        config(start, end),
    )
    .run()
    .unwrap();

    let bearish: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::EmaBearish)
        .collect();
    assert!(!bearish.is_empty());
    for trade in bearish {
        assert!(trade.exit_date > peak);
        assert!(trade.exit_date <= trade.expiration);
        assert!(trade.exit_date <= end);
        assert!(is_weekday(trade.exit_date));
    }
    assert!(result
        .trades
        .iter()
        .all(|t| t.exit_reason != ExitReason::RsiOverbought));
}

#[test]
fn short_history_yields_no_trades() {
    let market = SyntheticMarket {
        history_from: date(2025, 1, 27),
        peak: None,
    };
    let cfg = config(date(2025, 2, 3), date(2025, 2, 14));
    let result = BacktestEngine::new(
        Arc::new(market),
        Arc::new(EvenDayPricer),
        ScanParams::default(),
        cfg,
    )
    .run()
    .unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.summary.num_trades, 0);
    assert!(SummaryFormatter::format(&result).contains("Total Trades:          0"));
}

#[test]
fn invalid_configuration_is_rejected() {
    let err = engine(
        Arc::new(EvenDayPricer),
        ScanParams::default(),
        config(date(2025, 3, 1), date(2025, 2, 1)),
    )
    .run()
    .unwrap_err();
    assert!(matches!(err, BacktestError::InvalidRange { .. }));

    let mut cfg = config(date(2025, 2, 3), date(2025, 2, 14));
    cfg.symbol = "MSFT".to_string();
    let err = engine(Arc::new(EvenDayPricer), ScanParams::default(), cfg)
        .run()
        .unwrap_err();
    assert!(matches!(err, BacktestError::History(_)));
}

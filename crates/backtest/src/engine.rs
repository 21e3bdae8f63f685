//! Single-leg backtest as a two-state machine.
//!
//! `SeekingEntry` scans one calendar day at a time until the scoring engine
//! yields a contract, which is bought at its market price. `Holding` then
//! steps forward day by day, exiting on an overbought RSI, a bearish EMA
//! crossover, or the horizon (expiration or backtest end). After an exit the
//! search resumes the calendar day after the entry.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use option_insight_core::{
    AppConfig, ChainQuery, DataError, HistoricPricer, MarketDataProvider, PriceBar,
};
use option_insight_signals::compute_indicators;
use option_insight_strategy::{evaluate_symbol, ScanParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::{BacktestSummary, SummaryCalculator};
use crate::trade::{ExitReason, OpenPosition, Trade};

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("backtest start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("lookback must be at least 2 bars")]
    InvalidLookback,

    #[error("price history unavailable: {0}")]
    History(#[from] DataError),
}

/// Window and data settings for one backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Trailing trading bars fed to the analytics each day.
    pub lookback_days: usize,
    pub max_days_to_expiry: Option<i64>,
}

impl BacktestConfig {
    /// Builds a run from the application settings, with explicit dates.
    #[must_use]
    pub fn from_app(config: &AppConfig, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: config.backtest.symbol.to_uppercase(),
            start,
            end,
            lookback_days: config.lookback_days,
            max_days_to_expiry: config.backtest.max_days_to_expiry,
        }
    }
}

/// Trades and summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub trades: Vec<Trade>,
    pub summary: BacktestSummary,
}

enum State {
    SeekingEntry(NaiveDate),
    Holding(OpenPosition),
    Done,
}

enum HoldStep {
    Continue(NaiveDate),
    Exit(NaiveDate, ExitReason),
}

/// Price bars of the run, searchable by date.
struct History {
    bars: Vec<PriceBar>,
}

impl History {
    fn has_bar(&self, day: NaiveDate) -> bool {
        self.bars.binary_search_by_key(&day, |b| b.date).is_ok()
    }

    /// Last `lookback` bars dated on or before `day`.
    fn window(&self, day: NaiveDate, lookback: usize) -> &[PriceBar] {
        let end = self.bars.partition_point(|b| b.date <= day);
        &self.bars[end.saturating_sub(lookback)..end]
    }
}

pub struct BacktestEngine {
    market: Arc<dyn MarketDataProvider>,
    pricer: Arc<dyn HistoricPricer>,
    params: ScanParams,
    config: BacktestConfig,
}

impl BacktestEngine {
    #[must_use]
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        pricer: Arc<dyn HistoricPricer>,
        params: ScanParams,
        config: BacktestConfig,
    ) -> Self {
        Self {
            market,
            pricer,
            params,
            config,
        }
    }

    /// Runs the simulation over `[start, end]`.
    ///
    /// Per-day failures (missing chains, unpriceable days, missing exit
    /// prices) are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or when the price
    /// history cannot be loaded at all.
    pub fn run(&self) -> Result<BacktestResult, BacktestError> {
        let cfg = &self.config;
        if cfg.start > cfg.end {
            return Err(BacktestError::InvalidRange {
                start: cfg.start,
                end: cfg.end,
            });
        }
        if cfg.lookback_days < 2 {
            return Err(BacktestError::InvalidLookback);
        }

        let span = usize::try_from((cfg.end - cfg.start).num_days()).unwrap_or_default();
        let mut bars = self
            .market
            .price_history(&cfg.symbol, cfg.end, cfg.lookback_days + span + 1)?;
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        let history = History { bars };

        info!(
            symbol = %cfg.symbol,
            start = %cfg.start,
            end = %cfg.end,
            bars = history.bars.len(),
            "Starting backtest"
        );

        let mut trades = Vec::new();
        let mut state = State::SeekingEntry(cfg.start);
        loop {
            state = match state {
                State::Done => break,
                State::SeekingEntry(day) if day > cfg.end => State::Done,
                State::SeekingEntry(day) => match self.try_enter(&history, day) {
                    Some(position) => State::Holding(position),
                    None => State::SeekingEntry(day + Duration::days(1)),
                },
                State::Holding(mut position) => match self.hold_step(&history, &position) {
                    HoldStep::Continue(day) => {
                        position.current_day = day;
                        State::Holding(position)
                    }
                    HoldStep::Exit(exit_date, reason) => {
                        let resume = position.entry_date + Duration::days(1);
                        trades.push(self.close(position, exit_date, reason));
                        State::SeekingEntry(resume)
                    }
                },
            };
        }

        let mut calculator = SummaryCalculator::new();
        for trade in &trades {
            calculator.add_trade(trade.pnl);
        }
        let summary = calculator.calculate();
        info!(
            symbol = %cfg.symbol,
            trades = summary.num_trades,
            total_pnl = %summary.total_pnl,
            "Backtest complete"
        );

        Ok(BacktestResult {
            config: cfg.clone(),
            trades,
            summary,
        })
    }

    fn try_enter(&self, history: &History, day: NaiveDate) -> Option<OpenPosition> {
        let cfg = &self.config;
        if !history.has_bar(day) {
            return None;
        }
        let window = history.window(day, cfg.lookback_days);
        if window.len() < cfg.lookback_days {
            debug!(date = %day, bars = window.len(), "Not enough history for entry");
            return None;
        }

        let query = ChainQuery {
            expiration: None,
            max_days_to_expiry: cfg.max_days_to_expiry,
        };
        let chain = match self.market.option_chain(&cfg.symbol, day, &query) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(
                    symbol = %cfg.symbol,
                    date = %day,
                    error = %e,
                    "Option chain unavailable"
                );
                return None;
            }
        };

        let rows = match evaluate_symbol(&cfg.symbol, window, chain, day, &self.params) {
            Ok(rows) => rows,
            Err(reason) => {
                debug!(symbol = %cfg.symbol, date = %day, %reason, "No entry evaluation");
                return None;
            }
        };

        let top = rows.into_iter().next()?;
        let entry_price = top.contract.market_price();
        info!(
            symbol = %cfg.symbol,
            date = %day,
            contract = %top.contract.contract_id,
            name = %top.contract.display_name(),
            score = top.score,
            entry_price = ?entry_price,
            "Entered position"
        );

        Some(OpenPosition {
            contract: top.contract,
            entry_date: day,
            entry_price,
            score: top.score,
            current_day: day,
        })
    }

    fn hold_step(&self, history: &History, position: &OpenPosition) -> HoldStep {
        let horizon = position.horizon(self.config.end);
        if position.current_day >= horizon {
            let reason = if horizon == position.contract.expiration {
                ExitReason::Expiration
            } else {
                ExitReason::HorizonEnd
            };
            return HoldStep::Exit(position.current_day.max(position.entry_date), reason);
        }

        let day = position.current_day + Duration::days(1);
        if !history.has_bar(day) {
            return HoldStep::Continue(day);
        }

        let window = history.window(day, self.config.lookback_days);
        let indicators = compute_indicators(window, &self.params.indicators);
        let Some(latest) = indicators.latest() else {
            return HoldStep::Continue(day);
        };

        if latest
            .rsi
            .is_some_and(|rsi| rsi >= self.params.technical_filters.rsi_overbought)
        {
            HoldStep::Exit(day, ExitReason::RsiOverbought)
        } else if latest.ema_bullish == Some(false) {
            HoldStep::Exit(day, ExitReason::EmaBearish)
        } else {
            HoldStep::Continue(day)
        }
    }

    fn close(&self, position: OpenPosition, exit_date: NaiveDate, reason: ExitReason) -> Trade {
        let contract_id = position.contract.contract_id.clone();
        let exit_price = match self.pricer.price_on_date(&contract_id, exit_date) {
            Ok(price) => price,
            Err(e) => {
                warn!(
                    contract = %contract_id,
                    date = %exit_date,
                    error = %e,
                    "Exit price lookup failed"
                );
                None
            }
        };
        if exit_price.is_none() {
            debug!(contract = %contract_id, date = %exit_date, "No exit price recorded");
        }

        let trade = Trade::close(position, exit_date, exit_price, reason);
        info!(
            contract = %trade.contract_id,
            date = %exit_date,
            reason = %reason,
            pnl = ?trade.pnl,
            "Closed position"
        );
        trade
    }
}

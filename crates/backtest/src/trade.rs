use chrono::NaiveDate;
use option_insight_core::{OptionContract, OptionKind, CONTRACT_MULTIPLIER};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    RsiOverbought,
    EmaBearish,
    Expiration,
    /// Backtest window ended before any other exit.
    HorizonEnd,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RsiOverbought => write!(f, "rsi_overbought"),
            Self::EmaBearish => write!(f, "ema_bearish"),
            Self::Expiration => write!(f, "expiration"),
            Self::HorizonEnd => write!(f, "horizon_end"),
        }
    }
}

/// A position opened while seeking entry and not yet closed.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub contract: OptionContract,
    pub entry_date: NaiveDate,
    pub entry_price: Option<Decimal>,
    pub score: u8,
    /// Last simulated day while holding.
    pub current_day: NaiveDate,
}

impl OpenPosition {
    /// Last day the position may be held: expiration or the backtest end.
    #[must_use]
    pub fn horizon(&self, end: NaiveDate) -> NaiveDate {
        self.contract.expiration.min(end)
    }
}

/// One completed round trip of a single contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub contract_id: String,
    pub kind: OptionKind,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub entry_date: NaiveDate,
    pub entry_price: Option<Decimal>,
    pub exit_date: NaiveDate,
    pub exit_price: Option<Decimal>,
    /// `(exit - entry) * 100`, undefined when either price is missing.
    pub pnl: Option<Decimal>,
    pub days_held: i64,
    pub score: u8,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Seals an open position at `exit_date`.
    #[must_use]
    pub fn close(
        position: OpenPosition,
        exit_date: NaiveDate,
        exit_price: Option<Decimal>,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl = match (position.entry_price, exit_price) {
            (Some(entry), Some(exit)) => Some((exit - entry) * CONTRACT_MULTIPLIER),
            _ => None,
        };
        let contract = position.contract;
        Self {
            symbol: contract.underlying,
            contract_id: contract.contract_id,
            kind: contract.kind,
            strike: contract.strike,
            expiration: contract.expiration,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date,
            exit_price,
            pnl,
            days_held: (exit_date - position.entry_date).num_days(),
            score: position.score,
            exit_reason,
        }
    }

    #[must_use]
    pub fn is_win(&self) -> bool {
        self.pnl.is_some_and(|p| p > Decimal::ZERO)
    }
}

//! Shared data model for option chain evaluation.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Shares controlled by one standard US equity option contract.
pub const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// Calendar days per year used to turn days-to-expiry into model time.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// One trading day of underlying price action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl PriceBar {
    /// Close as `f64` for the numeric engines.
    ///
    /// Returns `NaN` for a close that cannot be represented, which the
    /// estimators treat as a missing value.
    #[must_use]
    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(f64::NAN)
    }
}

/// Extracts the closes of a bar sequence, preserving order.
#[must_use]
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(PriceBar::close_f64).collect()
}

/// Option contract right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(format!("invalid option kind: {other}")),
        }
    }
}

/// First-order sensitivities plus gamma.
///
/// Theta is per year (the full time derivative, not divided by 365).
/// Vega is per one volatility point (scaled by 0.01).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Days-to-expiry range a contract falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryBucket {
    /// Expires within a week.
    Week,
    /// 8 to 30 days.
    Month,
    /// 31 to 60 days.
    TwoMonths,
    /// More than 60 days.
    Long,
}

impl ExpiryBucket {
    #[must_use]
    pub const fn from_days(days: i64) -> Self {
        if days <= 7 {
            Self::Week
        } else if days <= 30 {
            Self::Month
        } else if days <= 60 {
            Self::TwoMonths
        } else {
            Self::Long
        }
    }
}

impl std::fmt::Display for ExpiryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Week => write!(f, "0-7"),
            Self::Month => write!(f, "8-30"),
            Self::TwoMonths => write!(f, "31-60"),
            Self::Long => write!(f, "60+"),
        }
    }
}

/// One tradable contract from an option chain.
///
/// The valuation fields start empty and are filled in by chain pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying: String,
    pub contract_id: String,
    pub kind: OptionKind,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub last_price: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub open_interest: u64,
    pub volume: u64,
    pub implied_volatility: Option<f64>,
    /// Model time to expiry in years, set when the contract is priced.
    pub time_to_expiry: Option<f64>,
    pub theoretical_price: Option<f64>,
    /// Market price minus theoretical price.
    pub mispricing: Option<f64>,
    pub greeks: Option<Greeks>,
}

impl OptionContract {
    /// Creates an unpriced contract with no quotes.
    #[must_use]
    pub fn new(
        underlying: &str,
        contract_id: &str,
        kind: OptionKind,
        strike: Decimal,
        expiration: NaiveDate,
    ) -> Self {
        Self {
            underlying: underlying.to_uppercase(),
            contract_id: contract_id.to_string(),
            kind,
            strike,
            expiration,
            last_price: None,
            bid: None,
            ask: None,
            open_interest: 0,
            volume: 0,
            implied_volatility: None,
            time_to_expiry: None,
            theoretical_price: None,
            mispricing: None,
            greeks: None,
        }
    }

    /// Bid/ask midpoint when both sides are quoted.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Last traded price, falling back to the quote midpoint.
    #[must_use]
    pub fn market_price(&self) -> Option<Decimal> {
        self.last_price.or_else(|| self.mid_price())
    }

    /// Calendar days from `as_of` until expiration (negative once expired).
    #[must_use]
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiration - as_of).num_days()
    }

    #[must_use]
    pub fn expiry_bucket(&self, as_of: NaiveDate) -> ExpiryBucket {
        ExpiryBucket::from_days(self.days_to_expiry(as_of))
    }

    /// Strike as `f64` for the pricing model.
    #[must_use]
    pub fn strike_f64(&self) -> f64 {
        self.strike.to_f64().unwrap_or(f64::NAN)
    }

    /// Whether chain pricing produced a theoretical value for this contract.
    #[must_use]
    pub const fn is_priced(&self) -> bool {
        self.theoretical_price.is_some()
    }

    /// Human-readable description (e.g., "AAPL 150 call 2025-01-17").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {} {}",
            self.underlying, self.strike, self.kind, self.expiration
        )
    }
}

/// Chain selection applied by the market-data provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainQuery {
    /// Only contracts expiring on this date.
    pub expiration: Option<NaiveDate>,
    /// Only contracts expiring within this many days of the as-of date.
    pub max_days_to_expiry: Option<i64>,
}

impl ChainQuery {
    /// Whether a contract observed on `as_of` passes this query.
    #[must_use]
    pub fn matches(&self, contract: &OptionContract, as_of: NaiveDate) -> bool {
        if let Some(expiration) = self.expiration {
            if contract.expiration != expiration {
                return false;
            }
        }
        if let Some(max_days) = self.max_days_to_expiry {
            if contract.days_to_expiry(as_of) > max_days {
                return false;
            }
        }
        true
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::DataError;
use crate::types::{ChainQuery, OptionContract, PriceBar};

/// Source of underlying price history and option chains.
///
/// Implementations must be safe to share across the symbol worker pool.
pub trait MarketDataProvider: Send + Sync {
    /// Returns up to `lookback_days` trading bars dated on or before `end`,
    /// oldest first.
    fn price_history(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: usize,
    ) -> Result<Vec<PriceBar>, DataError>;

    /// Returns the option chain observed on `as_of`, restricted by `query`
    /// and to contracts that traded at least once.
    fn option_chain(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        query: &ChainQuery,
    ) -> Result<Vec<OptionContract>, DataError>;
}

/// Looks up what a specific contract was worth on a past date.
pub trait HistoricPricer: Send + Sync {
    /// Returns `Ok(None)` when the contract has no recorded price that day.
    fn price_on_date(&self, contract_id: &str, date: NaiveDate)
        -> Result<Option<Decimal>, DataError>;
}

//! Chain valuation: model prices, mispricing, and Greeks for every contract.

use chrono::NaiveDate;
use option_insight_core::{OptionContract, DAYS_PER_YEAR};
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::pricing::black_scholes_greeks;

/// Implied volatility assumed when a whole chain reports none.
pub const DEFAULT_IMPLIED_VOLATILITY: f64 = 0.5;

/// Market inputs shared by every contract in one chain.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext {
    /// Latest underlying close.
    pub spot: f64,
    /// Annualized historical volatility of the underlying.
    pub sigma: f64,
    pub risk_free_rate: f64,
    pub valuation_date: NaiveDate,
}

/// Replaces missing implied volatilities with the mean of the reported ones,
/// or [`DEFAULT_IMPLIED_VOLATILITY`] when none are reported.
///
/// Returns the fill value used.
pub fn fill_missing_iv(contracts: &mut [OptionContract]) -> f64 {
    let reported: Vec<f64> = contracts
        .iter()
        .filter_map(|c| c.implied_volatility)
        .filter(|iv| iv.is_finite())
        .collect();

    let fill = if reported.is_empty() {
        DEFAULT_IMPLIED_VOLATILITY
    } else {
        reported.iter().sum::<f64>() / reported.len() as f64
    };

    for contract in contracts.iter_mut() {
        if !contract.implied_volatility.is_some_and(f64::is_finite) {
            contract.implied_volatility = Some(fill);
        }
    }
    fill
}

/// Prices one contract in place.
///
/// Contracts at or past expiration, or whose inputs the model rejects, are
/// left with all valuation fields cleared. Returns whether the contract was
/// priced.
pub fn price_contract(contract: &mut OptionContract, ctx: &PricingContext) -> bool {
    contract.time_to_expiry = None;
    contract.theoretical_price = None;
    contract.mispricing = None;
    contract.greeks = None;

    let days = contract.days_to_expiry(ctx.valuation_date);
    if days <= 0 {
        debug!(contract = %contract.contract_id, days, "Skipping expired contract");
        return false;
    }

    let time = days as f64 / DAYS_PER_YEAR;
    let Some(priced) = black_scholes_greeks(
        ctx.spot,
        contract.strike_f64(),
        time,
        ctx.risk_free_rate,
        ctx.sigma,
        contract.kind,
    ) else {
        debug!(contract = %contract.contract_id, "Model inputs rejected");
        return false;
    };

    contract.time_to_expiry = Some(time);
    contract.theoretical_price = Some(priced.price);
    contract.mispricing = contract
        .market_price()
        .and_then(|p| p.to_f64())
        .map(|market| market - priced.price);
    contract.greeks = Some(priced.greeks);
    true
}

/// Prices every contract in the chain. Returns how many were priced.
pub fn price_chain(contracts: &mut [OptionContract], ctx: &PricingContext) -> usize {
    let priced = contracts
        .iter_mut()
        .map(|c| price_contract(c, ctx))
        .filter(|ok| *ok)
        .count();
    debug!(
        contracts = contracts.len(),
        priced,
        spot = ctx.spot,
        sigma = ctx.sigma,
        "Priced option chain"
    );
    priced
}

//! Option valuation.
//!
//! - [`pricing`]: Black-Scholes prices and Greeks for a single option
//! - [`chain`]: applies the model across a whole option chain

pub mod chain;
pub mod pricing;

pub use chain::{
    fill_missing_iv, price_chain, price_contract, PricingContext, DEFAULT_IMPLIED_VOLATILITY,
};
pub use pricing::{
    black_scholes, black_scholes_greeks, norm_cdf, norm_pdf, PricedOption, MIN_TIME_TO_EXPIRY,
    VEGA_SCALE,
};

//! Per-symbol evaluation shared by the live scanner and the backtest.

use chrono::NaiveDate;
use option_insight_core::{
    closes, AppConfig, DataError, FilterConfig, IndicatorConfig, OptionContract, PriceBar,
    TechFilterConfig, VolatilityConfig,
};
use option_insight_options::{fill_missing_iv, price_chain, PricingContext};
use option_insight_signals::{compute_indicators, historical_volatility};
use thiserror::Error;
use tracing::debug;

use crate::report::{generate_report, ReportRow};

/// Why a symbol (or backtest day) produced no report.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("insufficient price history ({bars} bars)")]
    InsufficientHistory { bars: usize },

    #[error("historical volatility undefined")]
    UndefinedVolatility,

    #[error("no option contracts")]
    EmptyChain,

    #[error("no contract could be priced")]
    NoPricedContracts,

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Analytics settings for one evaluation, taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub risk_free_rate: f64,
    pub volatility: VolatilityConfig,
    pub indicators: IndicatorConfig,
    pub filters: FilterConfig,
    pub technical_filters: TechFilterConfig,
}

impl From<&AppConfig> for ScanParams {
    fn from(config: &AppConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            volatility: config.volatility.clone(),
            indicators: config.indicators.clone(),
            filters: config.filters.clone(),
            technical_filters: config.technical_filters.clone(),
        }
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runs volatility, indicators, chain pricing, and scoring for one symbol.
///
/// `bars` is the price window ending on `valuation_date` (oldest first) and
/// `chain` the contracts observed that day.
///
/// # Errors
///
/// Returns a [`SkipReason`] when the inputs cannot support an evaluation.
/// An empty `Ok` report means everything was evaluated and nothing passed
/// the filters.
pub fn evaluate_symbol(
    symbol: &str,
    bars: &[PriceBar],
    mut chain: Vec<OptionContract>,
    valuation_date: NaiveDate,
    params: &ScanParams,
) -> Result<Vec<ReportRow>, SkipReason> {
    if bars.len() < 2 {
        return Err(SkipReason::InsufficientHistory { bars: bars.len() });
    }

    let closes = closes(bars);
    let spot = closes
        .iter()
        .rev()
        .copied()
        .find(|c| c.is_finite())
        .ok_or(SkipReason::InsufficientHistory { bars: bars.len() })?;

    let sigma = historical_volatility(
        &closes,
        params.volatility.window,
        params.volatility.trading_days_per_year,
    )
    .ok_or(SkipReason::UndefinedVolatility)?;

    let indicators = compute_indicators(bars, &params.indicators);

    if chain.is_empty() {
        return Err(SkipReason::EmptyChain);
    }

    let iv_fill = fill_missing_iv(&mut chain);
    let ctx = PricingContext {
        spot,
        sigma,
        risk_free_rate: params.risk_free_rate,
        valuation_date,
    };
    if price_chain(&mut chain, &ctx) == 0 {
        return Err(SkipReason::NoPricedContracts);
    }

    debug!(
        symbol,
        date = %valuation_date,
        spot,
        sigma,
        iv_fill,
        "Evaluating priced chain"
    );

    let mut rows = generate_report(
        symbol,
        &chain,
        &indicators,
        &params.filters,
        &params.technical_filters,
    );
    for row in &mut rows {
        row.stamp_expiry(valuation_date);
    }
    Ok(rows)
}

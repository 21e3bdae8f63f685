//! Price-series analytics: historical volatility and the technical
//! indicator table consumed by the scoring engine and the backtest.

pub mod indicators;
mod stats;
pub mod volatility;

pub use indicators::{
    compute_indicators, ema, FibLevel, IndicatorSnapshot, IndicatorTable, BOLLINGER_PERIOD,
    EMA_WARMUP, FIB_RATIOS, RSI_PERIOD,
};
pub use volatility::{historical_volatility, TRADING_DAYS_PER_YEAR};

use anyhow::{ensure, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tickers to scan.
    pub symbols: Vec<String>,
    /// Restrict scans to a single expiration date.
    pub expiration: Option<NaiveDate>,
    /// Restrict scans to contracts expiring within this many days.
    pub max_days_to_expiry: Option<i64>,
    /// Trading bars of history used for volatility and indicators.
    pub lookback_days: usize,
    /// Annualized, continuously compounded.
    pub risk_free_rate: f64,
    /// Size of the symbol worker pool.
    pub workers: usize,
    pub volatility: VolatilityConfig,
    pub indicators: IndicatorConfig,
    pub filters: FilterConfig,
    pub technical_filters: TechFilterConfig,
    pub data: DataConfig,
    pub backtest: BacktestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Number of log returns in the rolling window.
    pub window: usize,
    pub trading_days_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trailing closes used for Fibonacci levels; whole series when unset.
    pub fib_window: Option<usize>,
}

/// Option-level thresholds plus the trend position thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum absolute delta.
    pub min_delta: f64,
    /// Maximum (per-year) theta.
    pub max_theta: f64,
    pub min_iv: f64,
    pub min_open_interest: u64,
    /// Minimum Bollinger position (0 = lower band, 1 = upper band) for `trend_pass`.
    pub bb_position_pct: f64,
    /// Minimum RSI / 100 for `trend_pass`.
    pub rsi_position_pct: f64,
}

/// Price-action thresholds for Bollinger break filters and exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechFilterConfig {
    /// Keep contracts only when close is at or below the lower band.
    pub bb_break_lower: bool,
    /// Keep contracts only when close is at or above the upper band.
    pub bb_break_upper: bool,
    /// Fractional slack applied to the band in break mode.
    pub bb_tolerance: f64,
    /// Reserved; validated but not used as an entry filter.
    pub rsi_oversold: f64,
    /// RSI at or above this closes a backtest position.
    pub rsi_overbought: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root holding `prices/` and `chains/` CSV files.
    pub data_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub max_days_to_expiry: Option<i64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            expiration: None,
            max_days_to_expiry: None,
            lookback_days: 30,
            risk_free_rate: 0.03,
            workers: 4,
            volatility: VolatilityConfig::default(),
            indicators: IndicatorConfig::default(),
            filters: FilterConfig::default(),
            technical_filters: TechFilterConfig::default(),
            data: DataConfig::default(),
            backtest: BacktestSettings::default(),
        }
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            trading_days_per_year: 252,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 26,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            fib_window: Some(30),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_delta: 0.0,
            max_theta: 0.0,
            min_iv: 0.0,
            min_open_interest: 0,
            bb_position_pct: 0.5,
            rsi_position_pct: 0.5,
        }
    }
}

impl Default for TechFilterConfig {
    fn default() -> Self {
        Self {
            bb_break_lower: false,
            bb_break_upper: false,
            bb_tolerance: 0.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            start: None,
            end: None,
            max_days_to_expiry: Some(60),
        }
    }
}

impl AppConfig {
    /// Rejects settings the engines cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.lookback_days >= 2, "lookback_days must be at least 2");
        ensure!(self.workers > 0, "workers must be positive");
        ensure!(self.volatility.window > 0, "volatility.window must be positive");
        ensure!(
            self.volatility.trading_days_per_year > 0,
            "volatility.trading_days_per_year must be positive"
        );

        let ind = &self.indicators;
        ensure!(
            [ind.ema_fast, ind.ema_slow, ind.macd_fast, ind.macd_slow, ind.macd_signal]
                .iter()
                .all(|span| *span > 0),
            "indicator spans must be positive"
        );
        ensure!(
            ind.fib_window != Some(0),
            "indicators.fib_window must be positive when set"
        );

        let tech = &self.technical_filters;
        ensure!(
            (0.0..=100.0).contains(&tech.rsi_oversold)
                && (0.0..=100.0).contains(&tech.rsi_overbought),
            "RSI thresholds must lie in [0, 100]"
        );
        ensure!(tech.bb_tolerance >= 0.0, "bb_tolerance must be non-negative");

        if let (Some(start), Some(end)) = (self.backtest.start, self.backtest.end) {
            ensure!(start <= end, "backtest.start must not be after backtest.end");
        }

        Ok(())
    }
}

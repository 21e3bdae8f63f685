//! Filter and score a priced option chain against the latest indicators.
//!
//! Stages, in order:
//! 1. broadcast the latest indicator row onto every contract
//! 2. normalize Bollinger and RSI positions and evaluate the trend gate
//! 3. optional Bollinger break filters
//! 4. option threshold filters (delta, theta, IV, open interest)
//! 5. composite score and ranking

use std::cmp::Ordering;

use chrono::NaiveDate;
use option_insight_core::{ExpiryBucket, FilterConfig, OptionContract, TechFilterConfig};
use option_insight_signals::{IndicatorSnapshot, IndicatorTable};
use serde::Serialize;
use tracing::debug;

/// Neutral position used when a normalized signal cannot be computed.
pub const NEUTRAL_POSITION: f64 = 0.5;

const MIN_BAND_WIDTH: f64 = 1e-12;

/// A contract that survived filtering, with its signal context and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub symbol: String,
    pub contract: OptionContract,
    pub close: Option<f64>,
    pub rsi: Option<f64>,
    pub upper_bb: Option<f64>,
    pub lower_bb: Option<f64>,
    pub ema_bullish: bool,
    pub macd_hist: f64,
    /// Close position inside the Bollinger band (0 = lower, 1 = upper).
    pub bb_norm: f64,
    pub rsi_norm: f64,
    pub trend_pass: bool,
    /// Close, RSI, or a band was undefined on the latest row.
    pub missing_signal: bool,
    pub score: u8,
    /// Calendar days to expiration, relative to the valuation date.
    pub days_to_expiry: Option<i64>,
    pub expiry_bucket: Option<ExpiryBucket>,
}

impl ReportRow {
    /// Sets the days-to-expiry and bucket of the row's contract as of `as_of`.
    pub fn stamp_expiry(&mut self, as_of: NaiveDate) {
        self.days_to_expiry = Some(self.contract.days_to_expiry(as_of));
        self.expiry_bucket = Some(self.contract.expiry_bucket(as_of));
    }
}

/// Which option thresholds a contract meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterChecks {
    pub delta: bool,
    pub theta: bool,
    pub iv: bool,
    pub open_interest: bool,
}

impl FilterChecks {
    /// Evaluates the thresholds, or `None` when delta, theta, or IV is missing.
    #[must_use]
    pub fn evaluate(contract: &OptionContract, filters: &FilterConfig) -> Option<Self> {
        let greeks = contract.greeks?;
        let iv = contract.implied_volatility.filter(|v| v.is_finite())?;
        if !greeks.delta.is_finite() || !greeks.theta.is_finite() {
            return None;
        }

        Some(Self {
            delta: greeks.delta.abs() >= filters.min_delta,
            theta: greeks.theta <= filters.max_theta,
            iv: iv >= filters.min_iv,
            open_interest: contract.open_interest >= filters.min_open_interest,
        })
    }

    #[must_use]
    pub const fn all_met(&self) -> bool {
        self.delta && self.theta && self.iv && self.open_interest
    }
}

/// Unweighted composite score: one point per satisfied condition.
#[must_use]
pub fn score_contract(ema_bullish: bool, macd_hist: f64, checks: &FilterChecks) -> u8 {
    [
        ema_bullish,
        macd_hist > 0.0,
        checks.delta,
        checks.theta,
        checks.iv,
        checks.open_interest,
    ]
    .into_iter()
    .map(u8::from)
    .sum()
}

/// `(close - lower) / (upper - lower)`, neutral when undefined or the band
/// has collapsed.
#[must_use]
pub fn bollinger_position(close: Option<f64>, upper: Option<f64>, lower: Option<f64>) -> f64 {
    match (close, upper, lower) {
        (Some(c), Some(u), Some(l)) if (u - l).abs() > MIN_BAND_WIDTH => {
            let pos = (c - l) / (u - l);
            if pos.is_finite() {
                pos
            } else {
                NEUTRAL_POSITION
            }
        }
        _ => NEUTRAL_POSITION,
    }
}

/// RSI scaled to `[0, 1]`, neutral when undefined.
#[must_use]
pub fn rsi_position(rsi: Option<f64>) -> f64 {
    rsi.filter(|r| r.is_finite())
        .map_or(NEUTRAL_POSITION, |r| r / 100.0)
}

/// Whether the latest close passes the enabled Bollinger break filters.
///
/// A filter whose close or band is undefined does not apply.
#[must_use]
pub fn passes_band_break(latest: &IndicatorSnapshot, tech: &TechFilterConfig) -> bool {
    if tech.bb_break_lower {
        if let (Some(close), Some(lower)) = (latest.close, latest.lower_bb) {
            if close > lower * (1.0 + tech.bb_tolerance) {
                return false;
            }
        }
    }
    if tech.bb_break_upper {
        if let (Some(close), Some(upper)) = (latest.close, latest.upper_bb) {
            if close < upper * (1.0 - tech.bb_tolerance) {
                return false;
            }
        }
    }
    true
}

/// Orders rows by score, then mispricing, both descending. Missing
/// mispricing sorts last.
pub fn rank_rows(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| {
            match (a.contract.mispricing, b.contract.mispricing) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    });
}

/// Builds the ranked report for one symbol.
///
/// Returns an empty report when there are no contracts or no indicator rows.
#[must_use]
pub fn generate_report(
    symbol: &str,
    contracts: &[OptionContract],
    indicators: &IndicatorTable,
    filters: &FilterConfig,
    tech: &TechFilterConfig,
) -> Vec<ReportRow> {
    let Some(latest) = indicators.latest() else {
        return Vec::new();
    };
    if contracts.is_empty() {
        return Vec::new();
    }

    let missing_signal = !latest.has_core_signals();
    let ema_bullish = latest.ema_bullish.unwrap_or(false);
    let macd_hist = latest.macd_hist.filter(|h| h.is_finite()).unwrap_or(0.0);
    let bb_norm = bollinger_position(latest.close, latest.upper_bb, latest.lower_bb);
    let rsi_norm = rsi_position(latest.rsi);
    let trend_pass = bb_norm >= filters.bb_position_pct && rsi_norm >= filters.rsi_position_pct;

    if !passes_band_break(latest, tech) {
        debug!(symbol, close = ?latest.close, "Bollinger break filter rejected symbol");
        return Vec::new();
    }

    let mut rows: Vec<ReportRow> = contracts
        .iter()
        .filter_map(|contract| {
            let checks = FilterChecks::evaluate(contract, filters)?;
            if !checks.all_met() {
                return None;
            }
            Some(ReportRow {
                symbol: symbol.to_string(),
                contract: contract.clone(),
                close: latest.close,
                rsi: latest.rsi,
                upper_bb: latest.upper_bb,
                lower_bb: latest.lower_bb,
                ema_bullish,
                macd_hist,
                bb_norm,
                rsi_norm,
                trend_pass,
                missing_signal,
                score: score_contract(ema_bullish, macd_hist, &checks),
                days_to_expiry: None,
                expiry_bucket: None,
            })
        })
        .collect();

    rank_rows(&mut rows);
    debug!(
        symbol,
        contracts = contracts.len(),
        kept = rows.len(),
        "Generated report"
    );
    rows
}

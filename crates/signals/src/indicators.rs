//! Technical indicator table built from daily price bars.
//!
//! Produces one [`IndicatorSnapshot`] per bar:
//! - Bollinger bands: 20-bar SMA ± 2 sample standard deviations
//! - RSI(14): simple rolling means of gains and losses
//! - EMA crossover and MACD family, published once 20 bars exist
//! - Fibonacci retracement levels over a trailing close window
//!
//! Values that cannot be computed yet are `None`.

use chrono::NaiveDate;
use option_insight_core::{IndicatorConfig, PriceBar};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::stats::{defined_window, mean, sample_std};

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;
/// Bars required before EMA-derived fields are published.
pub const EMA_WARMUP: usize = 20;
pub const FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

/// One Fibonacci retracement level and the close's proximity to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub level: Option<f64>,
    /// `|close - level| / level`.
    pub distance: Option<f64>,
}

/// Indicator values for a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub ma20: Option<f64>,
    pub upper_bb: Option<f64>,
    pub lower_bb: Option<f64>,
    pub rsi: Option<f64>,
    /// Fast EMA above slow EMA.
    pub ema_bullish: Option<bool>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub fib: [FibLevel; 5],
}

impl IndicatorSnapshot {
    /// Whether close, RSI, and both bands are all defined.
    #[must_use]
    pub const fn has_core_signals(&self) -> bool {
        self.close.is_some()
            && self.rsi.is_some()
            && self.upper_bb.is_some()
            && self.lower_bb.is_some()
    }
}

/// Chronological indicator rows, one per input bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    rows: Vec<IndicatorSnapshot>,
}

impl IndicatorTable {
    /// Wraps precomputed rows, oldest first.
    #[must_use]
    pub fn from_rows(rows: Vec<IndicatorSnapshot>) -> Self {
        Self { rows }
    }

    /// Most recent row.
    #[must_use]
    pub fn latest(&self) -> Option<&IndicatorSnapshot> {
        self.rows.last()
    }

    #[must_use]
    pub fn rows(&self) -> &[IndicatorSnapshot] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded with the
/// first defined value and without bias adjustment.
///
/// Missing inputs carry the previous average forward; positions before the
/// first defined value are `None`.
#[must_use]
pub fn ema(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current: Option<f64> = None;
    values
        .iter()
        .map(|value| {
            current = match (current, value) {
                (None, v) => *v,
                (Some(prev), Some(v)) => Some(alpha * v + (1.0 - alpha) * prev),
                (Some(prev), None) => Some(prev),
            };
            current
        })
        .collect()
}

/// Relative strength index from simple average gain and loss.
///
/// Zero loss with positive gain gives 100; a window with neither gains nor
/// losses is undefined.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

fn rsi_series(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    let diffs: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|w| Some(w[1]? - w[0]?)))
        .collect();

    (0..closes.len())
        .map(|i| {
            let window = defined_window(&diffs, i, RSI_PERIOD)?;
            let gain = mean(&window.iter().map(|d| d.max(0.0)).collect::<Vec<_>>())?;
            let loss = mean(&window.iter().map(|d| (-d).max(0.0)).collect::<Vec<_>>())?;
            rsi_from_averages(gain, loss)
        })
        .collect()
}

/// Fibonacci levels over the trailing `window` defined closes.
fn fib_levels(closes: &[Option<f64>], window: Option<usize>) -> [Option<f64>; 5] {
    let defined: Vec<f64> = closes.iter().flatten().copied().collect();
    let start = window.map_or(0, |w| defined.len().saturating_sub(w));
    let tail = &defined[start..];

    let (Some(lo), Some(hi)) = (
        tail.iter().copied().reduce(f64::min),
        tail.iter().copied().reduce(f64::max),
    ) else {
        return [None; 5];
    };

    FIB_RATIOS.map(|ratio| Some(hi - (hi - lo) * ratio))
}

fn published(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i + 1 >= EMA_WARMUP { v } else { None })
        .collect()
}

/// Computes the full indicator table for `bars` (oldest first).
///
/// Pure function of its input: the same bars always yield the same table.
#[must_use]
pub fn compute_indicators(bars: &[PriceBar], config: &IndicatorConfig) -> IndicatorTable {
    if bars.is_empty() {
        return IndicatorTable::default();
    }

    let closes: Vec<Option<f64>> = bars
        .iter()
        .map(|bar| Some(bar.close_f64()).filter(|c| c.is_finite()))
        .collect();

    let rsi = rsi_series(&closes);

    let ema_fast = ema(&closes, config.ema_fast);
    let ema_slow = ema(&closes, config.ema_slow);
    let macd_fast = ema(&closes, config.macd_fast);
    let macd_slow = ema(&closes, config.macd_slow);
    let macd_line: Vec<Option<f64>> = macd_fast
        .iter()
        .zip(&macd_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema(&macd_line, config.macd_signal);
    let hist: Vec<Option<f64>> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    let macd_line = published(macd_line);
    let signal_line = published(signal_line);
    let hist = published(hist);

    let levels = fib_levels(&closes, config.fib_window);

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let close = closes[i];
            let bands = defined_window(&closes, i, BOLLINGER_PERIOD).and_then(|window| {
                let ma = mean(&window)?;
                let std = sample_std(&window)?;
                Some((ma, ma + BOLLINGER_WIDTH * std, ma - BOLLINGER_WIDTH * std))
            });

            let ema_bullish = if i + 1 >= EMA_WARMUP {
                match (ema_fast[i], ema_slow[i]) {
                    (Some(fast), Some(slow)) => Some(fast > slow),
                    _ => None,
                }
            } else {
                None
            };

            let fib = std::array::from_fn(|k| {
                let level = levels[k];
                FibLevel {
                    ratio: FIB_RATIOS[k],
                    level,
                    distance: match (close, level) {
                        (Some(c), Some(l)) if l != 0.0 => Some((c - l).abs() / l),
                        _ => None,
                    },
                }
            });

            IndicatorSnapshot {
                date: bar.date,
                close,
                ma20: bands.map(|b| b.0),
                upper_bb: bands.map(|b| b.1),
                lower_bb: bands.map(|b| b.2),
                rsi: rsi[i],
                ema_bullish,
                macd: macd_line[i],
                macd_signal: signal_line[i],
                macd_hist: hist[i],
                fib,
            }
        })
        .collect::<Vec<_>>();

    trace!(
        bars = bars.len(),
        from = %bars[0].date,
        to = %bars[bars.len() - 1].date,
        "Computed indicator table"
    );
    IndicatorTable { rows }
}

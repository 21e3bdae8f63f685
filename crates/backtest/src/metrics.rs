use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over the trades of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub num_trades: usize,
    /// Trades with a defined PnL.
    pub priced_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: Decimal,
    pub average_pnl: Option<Decimal>,
    /// Wins over priced trades.
    pub win_rate: f64,
    /// Largest peak-to-trough decline of cumulative PnL, in dollars.
    pub max_drawdown: Decimal,
}

/// Accumulates trade PnL in order and derives a [`BacktestSummary`].
///
/// Trades with undefined PnL count toward `num_trades` only.
#[derive(Debug)]
pub struct SummaryCalculator {
    num_trades: usize,
    equity_curve: Vec<Decimal>,
    wins: usize,
    losses: usize,
}

impl Default for SummaryCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            num_trades: 0,
            equity_curve: vec![Decimal::ZERO],
            wins: 0,
            losses: 0,
        }
    }

    pub fn add_trade(&mut self, pnl: Option<Decimal>) {
        self.num_trades += 1;
        let Some(pnl) = pnl else {
            return;
        };

        let current = self.equity_curve.last().copied().unwrap_or_default();
        self.equity_curve.push(current + pnl);

        if pnl > Decimal::ZERO {
            self.wins += 1;
        } else if pnl < Decimal::ZERO {
            self.losses += 1;
        }
    }

    #[must_use]
    pub fn calculate(&self) -> BacktestSummary {
        let priced_trades = self.equity_curve.len().saturating_sub(1);
        let total_pnl = self.equity_curve.last().copied().unwrap_or_default();

        let average_pnl = (priced_trades > 0).then(|| total_pnl / Decimal::from(priced_trades));

        #[allow(clippy::cast_precision_loss)]
        let win_rate = if priced_trades > 0 {
            self.wins as f64 / priced_trades as f64
        } else {
            0.0
        };

        BacktestSummary {
            num_trades: self.num_trades,
            priced_trades,
            wins: self.wins,
            losses: self.losses,
            total_pnl,
            average_pnl,
            win_rate,
            max_drawdown: self.calculate_max_drawdown(),
        }
    }

    fn calculate_max_drawdown(&self) -> Decimal {
        let mut max_drawdown = Decimal::ZERO;
        let mut peak = Decimal::ZERO;

        for &equity in &self.equity_curve {
            if equity > peak {
                peak = equity;
            }
            let drawdown = peak - equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        max_drawdown
    }
}

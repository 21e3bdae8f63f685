#![allow(clippy::format_push_string)]

use crate::engine::BacktestResult;

pub struct SummaryFormatter;

impl SummaryFormatter {
    #[must_use]
    pub fn format(result: &BacktestResult) -> String {
        let config = &result.config;
        let summary = &result.summary;
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    BACKTEST RESULTS                           \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("Run\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Symbol:                {}\n", config.symbol));
        output.push_str(&format!("Start:                 {}\n", config.start));
        output.push_str(&format!("End:                   {}\n", config.end));
        output.push_str(&format!("Lookback:              {} bars\n", config.lookback_days));
        output.push('\n');

        output.push_str("Trade Statistics\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Total Trades:          {}\n", summary.num_trades));
        output.push_str(&format!("Priced Trades:         {}\n", summary.priced_trades));
        output.push_str(&format!(
            "Wins / Losses:         {} / {}\n",
            summary.wins, summary.losses
        ));
        output.push_str(&format!(
            "Win Rate:              {:.2}%\n",
            summary.win_rate * 100.0
        ));
        output.push_str(&format!("Total PnL:             ${:.2}\n", summary.total_pnl));
        match summary.average_pnl {
            Some(avg) => output.push_str(&format!("Average PnL:           ${avg:.2}\n")),
            None => output.push_str("Average PnL:           n/a\n"),
        }
        output.push_str(&format!(
            "Max Drawdown:          ${:.2}\n",
            summary.max_drawdown
        ));
        output.push('\n');

        if !result.trades.is_empty() {
            output.push_str("Trades\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for trade in &result.trades {
                let pnl = trade
                    .pnl
                    .map_or_else(|| "n/a".to_string(), |p| format!("${p:.2}"));
                output.push_str(&format!(
                    "{} → {}  {:<24} score {}  {:<15} {}\n",
                    trade.entry_date,
                    trade.exit_date,
                    trade.contract_id,
                    trade.score,
                    trade.exit_reason,
                    pnl
                ));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BacktestConfig;
    use crate::metrics::SummaryCalculator;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn renders_summary_block() {
        let mut calc = SummaryCalculator::new();
        calc.add_trade(Some(dec!(60)));
        calc.add_trade(None);
        let result = BacktestResult {
            config: BacktestConfig {
                symbol: "AAPL".to_string(),
                start: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                lookback_days: 30,
                max_days_to_expiry: Some(60),
            },
            trades: Vec::new(),
            summary: calc.calculate(),
        };

        let text = SummaryFormatter::format(&result);
        assert!(text.contains("BACKTEST RESULTS"));
        assert!(text.contains("Symbol:                AAPL"));
        assert!(text.contains("Total Trades:          2"));
        assert!(text.contains("Win Rate:              100.00%"));
        assert!(text.contains("Total PnL:             $60.00"));
        assert!(!text.contains("\nTrades\n"));
    }
}

//! Row layouts of the CSV files read and written by this crate.

use chrono::NaiveDate;
use option_insight_backtest::Trade;
use option_insight_core::{DataError, OccSymbol, OptionContract, OptionKind, PriceBar};
use option_insight_strategy::ReportRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `prices/<SYMBOL>.csv`: `date,open,high,low,close,volume`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl From<PriceRecord> for PriceBar {
    fn from(r: PriceRecord) -> Self {
        Self {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume.unwrap_or_default(),
        }
    }
}

/// `chains/<SYMBOL>.csv`: one observed contract per row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainRecord {
    pub as_of: NaiveDate,
    pub contract_id: String,
    /// `call`/`put` (or `C`/`P`); derived from the contract id when blank.
    #[serde(default)]
    pub kind: Option<String>,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub open_interest: Option<u64>,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

impl ChainRecord {
    /// Converts the row into a contract of `underlying`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Malformed`] when the option kind cannot be
    /// determined.
    pub fn to_contract(&self, underlying: &str, source: &str) -> Result<OptionContract, DataError> {
        let kind = match self.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => k
                .parse::<OptionKind>()
                .map_err(|e| DataError::malformed(source, e))?,
            None => OccSymbol::parse(&self.contract_id)
                .map(|occ| occ.kind)
                .map_err(|_| {
                    DataError::malformed(source, format!("no option kind for {}", self.contract_id))
                })?,
        };

        let mut contract = OptionContract::new(
            underlying,
            &self.contract_id,
            kind,
            self.strike,
            self.expiration,
        );
        contract.last_price = self.last;
        contract.bid = self.bid;
        contract.ask = self.ask;
        contract.open_interest = self.open_interest.unwrap_or_default();
        contract.volume = self.volume.unwrap_or_default();
        contract.implied_volatility = self.implied_volatility.filter(|v| v.is_finite());
        Ok(contract)
    }
}

/// A flat output row with a fixed column layout.
pub trait CsvRecord: Serialize {
    /// Column names, in field order.
    const HEADER: &'static [&'static str];
}

/// Flat row of `report.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    pub ticker: String,
    pub contract_id: String,
    pub kind: OptionKind,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub last_price: Option<Decimal>,
    pub theoretical_price: Option<f64>,
    pub mispricing: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub open_interest: u64,
    pub volume: u64,
    pub days_to_expiry: Option<i64>,
    /// `0-7`, `8-30`, `31-60` or `60+`.
    pub expiry_bucket: Option<String>,
    pub close: Option<f64>,
    pub rsi: Option<f64>,
    pub upper_bb: Option<f64>,
    pub lower_bb: Option<f64>,
    pub ema_bullish: bool,
    pub macd_hist: f64,
    pub bb_norm: f64,
    pub rsi_norm: f64,
    pub trend_pass: bool,
    pub missing_signal: bool,
    pub score: u8,
}

impl From<&ReportRow> for ReportRecord {
    fn from(row: &ReportRow) -> Self {
        let c = &row.contract;
        Self {
            ticker: row.symbol.clone(),
            contract_id: c.contract_id.clone(),
            kind: c.kind,
            strike: c.strike,
            expiration: c.expiration,
            last_price: c.market_price(),
            theoretical_price: c.theoretical_price,
            mispricing: c.mispricing,
            implied_volatility: c.implied_volatility,
            delta: c.greeks.map(|g| g.delta),
            gamma: c.greeks.map(|g| g.gamma),
            theta: c.greeks.map(|g| g.theta),
            vega: c.greeks.map(|g| g.vega),
            open_interest: c.open_interest,
            volume: c.volume,
            days_to_expiry: row.days_to_expiry,
            expiry_bucket: row.expiry_bucket.map(|b| b.to_string()),
            close: row.close,
            rsi: row.rsi,
            upper_bb: row.upper_bb,
            lower_bb: row.lower_bb,
            ema_bullish: row.ema_bullish,
            macd_hist: row.macd_hist,
            bb_norm: row.bb_norm,
            rsi_norm: row.rsi_norm,
            trend_pass: row.trend_pass,
            missing_signal: row.missing_signal,
            score: row.score,
        }
    }
}

/// Flat row of `backtest_<SYMBOL>_<start>_<end>.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub contract: String,
    pub kind: OptionKind,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub score: u8,
    pub days_held: i64,
    pub exit_reason: String,
}

impl From<&Trade> for TradeRecord {
    fn from(t: &Trade) -> Self {
        Self {
            symbol: t.symbol.clone(),
            entry_date: t.entry_date,
            exit_date: t.exit_date,
            contract: t.contract_id.clone(),
            kind: t.kind,
            strike: t.strike,
            expiration: t.expiration,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            pnl: t.pnl,
            score: t.score,
            days_held: t.days_held,
            exit_reason: t.exit_reason.to_string(),
        }
    }
}

impl CsvRecord for ReportRecord {
    const HEADER: &'static [&'static str] = &[
        "ticker",
        "contract_id",
        "kind",
        "strike",
        "expiration",
        "last_price",
        "theoretical_price",
        "mispricing",
        "implied_volatility",
        "delta",
        "gamma",
        "theta",
        "vega",
        "open_interest",
        "volume",
        "days_to_expiry",
        "expiry_bucket",
        "close",
        "rsi",
        "upper_bb",
        "lower_bb",
        "ema_bullish",
        "macd_hist",
        "bb_norm",
        "rsi_norm",
        "trend_pass",
        "missing_signal",
        "score",
    ];
}

impl CsvRecord for TradeRecord {
    const HEADER: &'static [&'static str] = &[
        "symbol",
        "entry_date",
        "exit_date",
        "contract",
        "kind",
        "strike",
        "expiration",
        "entry_price",
        "exit_price",
        "pnl",
        "score",
        "days_held",
        "exit_reason",
    ];
}

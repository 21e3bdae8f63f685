//! Market data read from a directory of CSV files.
//!
//! Layout under the data directory:
//!
//! ```text
//! prices/<SYMBOL>.csv   date,open,high,low,close,volume
//! chains/<SYMBOL>.csv   as_of,contract_id,kind,strike,expiration,last,bid,ask,
//!                       open_interest,volume,implied_volatility
//! ```
//!
//! Files are parsed once per symbol and cached for the life of the provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use option_insight_core::{
    ChainQuery, DataError, HistoricPricer, MarketDataProvider, OccSymbol, OptionContract,
    PriceBar,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::records::{ChainRecord, PriceRecord};

/// CSV-backed [`MarketDataProvider`] and [`HistoricPricer`].
pub struct CsvMarketData {
    data_dir: PathBuf,
    prices: RwLock<HashMap<String, Arc<Vec<PriceBar>>>>,
    chains: RwLock<HashMap<String, Arc<Vec<ChainRecord>>>>,
}

impl CsvMarketData {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            prices: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_for(&self, kind: &str, symbol: &str) -> PathBuf {
        self.data_dir.join(kind).join(format!("{symbol}.csv"))
    }

    fn load_prices(&self, symbol: &str) -> Result<Arc<Vec<PriceBar>>, DataError> {
        if let Some(bars) = self.prices.read().get(symbol) {
            return Ok(Arc::clone(bars));
        }

        let path = self.file_for("prices", symbol);
        let mut bars: Vec<PriceBar> = read_records::<PriceRecord>(&path, symbol)?
            .into_iter()
            .map(PriceBar::from)
            .collect();
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        info!(symbol, bars = bars.len(), path = %path.display(), "Loaded price history");

        let bars = Arc::new(bars);
        self.prices
            .write()
            .insert(symbol.to_string(), Arc::clone(&bars));
        Ok(bars)
    }

    fn load_chain(&self, symbol: &str) -> Result<Arc<Vec<ChainRecord>>, DataError> {
        if let Some(records) = self.chains.read().get(symbol) {
            return Ok(Arc::clone(records));
        }

        let path = self.file_for("chains", symbol);
        let records = read_records::<ChainRecord>(&path, symbol)?;
        info!(symbol, rows = records.len(), path = %path.display(), "Loaded option chains");

        let records = Arc::new(records);
        self.chains
            .write()
            .insert(symbol.to_string(), Arc::clone(&records));
        Ok(records)
    }

    /// Underlying of a contract id, from its OCC encoding or from any chain
    /// already loaded that lists it.
    fn underlying_of(&self, contract_id: &str) -> Result<String, DataError> {
        if let Ok(occ) = OccSymbol::parse(contract_id) {
            return Ok(occ.underlying);
        }
        self.chains
            .read()
            .iter()
            .find(|(_, records)| records.iter().any(|r| r.contract_id == contract_id))
            .map(|(symbol, _)| symbol.clone())
            .ok_or_else(|| DataError::InvalidContractId(contract_id.to_string()))
    }
}

fn read_records<T: DeserializeOwned>(path: &Path, symbol: &str) -> Result<Vec<T>, DataError> {
    if !path.exists() {
        return Err(DataError::symbol_not_found(symbol));
    }
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::malformed(&source, e.to_string()))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| DataError::malformed(&source, format!("row {}: {e}", i + 1))))
        .collect()
}

impl MarketDataProvider for CsvMarketData {
    fn price_history(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        let symbol = symbol.to_uppercase();
        let bars = self.load_prices(&symbol)?;
        let upto = bars.partition_point(|b| b.date <= end);
        Ok(bars[upto.saturating_sub(lookback_days)..upto].to_vec())
    }

    fn option_chain(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        query: &ChainQuery,
    ) -> Result<Vec<OptionContract>, DataError> {
        let symbol = symbol.to_uppercase();
        let records = self.load_chain(&symbol)?;
        let source = self.file_for("chains", &symbol).display().to_string();

        let mut chain = Vec::new();
        for record in records.iter().filter(|r| r.as_of == as_of) {
            let contract = record.to_contract(&symbol, &source)?;
            if contract.volume >= 1 && query.matches(&contract, as_of) {
                chain.push(contract);
            }
        }
        debug!(symbol = %symbol, date = %as_of, contracts = chain.len(), "Option chain selected");
        Ok(chain)
    }
}

impl HistoricPricer for CsvMarketData {
    fn price_on_date(
        &self,
        contract_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataError> {
        let underlying = self.underlying_of(contract_id)?;
        let records = self.load_chain(&underlying)?;
        let Some(record) = records
            .iter()
            .find(|r| r.as_of == date && r.contract_id == contract_id)
        else {
            return Ok(None);
        };
        let source = self.file_for("chains", &underlying).display().to_string();
        Ok(record.to_contract(&underlying, &source)?.market_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("prices")).unwrap();
        fs::create_dir_all(dir.path().join("chains")).unwrap();
        fs::write(
            dir.path().join("prices/AAPL.csv"),
            "date,open,high,low,close,volume\n\
             2025-01-03,101,102,100,101.5,900\n\
             2025-01-02,100,101,99,100.5,1000\n\
             2025-01-06,102,103,101,102.5,\n\
             2025-01-07,103,104,102,103.5,1100\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("chains/AAPL.csv"),
            "as_of,contract_id,kind,strike,expiration,last,bid,ask,open_interest,volume,implied_volatility\n\
             2025-01-06,O:AAPL250117C00100000,call,100,2025-01-17,3.10,3.00,3.20,500,40,0.25\n\
             2025-01-06,O:AAPL250117P00100000,,100,2025-01-17,,1.00,1.20,300,5,\n\
             2025-01-06,O:AAPL250321C00110000,call,110,2025-03-21,1.50,,,80,0,0.3\n\
             2025-01-06,O:AAPL250620C00120000,call,120,2025-06-20,0.90,,,10,3,0.31\n\
             2025-01-07,O:AAPL250117C00100000,call,100,2025-01-17,,3.40,3.60,510,12,0.26\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn history_is_sorted_and_bounded() {
        let dir = fixture();
        let market = CsvMarketData::new(dir.path());

        let bars = market.price_history("aapl", date(2025, 1, 6), 2).unwrap();
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 3), date(2025, 1, 6)]);
        assert_eq!(bars[1].volume, 0);
        assert_eq!(bars[1].close, dec!(102.5));

        let all = market.price_history("AAPL", date(2025, 12, 31), 100).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn missing_symbol_is_reported() {
        let dir = fixture();
        let market = CsvMarketData::new(dir.path());
        assert!(matches!(
            market.price_history("MSFT", date(2025, 1, 6), 10),
            Err(DataError::SymbolNotFound { .. })
        ));
        assert!(matches!(
            market.option_chain("MSFT", date(2025, 1, 6), &ChainQuery::default()),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn chain_excludes_untraded_and_applies_query() {
        let dir = fixture();
        let market = CsvMarketData::new(dir.path());
        let as_of = date(2025, 1, 6);

        let chain = market
            .option_chain("AAPL", as_of, &ChainQuery::default())
            .unwrap();
        assert_eq!(chain.len(), 3);
        assert!(chain.iter().all(|c| c.volume >= 1));

        let put = &chain[1];
        assert!(!put.kind.is_call());
        assert_eq!(put.market_price(), Some(dec!(1.10)));
        assert_eq!(put.implied_volatility, None);

        let near = ChainQuery {
            expiration: None,
            max_days_to_expiry: Some(60),
        };
        assert_eq!(market.option_chain("AAPL", as_of, &near).unwrap().len(), 2);

        let exact = ChainQuery {
            expiration: Some(date(2025, 6, 20)),
            max_days_to_expiry: None,
        };
        let only = market.option_chain("AAPL", as_of, &exact).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].strike, dec!(120));
    }

    #[test]
    fn historic_price_uses_last_then_mid() {
        let dir = fixture();
        let market = CsvMarketData::new(dir.path());
        let id = "O:AAPL250117C00100000";

        assert_eq!(
            market.price_on_date(id, date(2025, 1, 6)).unwrap(),
            Some(dec!(3.10))
        );
        assert_eq!(
            market.price_on_date(id, date(2025, 1, 7)).unwrap(),
            Some(dec!(3.50))
        );
        assert_eq!(market.price_on_date(id, date(2025, 1, 8)).unwrap(), None);
        assert!(market.price_on_date("nonsense", date(2025, 1, 6)).is_err());
    }

    #[test]
    fn malformed_rows_are_errors() {
        let dir = fixture();
        fs::write(
            dir.path().join("prices/BAD.csv"),
            "date,open,high,low,close,volume\n2025-01-02,abc,1,1,1,1\n",
        )
        .unwrap();
        let market = CsvMarketData::new(dir.path());
        let err = market
            .price_history("BAD", date(2025, 1, 6), 10)
            .unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }
}

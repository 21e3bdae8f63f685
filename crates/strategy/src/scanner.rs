//! Multi-symbol scanning over a [`MarketDataProvider`].

use std::sync::Arc;

use chrono::NaiveDate;
use option_insight_core::{AppConfig, ChainQuery, MarketDataProvider};
use tracing::{info, warn};

use crate::pipeline::{evaluate_symbol, ScanParams, SkipReason};
use crate::report::ReportRow;

/// Fetches data for each symbol and runs [`evaluate_symbol`].
///
/// Cloning is cheap; clones share the provider.
#[derive(Clone)]
pub struct Scanner {
    provider: Arc<dyn MarketDataProvider>,
    params: ScanParams,
    query: ChainQuery,
    lookback_days: usize,
}

impl Scanner {
    #[must_use]
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        params: ScanParams,
        query: ChainQuery,
        lookback_days: usize,
    ) -> Self {
        Self {
            provider,
            params,
            query,
            lookback_days,
        }
    }

    /// Scanner configured from the application settings.
    #[must_use]
    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &AppConfig) -> Self {
        let query = ChainQuery {
            expiration: config.expiration,
            max_days_to_expiry: config.max_days_to_expiry,
        };
        Self::new(provider, ScanParams::from(config), query, config.lookback_days)
    }

    #[must_use]
    pub const fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Evaluates one symbol as of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns a [`SkipReason`] when data is unavailable or insufficient.
    pub fn scan_symbol(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<ReportRow>, SkipReason> {
        let symbol = symbol.to_uppercase();
        let history = self
            .provider
            .price_history(&symbol, as_of, self.lookback_days)?;
        let chain = self.provider.option_chain(&symbol, as_of, &self.query)?;
        evaluate_symbol(&symbol, &history, chain, as_of, &self.params)
    }

    /// Like [`Self::scan_symbol`], but logs and swallows skips.
    #[must_use]
    pub fn scan_symbol_or_skip(&self, symbol: &str, as_of: NaiveDate) -> Vec<ReportRow> {
        match self.scan_symbol(symbol, as_of) {
            Ok(rows) => {
                info!(symbol, date = %as_of, rows = rows.len(), "Scanned symbol");
                rows
            }
            Err(reason) => {
                warn!(symbol, date = %as_of, %reason, "Skipping symbol");
                Vec::new()
            }
        }
    }

    /// Scans every symbol in order and concatenates the reports.
    #[must_use]
    pub fn scan(&self, symbols: &[String], as_of: NaiveDate) -> Vec<ReportRow> {
        let rows: Vec<ReportRow> = symbols
            .iter()
            .flat_map(|symbol| self.scan_symbol_or_skip(symbol, as_of))
            .collect();
        info!(symbols = symbols.len(), rows = rows.len(), "Scan complete");
        rows
    }
}

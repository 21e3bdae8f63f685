//! File-backed collaborators for the option-insight engine.
//!
//! This crate provides:
//! - [`CsvMarketData`]: price history, option chains and historic contract
//!   prices read from a CSV data directory
//! - [`ReportWriter`]: CSV output of scan reports and backtest trades

pub mod market;
pub mod records;
pub mod writer;

pub use market::CsvMarketData;
pub use records::{ChainRecord, CsvRecord, PriceRecord, ReportRecord, TradeRecord};
pub use writer::{ReportWriter, REPORT_FILE};

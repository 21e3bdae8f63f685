//! Option screening: filters, composite scoring, and the per-symbol
//! evaluation pipeline used by both scans and backtests.

pub mod pipeline;
pub mod report;
pub mod scanner;

pub use pipeline::{evaluate_symbol, ScanParams, SkipReason};
pub use report::{
    bollinger_position, generate_report, passes_band_break, rank_rows, rsi_position,
    score_contract, FilterChecks, ReportRow, NEUTRAL_POSITION,
};
pub use scanner::Scanner;

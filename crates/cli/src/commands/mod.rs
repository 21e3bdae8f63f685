//! CLI commands for the option-insight engine.

pub mod backtest;
pub mod scan;

pub use backtest::{run_backtest, BacktestArgs};
pub use scan::{run_scan, ScanArgs};

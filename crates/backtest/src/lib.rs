pub mod engine;
pub mod formatter;
pub mod metrics;
pub mod trade;

pub use engine::{BacktestConfig, BacktestEngine, BacktestError, BacktestResult};
pub use formatter::SummaryFormatter;
pub use metrics::{BacktestSummary, SummaryCalculator};
pub use trade::{ExitReason, OpenPosition, Trade};

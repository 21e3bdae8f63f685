//! Shared data model, configuration, and collaborator traits for the
//! option chain evaluation engine.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod occ;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, BacktestSettings, DataConfig, FilterConfig, IndicatorConfig, TechFilterConfig,
    VolatilityConfig,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use error::DataError;
pub use occ::OccSymbol;
pub use traits::{HistoricPricer, MarketDataProvider};
pub use types::{
    closes, ChainQuery, ExpiryBucket, Greeks, OptionContract, OptionKind, PriceBar,
    CONTRACT_MULTIPLIER, DAYS_PER_YEAR,
};

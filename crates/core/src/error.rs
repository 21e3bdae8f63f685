//! Error types for market-data collaborators.

use thiserror::Error;

/// Errors raised while fetching or decoding market data.
///
/// Callers running multi-symbol or multi-day loops treat every variant as
/// "no data for this symbol/day" and continue.
#[derive(Debug, Error)]
pub enum DataError {
    /// No data source exists for the symbol.
    #[error("no data for symbol: {symbol}")]
    SymbolNotFound {
        /// The symbol that was requested.
        symbol: String,
    },

    /// A contract identifier could not be parsed.
    #[error("invalid contract identifier: {0}")]
    InvalidContractId(String),

    /// A record in a data source was malformed.
    #[error("malformed record in {source_name}: {message}")]
    Malformed {
        /// File or feed the record came from.
        source_name: String,
        /// What was wrong with it.
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider-specific failure.
    #[error("provider error: {0}")]
    Provider(String),
}

impl DataError {
    /// Creates a symbol-not-found error.
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol: symbol.into(),
        }
    }

    /// Creates a malformed-record error.
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

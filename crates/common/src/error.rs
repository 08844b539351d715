use thiserror::Error;

/// Error kinds of the price oracle core.
///
/// `SourceUnavailable` is recovered inside the fan-out and never reaches a caller of
/// the aggregated price; `NoValidPrices` and `InvalidSymbol` do.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("{exchange} unavailable for {symbol}: {reason}")]
    SourceUnavailable {
        exchange: String,
        symbol: String,
        reason: String,
    },

    #[error("No valid prices: {0}")]
    NoValidPrices(String),

    #[error("Unknown price source: {0}")]
    UnknownSource(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OracleError {
    pub fn source_unavailable(
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        OracleError::SourceUnavailable {
            exchange: exchange.into(),
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OracleError>;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, Result};

/// Provenance tag for a consensus price
pub const SOURCE_AGGREGATED: &str = "aggregated";
/// Provenance tag for a hardcoded price
pub const SOURCE_FIXED: &str = "fixed";

/// One observation of a symbol's price from one source.
///
/// `symbol` is always the caller's canonical symbol, never the pair name an
/// exchange was queried with. Timestamps travel as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, rename = "volume24h", skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Output of one aggregation pass (`source == "aggregated"` or `"fixed"`)
pub type AggregationResult = Quote;

impl Quote {
    /// 수집 시각을 현재로 하는 새 Quote
    pub fn new(symbol: impl Into<String>, price: f64, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp: Utc::now(),
            source: source.into(),
            volume_24h: None,
            market_cap: None,
            confidence: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_volume_24h(mut self, volume: Option<f64>) -> Self {
        self.volume_24h = volume;
        self
    }

    pub fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence;
        self
    }

    /// A usable price is finite and strictly positive
    pub fn has_valid_price(&self) -> bool {
        is_valid_price(self.price)
    }
}

pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Normalize caller input into a canonical symbol (trimmed, uppercase).
///
/// Empty or whitespace-only input is rejected before any network activity.
pub fn canonical_symbol(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OracleError::InvalidSymbol(
            "symbol must be a non-empty string".to_string(),
        ));
    }
    Ok(trimmed.to_uppercase())
}

/// Append `suffix` unless the symbol already ends with it (case-insensitive).
///
/// `"BTC"` and `"btcusdt"` both map to `"BTCUSDT"` for suffix `"USDT"`.
pub fn with_quote_suffix(symbol: &str, suffix: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    let suffix = suffix.to_uppercase();
    if upper.ends_with(&suffix) {
        upper
    } else {
        format!("{}{}", upper, suffix)
    }
}

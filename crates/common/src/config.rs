//! Oracle configuration
//!
//! Loaded from a TOML file. Every section has a default, so an empty file yields
//! the built-in setup: Binance, Kraken and Bybit active, Coinbase and DeFiLlama
//! available but disabled, and the `0G`/`OG` token pinned at 10.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{OracleError, Result};
use crate::types::is_valid_price;

pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_DEADLINE_MS: u64 = 8_000;

/// Ethereum tokens priced by the DeFiLlama batch request
pub const DEFAULT_DEFILLAMA_TOKENS: [&str; 6] = [
    "ethereum:0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", // WBTC
    "ethereum:0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", // WETH
    "ethereum:0xdAC17F958D2ee523a2206206994597C13D831ec7", // USDT
    "ethereum:0x514910771AF9Ca656af840dff83E8264EcF986CA", // LINK
    "ethereum:0x6B175474E89094C44Da98b954EedeAC495271d0F", // DAI
    "ethereum:0xB8c77482e45F1F44dE1745F52C74426C631bDD52", // BNB
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub server: ServerConfig,
    pub aggregation: AggregationConfig,
    pub sources: SourcesConfig,
    pub fixed_prices: Vec<FixedPrice>,
    /// Symbols advertised by `GET /prices`
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Wall-clock budget for one fan-out; `None` relies on per-source timeouts only
    pub deadline_ms: Option<u64>,
    /// Deviation from the median (percent) above which a source is reported
    pub outlier_warn_pct: f64,
}

/// Per-exchange settings. A table given in the file replaces the default for
/// that exchange, so `base_url` must be spelled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Quote currency appended to the symbol (Kraken)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_currency: Option<String>,
    /// `chain:address` ids requested in one batch (DeFiLlama)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_binance")]
    pub binance: SourceConfig,
    #[serde(default = "default_kraken")]
    pub kraken: SourceConfig,
    #[serde(default = "default_bybit")]
    pub bybit: SourceConfig,
    #[serde(default = "default_coinbase")]
    pub coinbase: SourceConfig,
    #[serde(default = "default_defillama")]
    pub defillama: SourceConfig,
}

/// 고정 가격 심볼 (예: 페깅된 내부 토큰)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedPrice {
    pub aliases: Vec<String>,
    pub price: f64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_MS
}

fn source(base_url: &str, enabled: bool) -> SourceConfig {
    SourceConfig {
        base_url: base_url.to_string(),
        enabled,
        timeout_ms: DEFAULT_SOURCE_TIMEOUT_MS,
        quote_currency: None,
        tokens: Vec::new(),
    }
}

fn default_binance() -> SourceConfig {
    source("https://api4.binance.com", true)
}

fn default_kraken() -> SourceConfig {
    SourceConfig {
        quote_currency: Some("USD".to_string()),
        ..source("https://api.kraken.com", true)
    }
}

fn default_bybit() -> SourceConfig {
    source("https://api.bybit.com", true)
}

fn default_coinbase() -> SourceConfig {
    source("https://api.coinbase.com", false)
}

fn default_defillama() -> SourceConfig {
    SourceConfig {
        tokens: DEFAULT_DEFILLAMA_TOKENS.iter().map(|t| t.to_string()).collect(),
        ..source("https://coins.llama.fi", false)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            deadline_ms: Some(DEFAULT_DEADLINE_MS),
            outlier_warn_pct: 5.0,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            binance: default_binance(),
            kraken: default_kraken(),
            bybit: default_bybit(),
            coinbase: default_coinbase(),
            defillama: default_defillama(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            aggregation: AggregationConfig::default(),
            sources: SourcesConfig::default(),
            fixed_prices: vec![FixedPrice {
                aliases: vec!["0G".to_string(), "OG".to_string()],
                price: 10.0,
            }],
            symbols: ["BTC", "0G", "ETH", "USDT", "BNB", "ADA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SourcesConfig {
    /// Exchanges in invocation order, paired with their names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SourceConfig)> {
        [
            ("binance", &self.binance),
            ("kraken", &self.kraken),
            ("bybit", &self.bybit),
            ("coinbase", &self.coinbase),
            ("defillama", &self.defillama),
        ]
        .into_iter()
    }
}

impl OracleConfig {
    /// Read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OracleError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: OracleConfig =
            toml::from_str(raw).map_err(|e| OracleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, source) in self.sources.iter() {
            if source.base_url.trim().is_empty() {
                return Err(OracleError::Config(format!("{}: base_url is empty", name)));
            }
            if source.timeout_ms == 0 {
                return Err(OracleError::Config(format!(
                    "{}: timeout_ms must be greater than zero",
                    name
                )));
            }
        }

        if self.sources.defillama.enabled && self.sources.defillama.tokens.is_empty() {
            return Err(OracleError::Config(
                "defillama: enabled with an empty token list".to_string(),
            ));
        }

        if self.aggregation.deadline_ms == Some(0) {
            return Err(OracleError::Config(
                "aggregation.deadline_ms must be greater than zero".to_string(),
            ));
        }

        if !self.aggregation.outlier_warn_pct.is_finite() || self.aggregation.outlier_warn_pct < 0.0
        {
            return Err(OracleError::Config(
                "aggregation.outlier_warn_pct must be a non-negative number".to_string(),
            ));
        }

        for fixed in &self.fixed_prices {
            if fixed.aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(OracleError::Config(
                    "fixed price entry without aliases".to_string(),
                ));
            }
            if !is_valid_price(fixed.price) {
                return Err(OracleError::Config(format!(
                    "fixed price for {:?} must be finite and positive, got {}",
                    fixed.aliases, fixed.price
                )));
            }
        }

        Ok(())
    }
}

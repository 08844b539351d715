//! Price source implementations (Binance, Kraken, Bybit, Coinbase, DeFiLlama)
//!
//! Each adapter translates the canonical symbol into its exchange's pair name,
//! issues exactly one bounded-timeout request and maps the response to a
//! [`Quote`]. Every failure surfaces as `OracleError::SourceUnavailable` carrying
//! the caller's symbol.

mod binance;
mod bybit;
mod coinbase;
mod defillama;
mod kraken;

pub use binance::BinanceClient;
pub use bybit::BybitClient;
pub use coinbase::CoinbaseClient;
pub use defillama::DefiLlamaClient;
pub use kraken::KrakenClient;

use anyhow::{bail, Context};
use async_trait::async_trait;
use oracle_common::config::SourcesConfig;
use oracle_common::{is_valid_price, OracleError, Quote, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::price_provider::PriceProvider;

const USER_AGENT: &str = "PriceOracle/1.0";

/// The closed set of supported exchanges
pub enum Source {
    Binance(BinanceClient),
    Kraken(KrakenClient),
    Bybit(BybitClient),
    Coinbase(CoinbaseClient),
    DefiLlama(DefiLlamaClient),
}

#[async_trait]
impl PriceProvider for Source {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        match self {
            Source::Binance(client) => client.fetch_quote(symbol).await,
            Source::Kraken(client) => client.fetch_quote(symbol).await,
            Source::Bybit(client) => client.fetch_quote(symbol).await,
            Source::Coinbase(client) => client.fetch_quote(symbol).await,
            Source::DefiLlama(client) => client.fetch_quote(symbol).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Source::Binance(client) => client.name(),
            Source::Kraken(client) => client.name(),
            Source::Bybit(client) => client.name(),
            Source::Coinbase(client) => client.name(),
            Source::DefiLlama(client) => client.name(),
        }
    }
}

/// Build the enabled sources in invocation order. All adapters share one
/// pooled HTTP client; timeouts are applied per request.
pub fn build_sources(config: &SourcesConfig) -> Result<Vec<Source>> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| OracleError::Config(format!("failed to create HTTP client: {}", e)))?;

    let mut sources = Vec::new();
    if config.binance.enabled {
        sources.push(Source::Binance(BinanceClient::new(client.clone(), &config.binance)));
    }
    if config.kraken.enabled {
        sources.push(Source::Kraken(KrakenClient::new(client.clone(), &config.kraken)));
    }
    if config.bybit.enabled {
        sources.push(Source::Bybit(BybitClient::new(client.clone(), &config.bybit)));
    }
    if config.coinbase.enabled {
        sources.push(Source::Coinbase(CoinbaseClient::new(client.clone(), &config.coinbase)));
    }
    if config.defillama.enabled {
        sources.push(Source::DefiLlama(DefiLlamaClient::new(client, &config.defillama)));
    }

    info!(
        "Active price sources: {:?}",
        sources.iter().map(|s| s.name()).collect::<Vec<_>>()
    );
    Ok(sources)
}

/// Send a GET request and decode the JSON body. Non-2xx is an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    exchange: &str,
) -> anyhow::Result<T> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", exchange))?;

    let status = response.status();
    if !status.is_success() {
        bail!(
            "{} API returned error status: {} - {}",
            exchange,
            status,
            response.text().await.unwrap_or_default()
        );
    }

    response
        .json::<T>()
        .await
        .with_context(|| format!("Failed to parse {} response", exchange))
}

/// Parse a decimal string price; zero, negative and non-finite values fail
pub(crate) fn parse_price(raw: &str, field: &str) -> anyhow::Result<f64> {
    let price: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Unparsable {}: {:?}", field, raw))?;
    ensure_valid_price(price)
}

pub(crate) fn ensure_valid_price(price: f64) -> anyhow::Result<f64> {
    if !is_valid_price(price) {
        bail!("Invalid price: {}", price);
    }
    Ok(price)
}

/// Wrap an adapter's internal error into the uniform failure kind
pub(crate) fn unavailable(exchange: &str, symbol: &str, error: anyhow::Error) -> OracleError {
    OracleError::source_unavailable(exchange, symbol, format!("{:#}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_common::config::OracleConfig;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("67123.45", "price").unwrap(), 67123.45);
        assert_eq!(parse_price(" 1.5 ", "price").unwrap(), 1.5);
        assert!(parse_price("", "price").is_err());
        assert!(parse_price("abc", "price").is_err());
        assert!(parse_price("0", "price").is_err());
        assert!(parse_price("-3", "price").is_err());
        assert!(parse_price("NaN", "price").is_err());
        assert!(parse_price("inf", "price").is_err());
    }

    #[test]
    fn test_default_sources() {
        let sources = build_sources(&OracleConfig::default().sources).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["binance", "kraken", "bybit"]);
    }

    #[test]
    fn test_all_sources_enabled() {
        let mut config = OracleConfig::default().sources;
        config.coinbase.enabled = true;
        config.defillama.enabled = true;

        let sources = build_sources(&config).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["binance", "kraken", "bybit", "coinbase", "defillama"]
        );
    }

    #[test]
    fn test_unavailable_keeps_caller_symbol() {
        let err = unavailable("binance", "BTC", anyhow::anyhow!("boom"));
        assert_eq!(
            err,
            OracleError::SourceUnavailable {
                exchange: "binance".to_string(),
                symbol: "BTC".to_string(),
                reason: "boom".to_string(),
            }
        );
    }
}

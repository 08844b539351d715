//! DeFiLlama coins API
//!
//! Prices a fixed list of `chain:address` tokens in one batched request and
//! picks the caller's symbol out of the answer by symbol match.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oracle_common::config::SourceConfig;
use oracle_common::{Quote, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{ensure_valid_price, get_json, unavailable};
use crate::price_provider::PriceProvider;

const NAME: &str = "defillama";

#[derive(Debug, Deserialize)]
pub(crate) struct CoinsResponse {
    coins: BTreeMap<String, CoinPrice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoinPrice {
    symbol: String,
    price: f64,
    /// Unix seconds
    timestamp: i64,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct DefiLlamaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    tokens: Vec<String>,
}

impl DefiLlamaClient {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            tokens: config.tokens.clone(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    async fn fetch_once(&self, symbol: &str) -> anyhow::Result<Quote> {
        let url = format!(
            "{}/prices/current/{}",
            self.base_url,
            self.tokens.join(",")
        );
        debug!("Fetching {} token prices from DeFiLlama", self.tokens.len());

        let request = self.client.get(&url).timeout(self.timeout);
        let body: CoinsResponse = get_json(request, "DeFiLlama").await?;

        parse_response(body, &self.tokens, symbol)
    }
}

/// Find the caller's symbol among the returned coins (case-insensitive).
/// Coins are scanned in configured token order, so the first configured token
/// wins when two share a symbol; ids outside the list follow in key order.
pub(crate) fn parse_response(
    body: CoinsResponse,
    tokens: &[String],
    symbol: &str,
) -> anyhow::Result<Quote> {
    let rank = |id: &str| {
        tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case(id))
            .unwrap_or(usize::MAX)
    };
    let mut coins: Vec<(String, CoinPrice)> = body.coins.into_iter().collect();
    coins.sort_by_key(|(id, _)| rank(id));

    let (_, coin) = coins
        .into_iter()
        .find(|(_, coin)| coin.symbol.eq_ignore_ascii_case(symbol.trim()))
        .with_context(|| format!("{} not among the tracked tokens", symbol))?;

    let price = ensure_valid_price(coin.price)?;
    let observed_at = DateTime::from_timestamp(coin.timestamp, 0).unwrap_or_else(Utc::now);

    Ok(Quote::new(symbol, price, NAME)
        .with_timestamp(observed_at)
        .with_confidence(coin.confidence))
}

#[async_trait]
impl PriceProvider for DefiLlamaClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.fetch_once(symbol)
            .await
            .map_err(|e| unavailable(NAME, symbol, e))
    }

    fn name(&self) -> &str {
        NAME
    }
}

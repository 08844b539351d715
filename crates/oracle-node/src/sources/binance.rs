//! Binance spot REST client
//!
//! Uses the average-price endpoint; Binance only knows pairs, so `BTC` is
//! queried as `BTCUSDT`.

use async_trait::async_trait;
use oracle_common::config::SourceConfig;
use oracle_common::{with_quote_suffix, Quote, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{get_json, parse_price, unavailable};
use crate::price_provider::PriceProvider;

const NAME: &str = "binance";
const QUOTE_CURRENCY: &str = "USDT";

/// `GET /api/v3/avgPrice` 응답
#[derive(Debug, Deserialize)]
pub(crate) struct AvgPriceResponse {
    price: String,
}

pub struct BinanceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BinanceClient {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// `BTC` -> `BTCUSDT`, `btcusdt` -> `BTCUSDT`
    pub fn translate_symbol(symbol: &str) -> String {
        with_quote_suffix(symbol, QUOTE_CURRENCY)
    }

    async fn fetch_once(&self, symbol: &str) -> anyhow::Result<Quote> {
        let pair = Self::translate_symbol(symbol);
        let url = format!("{}/api/v3/avgPrice", self.base_url);
        debug!("Fetching price for {} from Binance", pair);

        let request = self
            .client
            .get(&url)
            .query(&[("symbol", pair.as_str())])
            .timeout(self.timeout);
        let body: AvgPriceResponse = get_json(request, "Binance").await?;

        parse_response(body, symbol)
    }
}

pub(crate) fn parse_response(body: AvgPriceResponse, symbol: &str) -> anyhow::Result<Quote> {
    let price = parse_price(&body.price, "price")?;
    Ok(Quote::new(symbol, price, NAME))
}

#[async_trait]
impl PriceProvider for BinanceClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.fetch_once(symbol)
            .await
            .map_err(|e| unavailable(NAME, symbol, e))
    }

    fn name(&self) -> &str {
        NAME
    }
}

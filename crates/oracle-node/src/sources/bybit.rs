//! Bybit v5 spot tickers

use anyhow::{bail, Context};
use async_trait::async_trait;
use oracle_common::config::SourceConfig;
use oracle_common::{with_quote_suffix, Quote, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{get_json, parse_price, unavailable};
use crate::price_provider::PriceProvider;

const NAME: &str = "bybit";
const QUOTE_CURRENCY: &str = "USDT";

#[derive(Debug, Deserialize)]
pub(crate) struct TickersResponse {
    #[serde(rename = "retCode", default)]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<TickersResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickersResult {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ticker {
    #[serde(rename = "usdIndexPrice", default)]
    usd_index_price: Option<String>,
    #[serde(rename = "lastPrice", default)]
    last_price: Option<String>,
    #[serde(rename = "volume24h", default)]
    volume_24h: Option<String>,
}

pub struct BybitClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BybitClient {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn translate_symbol(symbol: &str) -> String {
        with_quote_suffix(symbol, QUOTE_CURRENCY)
    }

    async fn fetch_once(&self, symbol: &str) -> anyhow::Result<Quote> {
        let pair = Self::translate_symbol(symbol);
        let url = format!("{}/v5/market/tickers", self.base_url);
        debug!("Fetching price for {} from Bybit", pair);

        let request = self
            .client
            .get(&url)
            .query(&[("category", "spot"), ("symbol", pair.as_str())])
            .timeout(self.timeout);
        let body: TickersResponse = get_json(request, "Bybit").await?;

        parse_response(body, symbol)
    }
}

pub(crate) fn parse_response(body: TickersResponse, symbol: &str) -> anyhow::Result<Quote> {
    if body.ret_code != 0 {
        bail!("Bybit returned retCode {}: {}", body.ret_code, body.ret_msg);
    }

    let ticker = body
        .result
        .and_then(|r| r.list.into_iter().next())
        .context("Bybit returned no ticker")?;

    // usdIndexPrice is empty for some pairs; fall back to the last trade
    let raw = ticker
        .usd_index_price
        .filter(|p| !p.trim().is_empty())
        .or(ticker.last_price)
        .context("Missing usdIndexPrice and lastPrice")?;
    let price = parse_price(&raw, "price")?;
    let volume = ticker.volume_24h.and_then(|v| v.parse::<f64>().ok());

    Ok(Quote::new(symbol, price, NAME).with_volume_24h(volume))
}

#[async_trait]
impl PriceProvider for BybitClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.fetch_once(symbol)
            .await
            .map_err(|e| unavailable(NAME, symbol, e))
    }

    fn name(&self) -> &str {
        NAME
    }
}

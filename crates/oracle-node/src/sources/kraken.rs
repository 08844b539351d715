use anyhow::{bail, Context};
use async_trait::async_trait;
use oracle_common::config::SourceConfig;
use oracle_common::{with_quote_suffix, Quote, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{get_json, parse_price, unavailable};
use crate::price_provider::PriceProvider;

const NAME: &str = "kraken";
const DEFAULT_QUOTE_CURRENCY: &str = "USD";

/// `GET /0/public/Ticker` 응답.
///
/// `result` is keyed by Kraken's own pair name (`BTCUSD` comes back as
/// `XXBTZUSD`), which is not known before the call.
#[derive(Debug, Deserialize)]
pub(crate) struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: BTreeMap<String, TickerInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickerInfo {
    /// Last trade closed: [price, lot volume]
    c: Vec<String>,
    /// Volume: [today, last 24 hours]
    #[serde(default)]
    v: Vec<String>,
}

pub struct KrakenClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    quote_currency: String,
}

impl KrakenClient {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            quote_currency: config
                .quote_currency
                .clone()
                .unwrap_or_else(|| DEFAULT_QUOTE_CURRENCY.to_string()),
        }
    }

    pub fn translate_symbol(&self, symbol: &str) -> String {
        with_quote_suffix(symbol, &self.quote_currency)
    }

    async fn fetch_once(&self, symbol: &str) -> anyhow::Result<Quote> {
        let pair = self.translate_symbol(symbol);
        let url = format!("{}/0/public/Ticker", self.base_url);
        debug!("Fetching price for {} from Kraken", pair);

        let request = self
            .client
            .get(&url)
            .query(&[("pair", pair.as_str())])
            .timeout(self.timeout);
        let body: TickerResponse = get_json(request, "Kraken").await?;

        parse_response(body, symbol)
    }
}

pub(crate) fn parse_response(body: TickerResponse, symbol: &str) -> anyhow::Result<Quote> {
    if !body.error.is_empty() {
        bail!("Kraken returned errors: {}", body.error.join(", "));
    }

    let (pair_name, ticker) = body
        .result
        .into_iter()
        .next()
        .context("Kraken returned an empty result")?;

    let last = ticker
        .c
        .first()
        .with_context(|| format!("Missing last trade price for {}", pair_name))?;
    let price = parse_price(last, "last trade price")?;
    let volume = ticker.v.get(1).and_then(|v| v.parse::<f64>().ok());

    Ok(Quote::new(symbol, price, NAME).with_volume_24h(volume))
}

#[async_trait]
impl PriceProvider for KrakenClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.fetch_once(symbol)
            .await
            .map_err(|e| unavailable(NAME, symbol, e))
    }

    fn name(&self) -> &str {
        NAME
    }
}

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use oracle_common::config::SourceConfig;
use oracle_common::{Quote, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::{get_json, parse_price, unavailable};
use crate::price_provider::PriceProvider;

const NAME: &str = "coinbase";
/// Coinbase 상품은 항상 USD 기준
const QUOTE_CURRENCY: &str = "USD";

/// Coinbase에서 받아오는 spot 가격 데이터 구조
/// {"data": {"amount": "...", "base": "BTC", "currency": "USD"}}
#[derive(Debug, Deserialize)]
pub(crate) struct SpotPriceResponse {
    data: SpotPrice,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotPrice {
    amount: String,
}

/// Coinbase와 통신하는 클라이언트
pub struct CoinbaseClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl CoinbaseClient {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// 상품 ID로 변환 (`BTC`, `BTCUSD`, `BTCUSDT` -> `BTC-USD`)
    pub fn translate_symbol(symbol: &str) -> String {
        let upper = symbol.trim().to_uppercase();
        let base = ["USDT", QUOTE_CURRENCY]
            .iter()
            .find_map(|suffix| upper.strip_suffix(suffix).filter(|b| !b.is_empty()))
            .unwrap_or(upper.as_str());
        format!("{}-{}", base, QUOTE_CURRENCY)
    }

    /// spot 가격 URL. 상품 ID는 하나의 경로 세그먼트로 인코딩됨
    pub(crate) fn spot_url(&self, product: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Coinbase base_url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Coinbase base_url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v2", "prices", product, "spot"]);
        Ok(url)
    }

    /// 실제 API 호출을 수행하는 함수
    async fn fetch_once(&self, symbol: &str) -> anyhow::Result<Quote> {
        let product = Self::translate_symbol(symbol);
        let url = self.spot_url(&product)?;

        info!("🌐 Calling Coinbase API: {}", url);

        let request = self.client.get(url).timeout(self.timeout);
        let body: SpotPriceResponse = get_json(request, "Coinbase")
            .await
            .with_context(|| format!("Coinbase spot price for {}", product))?;

        parse_response(body, symbol)
    }
}

pub(crate) fn parse_response(body: SpotPriceResponse, symbol: &str) -> anyhow::Result<Quote> {
    let price = parse_price(&body.data.amount, "amount")?;
    info!("📊 Coinbase spot: {} = {:.2} USD", symbol, price);
    Ok(Quote::new(symbol, price, NAME))
}

#[async_trait]
impl PriceProvider for CoinbaseClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.fetch_once(symbol)
            .await
            .map_err(|e| unavailable(NAME, symbol, e))
    }

    fn name(&self) -> &str {
        NAME
    }
}

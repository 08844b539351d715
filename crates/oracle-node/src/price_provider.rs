use async_trait::async_trait;
use futures::future::join_all;
use oracle_common::{OracleError, Quote, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Price provider trait for different exchanges
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch one quote for a canonical symbol
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// Get the name of the exchange
    fn name(&self) -> &str;
}

/// Multi-exchange price provider: queries every source concurrently and keeps
/// whatever succeeded.
pub struct MultiExchangePriceProvider<P> {
    providers: Vec<P>,
    deadline: Option<Duration>,
}

impl<P: PriceProvider> MultiExchangePriceProvider<P> {
    pub fn new(providers: Vec<P>) -> Self {
        Self {
            providers,
            deadline: None,
        }
    }

    /// Shared wall-clock budget for one fan-out. Calls still pending when it
    /// elapses are dropped and count as unavailable.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn providers(&self) -> &[P] {
        &self.providers
    }

    /// Look up an active provider by name (case-insensitive)
    pub fn provider(&self, name: &str) -> Option<&P> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Fetch quotes from all providers and wait for every call to settle
    pub async fn fetch_all_quotes(&self, symbol: &str) -> Vec<(String, Result<Quote>)> {
        let calls = self.providers.iter().map(|provider| async move {
            let outcome = self.fetch_with_deadline(provider, symbol).await;
            (provider.name().to_string(), outcome)
        });

        join_all(calls).await
    }

    /// Fetch quotes and return only successful ones. Never fails; an empty
    /// vector means every source was unavailable.
    pub async fn aggregate_sources(&self, symbol: &str) -> Vec<Quote> {
        let results = self.fetch_all_quotes(symbol).await;
        let total = results.len();

        let quotes: Vec<Quote> = results
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(quote) => {
                    info!(
                        symbol = %symbol,
                        source = %name,
                        outcome = "success",
                        price = quote.price,
                        "source quote"
                    );
                    Some(quote)
                }
                Err(e) => {
                    warn!(
                        symbol = %symbol,
                        source = %name,
                        outcome = "failure",
                        error = %e,
                        "source quote"
                    );
                    None
                }
            })
            .collect();

        debug!("{}/{} sources answered for {}", quotes.len(), total, symbol);
        quotes
    }

    async fn fetch_with_deadline(&self, provider: &P, symbol: &str) -> Result<Quote> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, provider.fetch_quote(symbol))
                .await
                .unwrap_or_else(|_| {
                    Err(OracleError::source_unavailable(
                        provider.name(),
                        symbol,
                        format!("aggregation deadline of {:?} elapsed", deadline),
                    ))
                }),
            None => provider.fetch_quote(symbol).await,
        }
    }
}

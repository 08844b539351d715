//! Price aggregation entry point
//!
//! ```text
//! symbol -> SymbolPolicy --(pinned)--> fixed quote
//!              |
//!              +--> MultiExchangePriceProvider (all sources, settle-all)
//!                        |
//!                        +--> ConsensusReducer (median) -> aggregated quote
//! ```

use oracle_common::config::OracleConfig;
use oracle_common::{canonical_symbol, AggregationResult, OracleError, Quote, Result};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::consensus::ConsensusReducer;
use crate::price_provider::{MultiExchangePriceProvider, PriceProvider};
use crate::sources::{build_sources, Source};
use crate::symbol_policy::SymbolPolicy;

pub struct PriceAggregator<P = Source> {
    policy: SymbolPolicy,
    providers: MultiExchangePriceProvider<P>,
    reducer: ConsensusReducer,
}

impl PriceAggregator<Source> {
    /// Wire the enabled exchanges, fixed prices and aggregation settings
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        config.validate()?;

        let sources = build_sources(&config.sources)?;
        let providers = MultiExchangePriceProvider::new(sources)
            .with_deadline(config.aggregation.deadline_ms.map(Duration::from_millis));

        Ok(Self::new(
            providers,
            SymbolPolicy::new(&config.fixed_prices),
            ConsensusReducer::new(config.aggregation.outlier_warn_pct),
        ))
    }
}

impl<P: PriceProvider> PriceAggregator<P> {
    pub fn new(
        providers: MultiExchangePriceProvider<P>,
        policy: SymbolPolicy,
        reducer: ConsensusReducer,
    ) -> Self {
        Self {
            policy,
            providers,
            reducer,
        }
    }

    /// Resolve one consensus price for `symbol`.
    ///
    /// Pinned symbols return immediately without touching any source. Otherwise
    /// every active source is queried, failures are dropped, and the median of
    /// the surviving quotes is returned.
    ///
    /// # Errors
    /// * `InvalidSymbol` - blank input, rejected before any network call
    /// * `NoValidPrices` - no source produced a usable price
    pub async fn fetch_and_aggregate(&self, symbol: &str) -> Result<AggregationResult> {
        let canonical = canonical_symbol(symbol)?;

        if let Some(fixed) = self.policy.resolve_fixed_price(&canonical) {
            debug!("{} is pinned at {}", canonical, fixed.price);
            return Ok(fixed);
        }

        let quotes = self.providers.aggregate_sources(&canonical).await;
        match self.reducer.reduce(&quotes) {
            Ok(mut result) => {
                // quotes already carry the canonical symbol; keep it explicit
                result.symbol = canonical;
                Ok(result)
            }
            Err(OracleError::NoValidPrices(reason)) => {
                error!("No source produced a price for {}: {}", canonical, reason);
                Err(OracleError::NoValidPrices(format!(
                    "all sources failed for {}: {}",
                    canonical, reason
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Query a single active source by name, bypassing consensus
    pub async fn fetch_from_source(&self, symbol: &str, source: &str) -> Result<Quote> {
        let canonical = canonical_symbol(symbol)?;
        let provider = self
            .providers
            .provider(source)
            .ok_or_else(|| OracleError::UnknownSource(source.to_string()))?;

        let quote = provider.fetch_quote(&canonical).await?;
        info!("{} price for {} from {}", quote.price, canonical, provider.name());
        Ok(quote)
    }

    /// Names of the active sources in invocation order
    pub fn source_names(&self) -> Vec<String> {
        self.providers
            .providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn policy(&self) -> &SymbolPolicy {
        &self.policy
    }
}

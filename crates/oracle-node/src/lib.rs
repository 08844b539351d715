//! Multi-exchange spot price oracle
//!
//! Queries every active exchange concurrently, tolerates individual failures and
//! reduces the surviving quotes to a median consensus price.

pub mod aggregator;
pub mod api;
pub mod consensus;
pub mod price_provider;
pub mod sources;
pub mod symbol_policy;

pub use aggregator::PriceAggregator;
pub use consensus::ConsensusReducer;
pub use oracle_common::{AggregationResult, OracleError, Quote};
pub use price_provider::{MultiExchangePriceProvider, PriceProvider};
pub use sources::Source;
pub use symbol_policy::SymbolPolicy;

//! HTTP API
//!
//! `GET /health`, `GET /prices`, `GET /prices/:symbol[?source=<name>]`

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use oracle_common::{OracleError, Quote};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::aggregator::PriceAggregator;
use crate::price_provider::PriceProvider;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn err(error: &OracleError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SymbolList {
    pub symbols: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub source: Option<String>,
}

pub struct AppState<P> {
    pub aggregator: PriceAggregator<P>,
    /// Advertised catalogue, fixed-price aliases included
    pub symbols: Vec<String>,
}

impl<P: PriceProvider> AppState<P> {
    pub fn new(aggregator: PriceAggregator<P>, catalogue: &[String]) -> Self {
        let mut symbols: Vec<String> = Vec::new();
        let pinned = aggregator.policy().aliases();
        for symbol in catalogue.iter().map(|s| s.trim().to_uppercase()).chain(pinned) {
            if !symbol.is_empty() && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        Self {
            aggregator,
            symbols,
        }
    }
}

pub fn status_for(error: &OracleError) -> StatusCode {
    match error {
        OracleError::InvalidSymbol(_) | OracleError::UnknownSource(_) => StatusCode::BAD_REQUEST,
        OracleError::NoValidPrices(_) | OracleError::SourceUnavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        OracleError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router<P: PriceProvider + 'static>(state: Arc<AppState<P>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/prices", get(list_symbols::<P>))
        .route("/prices/:symbol", get(get_price::<P>))
        .with_state(state)
}

pub async fn serve<P: PriceProvider + 'static>(
    state: Arc<AppState<P>>,
    addr: &str,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Price oracle API listening on http://{}", addr);
    info!("  GET /health");
    info!("  GET /prices");
    info!("  GET /prices/:symbol[?source=<name>]");

    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_symbols<P: PriceProvider>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<ApiResponse<SymbolList>> {
    info!("Symbols request ({} symbols)", state.symbols.len());
    Json(ApiResponse::ok(SymbolList {
        symbols: state.symbols.clone(),
        count: state.symbols.len(),
    }))
}

async fn get_price<P: PriceProvider>(
    State(state): State<Arc<AppState<P>>>,
    Path(symbol): Path<String>,
    Query(query): Query<PriceQuery>,
) -> (StatusCode, Json<ApiResponse<Quote>>) {
    info!(symbol = %symbol, source = ?query.source, "Price request");

    let result = match query.source.as_deref() {
        Some(source) => state.aggregator.fetch_from_source(&symbol, source).await,
        None => state.aggregator.fetch_and_aggregate(&symbol).await,
    };

    match result {
        Ok(quote) => (StatusCode::OK, Json(ApiResponse::ok(quote))),
        Err(e) => (status_for(&e), Json(ApiResponse::err(&e))),
    }
}

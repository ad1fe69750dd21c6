use crate::blockchain::BlockchainService;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::{ChartPoint, MarketPrice};
use std::sync::Arc;
use tracing::debug;

use super::{api_error, ApiError};

/// Symbols shown on the dashboard price board.
const DASHBOARD_SYMBOLS: [&str; 6] = ["BTC", "ETH", "BNB", "TRX", "SOL", "USDT"];

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}

/// Current prices for the dashboard symbol set. Symbols the upstream API
/// cannot resolve are simply absent from the response.
pub async fn get_prices(
    State(service): State<Arc<BlockchainService>>,
) -> (StatusCode, Json<Vec<MarketPrice>>) {
    let prices = service.get_multiple_prices(&DASHBOARD_SYMBOLS).await;
    debug!("[MARKET] Returning {} prices", prices.len());
    (StatusCode::OK, Json(prices))
}

pub async fn get_price(
    State(service): State<Arc<BlockchainService>>,
    Path(symbol): Path<String>,
) -> Result<(StatusCode, Json<MarketPrice>), ApiError> {
    match service.get_current_price(&symbol).await {
        Some(price) => Ok((StatusCode::OK, Json(price))),
        None => Err(api_error(StatusCode::NOT_FOUND, "Price not found")),
    }
}

pub async fn get_history(
    State(service): State<Arc<BlockchainService>>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> (StatusCode, Json<Vec<ChartPoint>>) {
    let data = service.get_historical_data(&symbol, params.days).await;
    (StatusCode::OK, Json(data))
}

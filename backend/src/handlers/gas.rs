use crate::database::{
    repository::{SettingsRepository, GAS_RECEIVER_KEY},
    DbPool,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::{GasFeeTiers, GasFeesResponse, GasReceiverRequest};
use tracing::{error, info, warn};

use super::{api_error, ApiError};

/// Flat platform gas fee quoted for every speed tier.
const FLAT_GAS_FEE: &str = "0.019 ETH";

#[derive(Debug, Serialize)]
pub struct GasReceiverResponse {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GasReceiverUpdated {
    pub message: String,
    pub address: String,
}

/// `0x` + 40 hex chars.
fn is_ethereum_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// `T` + 33 base58 chars (no `0`, `O`, `I`, or `l`).
fn is_tron_address(address: &str) -> bool {
    address.len() == 34
        && address.starts_with('T')
        && address[1..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

/// Gas fee quote: the receiver address users pay, plus the flat tier table.
/// The address is read from settings on every request so admin updates take
/// effect immediately.
pub async fn get_gas_fees(
    State(pool): State<DbPool>,
) -> Result<(StatusCode, Json<GasFeesResponse>), ApiError> {
    let receiver_address = match SettingsRepository::get(&pool, GAS_RECEIVER_KEY).await {
        Ok(Some(address)) => address,
        Ok(None) => {
            error!("[GAS] No gas receiver configured");
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Gas receiver address not configured",
            ));
        }
        Err(e) => {
            error!("[GAS] Database error reading gas receiver: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ));
        }
    };

    Ok((
        StatusCode::OK,
        Json(GasFeesResponse {
            receiver_address,
            fees: GasFeeTiers {
                slow: FLAT_GAS_FEE.to_string(),
                medium: FLAT_GAS_FEE.to_string(),
                fast: FLAT_GAS_FEE.to_string(),
            },
        }),
    ))
}

pub async fn get_gas_receiver(
    State(pool): State<DbPool>,
) -> Result<(StatusCode, Json<GasReceiverResponse>), ApiError> {
    match SettingsRepository::get(&pool, GAS_RECEIVER_KEY).await {
        Ok(address) => Ok((StatusCode::OK, Json(GasReceiverResponse { address }))),
        Err(e) => {
            error!("[GAS] Database error reading gas receiver: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ))
        }
    }
}

/// Updates the gas receiver address. Accepts Ethereum or Tron formats only.
pub async fn set_gas_receiver(
    State(pool): State<DbPool>,
    Json(req): Json<GasReceiverRequest>,
) -> Result<(StatusCode, Json<GasReceiverUpdated>), ApiError> {
    if req.address.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Valid wallet address is required",
        ));
    }

    if !is_ethereum_address(&req.address) && !is_tron_address(&req.address) {
        warn!("[GAS] Rejected malformed receiver address");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid wallet address format. Must be Ethereum (0x...) or Tron (T...) address",
        ));
    }

    if let Err(e) = SettingsRepository::set(&pool, GAS_RECEIVER_KEY, &req.address).await {
        error!("[GAS] Failed to persist gas receiver: {}", e);
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update gas receiver address",
        ));
    }

    info!("[GAS] ✅ Gas receiver updated to {}", req.address);

    Ok((
        StatusCode::OK,
        Json(GasReceiverUpdated {
            message: "Gas receiver address updated successfully".to_string(),
            address: req.address,
        }),
    ))
}

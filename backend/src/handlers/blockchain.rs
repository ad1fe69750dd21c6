use crate::blockchain::BlockchainService;
use crate::error::AppError;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use shared::{BalanceResponse, CreateWalletRequest, SendTransactionRequest, TransactionResult, WalletConnection};
use std::sync::Arc;
use tracing::{error, info};

use super::{api_error, ApiError};

/// Facade errors reaching a handler are either a bad network tag (caller
/// error) or something the facade chose not to degrade.
fn map_service_error(e: AppError) -> ApiError {
    match e {
        AppError::UnsupportedNetwork(_) | AppError::InvalidInput(_) => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        AppError::InsufficientFunds(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            error!("[BLOCKCHAIN] Handler error: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// Generates a fresh keypair for the requested network. The private key is
/// returned once, here, and never stored server-side.
pub async fn create_wallet(
    State(service): State<Arc<BlockchainService>>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletConnection>), ApiError> {
    match service.create_wallet(&req.network).await {
        Ok(wallet) => {
            info!("[BLOCKCHAIN] Created {} wallet", wallet.network);
            Ok((StatusCode::OK, Json(wallet)))
        }
        Err(e) => Err(map_service_error(e)),
    }
}

pub async fn get_balance(
    State(service): State<Arc<BlockchainService>>,
    Path((address, network)): Path<(String, String)>,
) -> Result<(StatusCode, Json<BalanceResponse>), ApiError> {
    match service.get_balance(&address, &network).await {
        Ok(balance) => Ok((StatusCode::OK, Json(BalanceResponse { balance }))),
        Err(e) => Err(map_service_error(e)),
    }
}

pub async fn send_transaction(
    State(service): State<Arc<BlockchainService>>,
    Json(req): Json<SendTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResult>), ApiError> {
    match service
        .send_transaction(
            &req.from_private_key,
            &req.to_address,
            &req.amount,
            &req.network,
            req.gas_price.as_deref(),
        )
        .await
    {
        Ok(result) => Ok((StatusCode::OK, Json(result))),
        Err(e) => Err(map_service_error(e)),
    }
}

pub async fn get_transaction_status(
    State(service): State<Arc<BlockchainService>>,
    Path((hash, network)): Path<(String, String)>,
) -> Result<(StatusCode, Json<TransactionResult>), ApiError> {
    match service.get_transaction_status(&hash, &network).await {
        Ok(result) => Ok((StatusCode::OK, Json(result))),
        Err(e) => Err(map_service_error(e)),
    }
}

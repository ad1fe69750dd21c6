use crate::database::{
    models::Wallet,
    repository::{UserRepository, WalletRepository},
    DbPool,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::Network;
use tracing::{error, info, warn};

use super::{api_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct StoreWalletRequest {
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub network: String,
}

/// Lists a user's stored wallets. Private keys never leave the database
/// (the DTO skips them on serialization).
pub async fn list_wallets(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
) -> Result<(StatusCode, Json<Vec<Wallet>>), ApiError> {
    match WalletRepository::list_by_user(&pool, user_id).await {
        Ok(wallets) => Ok((StatusCode::OK, Json(wallets))),
        Err(e) => {
            error!("[WALLETS] Failed to list wallets for user {}: {}", user_id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch wallets",
            ))
        }
    }
}

/// Stores a wallet address against a user account.
pub async fn store_wallet(
    State(pool): State<DbPool>,
    Json(req): Json<StoreWalletRequest>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let network: Network = match req.network.parse() {
        Ok(network) => network,
        Err(_) => {
            warn!("[WALLETS] Rejected unknown network '{}'", req.network);
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Unsupported network: {}", req.network),
            ));
        }
    };

    if req.address.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Address is required"));
    }

    match UserRepository::find_by_id(&pool, req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(api_error(StatusCode::NOT_FOUND, "User not found"));
        }
        Err(e) => {
            error!("[WALLETS] Database error checking user: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ));
        }
    }

    match WalletRepository::create(&pool, req.user_id, &req.name, &req.address, network.tag()).await
    {
        Ok(wallet) => {
            info!(
                "[WALLETS] Stored {} wallet for user {}",
                network, req.user_id
            );
            Ok((StatusCode::CREATED, Json(wallet)))
        }
        Err(e) => {
            error!("[WALLETS] Failed to store wallet: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store wallet",
            ))
        }
    }
}

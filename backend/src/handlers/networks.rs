use crate::database::{models::NetworkConfig, repository::NetworkConfigRepository, DbPool};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use tracing::error;

use super::{api_error, ApiError};

/// Active network configurations for client display (RPC endpoints,
/// explorers, native currencies).
pub async fn list_networks(
    State(pool): State<DbPool>,
) -> Result<(StatusCode, Json<Vec<NetworkConfig>>), ApiError> {
    match NetworkConfigRepository::list_active(&pool).await {
        Ok(networks) => Ok((StatusCode::OK, Json(networks))),
        Err(e) => {
            error!("[NETWORKS] Failed to list networks: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch network configurations",
            ))
        }
    }
}

pub mod auth;
pub mod blockchain;
pub mod gas;
pub mod market;
pub mod networks;
pub mod subscriptions;
pub mod transactions;
pub mod wallets;

use axum::http::StatusCode;
use axum::Json;
use shared::ErrorResponse;

/// Error half of every handler's return type.
pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

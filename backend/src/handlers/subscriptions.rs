use crate::database::{
    models::{SubscriptionPlan, UserSubscription},
    repository::SubscriptionRepository,
    DbPool,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{error, info};

use super::{api_error, ApiError};

/// Paid subscriptions run for one year from payment.
const SUBSCRIPTION_TERM_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub user_id: i64,
    pub plan_id: i64,
    pub payment_tx_hash: String,
}

pub async fn list_plans(
    State(pool): State<DbPool>,
) -> Result<(StatusCode, Json<Vec<SubscriptionPlan>>), ApiError> {
    match SubscriptionRepository::list_plans(&pool).await {
        Ok(plans) => Ok((StatusCode::OK, Json(plans))),
        Err(e) => {
            error!("[SUBSCRIPTIONS] Failed to list plans: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch subscription plans",
            ))
        }
    }
}

pub async fn create_subscription(
    State(pool): State<DbPool>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<UserSubscription>), ApiError> {
    if req.payment_tx_hash.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing required fields"));
    }

    let expires_at = Utc::now() + Duration::days(SUBSCRIPTION_TERM_DAYS);

    match SubscriptionRepository::create(&pool, req.user_id, req.plan_id, &req.payment_tx_hash, expires_at)
        .await
    {
        Ok(subscription) => {
            info!(
                "[SUBSCRIPTIONS] ✅ User {} subscribed to plan {}",
                req.user_id, req.plan_id
            );
            Ok((StatusCode::CREATED, Json(subscription)))
        }
        Err(e) => {
            error!("[SUBSCRIPTIONS] Failed to create subscription: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create subscription",
            ))
        }
    }
}

pub async fn get_subscription(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
) -> Result<(StatusCode, Json<UserSubscription>), ApiError> {
    match SubscriptionRepository::find_active_by_user(&pool, user_id).await {
        Ok(Some(subscription)) => Ok((StatusCode::OK, Json(subscription))),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "No active subscription",
        )),
        Err(e) => {
            error!(
                "[SUBSCRIPTIONS] Failed to fetch subscription for user {}: {}",
                user_id, e
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch subscription",
            ))
        }
    }
}

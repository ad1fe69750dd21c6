use crate::database::{
    models::{Transaction, TransactionForCreate},
    repository::TransactionRepository,
    DbPool,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::Network;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{api_error, ApiError};

/// How long a flash transaction stays `pending` before the platform marks
/// it completed.
const FLASH_SETTLE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub user_id: i64,
    pub wallet_id: Option<i64>,
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: String,
    pub token: String,
    pub network: String,
    pub gas_speed: Option<String>,
    pub gas_fee: Option<String>,
    #[serde(default)]
    pub gas_fee_paid: bool,
    pub flash_fee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GasPaymentRequest {
    pub confirmed: bool,
}

pub async fn list_transactions(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
) -> Result<(StatusCode, Json<Vec<Transaction>>), ApiError> {
    match TransactionRepository::list_by_user(&pool, user_id).await {
        Ok(transactions) => Ok((StatusCode::OK, Json(transactions))),
        Err(e) => {
            error!(
                "[TRANSACTIONS] Failed to list transactions for user {}: {}",
                user_id, e
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch transactions",
            ))
        }
    }
}

/// Records a flash transaction. The gas fee must already be paid; the row is
/// created `pending` with a platform hash and flipped to `completed` by a
/// delayed background task.
pub async fn create_transaction(
    State(pool): State<DbPool>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let network: Network = match req.network.parse() {
        Ok(network) => network,
        Err(_) => {
            warn!("[TRANSACTIONS] Rejected unknown network '{}'", req.network);
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Unsupported network: {}", req.network),
            ));
        }
    };

    if !req.gas_fee_paid {
        warn!("[TRANSACTIONS] ❌ Gas fee not paid, rejecting");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Gas fee payment required for all transactions",
        ));
    }

    if req.to_address.is_empty() || req.amount.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Recipient address and amount are required",
        ));
    }

    let tx = TransactionForCreate {
        user_id: req.user_id,
        wallet_id: req.wallet_id,
        from_address: req.from_address,
        to_address: req.to_address,
        amount: req.amount,
        token: req.token,
        network: network.tag().to_string(),
        gas_speed: req.gas_speed,
        gas_fee: req.gas_fee,
        gas_fee_paid: req.gas_fee_paid,
        flash_fee: req.flash_fee,
    };

    let tx_hash = format!("0x{}", hex::encode(rand::random::<[u8; 32]>()));

    let transaction = match TransactionRepository::create(&pool, &tx, &tx_hash).await {
        Ok(transaction) => transaction,
        Err(e) => {
            error!("[TRANSACTIONS] ❌ Failed to create transaction: {}", e);
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Failed to create transaction",
            ));
        }
    };

    info!(
        "[TRANSACTIONS] ✅ Created {} transaction {} ({})",
        network, transaction.id, tx_hash
    );

    // Settlement simulation; the row completes after a fixed delay.
    let settle_pool = pool.clone();
    let settle_id = transaction.id;
    tokio::spawn(async move {
        tokio::time::sleep(FLASH_SETTLE_DELAY).await;
        match TransactionRepository::update_status(&settle_pool, settle_id, "completed").await {
            Ok(Some(_)) => info!("[TRANSACTIONS] Transaction {} completed", settle_id),
            Ok(None) => warn!("[TRANSACTIONS] Transaction {} vanished before settling", settle_id),
            Err(e) => error!("[TRANSACTIONS] Failed to settle {}: {}", settle_id, e),
        }
    });

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Toggles the gas-payment flag on a transaction.
pub async fn update_gas_payment(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
    Json(req): Json<GasPaymentRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    match TransactionRepository::set_gas_fee_paid(&pool, id, req.confirmed).await {
        Ok(Some(transaction)) => {
            info!(
                "[TRANSACTIONS] Gas payment for {} set to {}",
                id, req.confirmed
            );
            Ok((StatusCode::OK, Json(transaction)))
        }
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Transaction not found")),
        Err(e) => {
            error!("[TRANSACTIONS] Failed to update gas payment for {}: {}", id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update gas payment status",
            ))
        }
    }
}

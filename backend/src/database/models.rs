use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet row. The private key is never serialized out of the backend.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    pub network: String,
    pub balance: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Platform transaction record (the DB-side ledger, not a chain result).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: Option<i64>,
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: String,
    pub token: String,
    pub network: String,
    pub gas_speed: Option<String>,
    pub gas_fee: Option<String>,
    pub gas_fee_paid: bool,
    pub flash_fee: Option<String>,
    pub status: String,
    pub tx_hash: Option<String>,
    pub block_number: Option<String>,
    pub confirmations: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a transaction row.
#[derive(Debug, Clone)]
pub struct TransactionForCreate {
    pub user_id: i64,
    pub wallet_id: Option<i64>,
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: String,
    pub token: String,
    pub network: String,
    pub gas_speed: Option<String>,
    pub gas_fee: Option<String>,
    pub gas_fee_paid: bool,
    pub flash_fee: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionPlan {
    pub id: i64,
    pub name: String,
    pub price: String,
    /// JSON array of feature strings.
    pub features: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSubscription {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub status: String,
    pub payment_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NetworkConfig {
    pub id: i64,
    pub network: String,
    pub name: String,
    pub rpc_url: String,
    pub chain_id: Option<String>,
    pub block_explorer: Option<String>,
    pub native_currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

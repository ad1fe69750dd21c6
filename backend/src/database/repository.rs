use super::models::{
    NetworkConfig, SubscriptionPlan, Transaction, TransactionForCreate, User, UserSubscription,
    Wallet,
};
use super::DbPool;
use sqlx::query_as;

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &DbPool,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
                .bind(username)
                .bind(email)
                .bind(password_hash)
                .execute(pool)
                .await?;

        let id = result.last_insert_rowid();

        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

pub struct WalletRepository;

impl WalletRepository {
    pub async fn list_by_user(pool: &DbPool, user_id: i64) -> Result<Vec<Wallet>, sqlx::Error> {
        query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = ? ORDER BY created_at")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &DbPool,
        user_id: i64,
        name: &str,
        address: &str,
        network: &str,
    ) -> Result<Wallet, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO wallets (user_id, name, address, network) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(address)
        .bind(network)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, Wallet>("SELECT * FROM wallets WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

pub struct TransactionRepository;

impl TransactionRepository {
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
        query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(
        pool: &DbPool,
        user_id: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &DbPool,
        tx: &TransactionForCreate,
        tx_hash: &str,
    ) -> Result<Transaction, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO transactions (user_id, wallet_id, from_address, to_address, amount, \
             token, network, gas_speed, gas_fee, gas_fee_paid, flash_fee, tx_hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tx.user_id)
        .bind(tx.wallet_id)
        .bind(&tx.from_address)
        .bind(&tx.to_address)
        .bind(&tx.amount)
        .bind(&tx.token)
        .bind(&tx.network)
        .bind(&tx.gas_speed)
        .bind(&tx.gas_fee)
        .bind(tx.gas_fee_paid)
        .bind(&tx.flash_fee)
        .bind(tx_hash)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn update_status(
        pool: &DbPool,
        id: i64,
        status: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query(
            "UPDATE transactions SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id).await
    }

    pub async fn set_gas_fee_paid(
        pool: &DbPool,
        id: i64,
        paid: bool,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query(
            "UPDATE transactions SET gas_fee_paid = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(paid)
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id).await
    }
}

pub struct SubscriptionRepository;

impl SubscriptionRepository {
    pub async fn list_plans(pool: &DbPool) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &DbPool,
        user_id: i64,
        plan_id: i64,
        payment_tx_hash: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<UserSubscription, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_subscriptions (user_id, plan_id, status, payment_tx_hash, expires_at) \
             VALUES (?, ?, 'active', ?, ?)",
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(payment_tx_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, UserSubscription>("SELECT * FROM user_subscriptions WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_active_by_user(
        pool: &DbPool,
        user_id: i64,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        query_as::<_, UserSubscription>(
            "SELECT * FROM user_subscriptions WHERE user_id = ? AND status = 'active' \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

pub struct NetworkConfigRepository;

impl NetworkConfigRepository {
    pub async fn list_active(pool: &DbPool) -> Result<Vec<NetworkConfig>, sqlx::Error> {
        query_as::<_, NetworkConfig>(
            "SELECT * FROM network_configs WHERE is_active = 1 ORDER BY network",
        )
        .fetch_all(pool)
        .await
    }
}

/// The gas receiver address is admin-configurable and read per request; it is
/// deliberately not held in process memory.
pub struct SettingsRepository;

pub const GAS_RECEIVER_KEY: &str = "gas_receiver_address";

impl SettingsRepository {
    pub async fn get(pool: &DbPool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }
}

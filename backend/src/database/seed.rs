//! Default data inserted on first startup: subscription plans, network
//! configurations, and the initial gas receiver address.

use super::repository::{SettingsRepository, GAS_RECEIVER_KEY};
use super::DbPool;
use tracing::info;

const DEFAULT_GAS_RECEIVER: &str = "TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y";

pub async fn seed_defaults(pool: &DbPool) -> Result<(), sqlx::Error> {
    seed_subscription_plans(pool).await?;
    seed_network_configs(pool).await?;

    if SettingsRepository::get(pool, GAS_RECEIVER_KEY).await?.is_none() {
        SettingsRepository::set(pool, GAS_RECEIVER_KEY, DEFAULT_GAS_RECEIVER).await?;
    }

    Ok(())
}

async fn seed_subscription_plans(pool: &DbPool) -> Result<(), sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscription_plans")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let plans: [(&str, &str, &[&str]); 3] = [
        (
            "Basic",
            "550",
            &["Basic crypto transactions", "Standard support", "Single wallet"],
        ),
        (
            "Pro",
            "950",
            &[
                "Advanced trading tools",
                "Priority support",
                "Multiple wallets",
                "Analytics dashboard",
            ],
        ),
        (
            "Full",
            "3000",
            &[
                "All features",
                "24/7 dedicated support",
                "Unlimited wallets",
                "Advanced analytics",
                "API access",
            ],
        ),
    ];

    for (name, price, features) in plans {
        let features_json = serde_json::to_string(features)
            .unwrap_or_else(|_| "[]".to_string());
        sqlx::query("INSERT INTO subscription_plans (name, price, features) VALUES (?, ?, ?)")
            .bind(name)
            .bind(price)
            .bind(features_json)
            .execute(pool)
            .await?;
    }

    info!("Seeded {} subscription plans", plans.len());
    Ok(())
}

async fn seed_network_configs(pool: &DbPool) -> Result<(), sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM network_configs")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let networks = [
        (
            "ETH",
            "Ethereum",
            "https://eth.llamarpc.com",
            Some("1"),
            Some("https://etherscan.io"),
            "ETH",
        ),
        (
            "BSC",
            "BNB Smart Chain",
            "https://bsc-dataseed1.binance.org",
            Some("56"),
            Some("https://bscscan.com"),
            "BNB",
        ),
        (
            "TRX",
            "TRON",
            "https://api.trongrid.io",
            None,
            Some("https://tronscan.org"),
            "TRX",
        ),
        (
            "BTC",
            "Bitcoin",
            "https://blockstream.info/api",
            None,
            Some("https://blockstream.info"),
            "BTC",
        ),
    ];

    for (network, name, rpc_url, chain_id, explorer, currency) in networks {
        sqlx::query(
            "INSERT INTO network_configs (network, name, rpc_url, chain_id, block_explorer, \
             native_currency) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(network)
        .bind(name)
        .bind(rpc_url)
        .bind(chain_id)
        .bind(explorer)
        .bind(currency)
        .execute(pool)
        .await?;
    }

    info!("Seeded {} network configurations", networks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::NetworkConfigRepository;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = setup_pool().await;

        seed_defaults(&pool).await.unwrap();
        seed_defaults(&pool).await.unwrap();

        let networks = NetworkConfigRepository::list_active(&pool).await.unwrap();
        assert_eq!(networks.len(), 4);

        let (plan_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscription_plans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(plan_count, 3);
    }

    #[tokio::test]
    async fn gas_receiver_defaults_but_is_not_overwritten() {
        let pool = setup_pool().await;

        seed_defaults(&pool).await.unwrap();
        let initial = SettingsRepository::get(&pool, GAS_RECEIVER_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(initial, DEFAULT_GAS_RECEIVER);

        SettingsRepository::set(&pool, GAS_RECEIVER_KEY, "0x742d35Cc0123456789012345678901234567890a")
            .await
            .unwrap();
        seed_defaults(&pool).await.unwrap();

        let after = SettingsRepository::get(&pool, GAS_RECEIVER_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after, "0x742d35Cc0123456789012345678901234567890a");
    }
}

//! Route-level tests: each request goes through the real router against an
//! in-memory SQLite database, with the blockchain facade backed by mock
//! chain clients.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use backend::blockchain::{BlockchainService, MarketDataClient, MockTronClient};
use backend::config::{Config, TronMode};
use backend::database::{seed, DbPool};
use backend::server::{create_router, AppState};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    seed::seed_defaults(&pool).await.expect("Failed to seed");

    pool
}

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret-at-least-32-chars!".to_string(),
        jwt_expiration_hours: 24,
        eth_rpc_url: "http://127.0.0.1:1".to_string(),
        btc_api_url: "http://127.0.0.1:1".to_string(),
        btc_testnet: true,
        btc_fee_rate: 10,
        tron_api_url: "http://127.0.0.1:1".to_string(),
        tron_api_key: String::new(),
        tron_mode: TronMode::Mock,
    }
}

async fn test_app() -> Router {
    let pool = test_pool().await;

    // Mock clients everywhere; no test touches a real chain endpoint.
    let blockchain = BlockchainService::with_clients(
        Arc::new(MockTronClient::new()),
        Arc::new(MockTronClient::new()),
        Arc::new(MockTronClient::new()),
        MarketDataClient::with_api_url("http://127.0.0.1:1/api/v3"),
    );

    let state = AppState {
        db: pool,
        config: test_config(),
        blockchain: Arc::new(blockchain),
    };

    create_router(state, vec!["http://localhost:3000".to_string()])
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

async fn register_user(app: &Router, username: &str) -> i64 {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        Some(json!({ "username": username, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["user"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app().await;
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn register_login_roundtrip() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({ "username": "alice", "password": "hunter2hunter2", "email": "a@b.c" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["username"], "alice");

    // Duplicate username is a conflict.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({ "username": "alice", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "alice", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "alice", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    let app = test_app().await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({ "username": "bob", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gas_fees_quote_seeded_receiver_and_flat_tiers() {
    let app = test_app().await;
    let (status, body) = send_json(&app, "GET", "/api/gas-fees", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["receiver_address"].as_str().unwrap().is_empty());
    assert_eq!(body["fees"]["slow"], body["fees"]["fast"]);
}

#[tokio::test]
async fn gas_receiver_update_roundtrip() {
    let app = test_app().await;

    let new_address = "0x742d35Cc0123456789012345678901234567890a";
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/admin/gas-receiver",
        Some(json!({ "address": new_address })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], new_address);

    let (status, body) = send_json(&app, "GET", "/api/admin/gas-receiver", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], new_address);

    // The quote endpoint reads the update immediately.
    let (_, body) = send_json(&app, "GET", "/api/gas-fees", None).await;
    assert_eq!(body["receiver_address"], new_address);
}

#[tokio::test]
async fn malformed_gas_receiver_is_rejected() {
    let app = test_app().await;
    for bad in ["", "0x1234", "not-an-address", "T0m8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y"] {
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/admin/gas-receiver",
            Some(json!({ "address": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted '{}'", bad);
    }
}

#[tokio::test]
async fn networks_and_plans_are_seeded() {
    let app = test_app().await;

    let (status, body) = send_json(&app, "GET", "/api/networks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = send_json(&app, "GET", "/api/subscription-plans", None).await;
    assert_eq!(status, StatusCode::OK);
    let plans = body.as_array().unwrap();
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0]["name"], "Basic");
    assert_eq!(plans[0]["price"], "550");
}

#[tokio::test]
async fn subscription_lifecycle() {
    let app = test_app().await;
    let user_id = register_user(&app, "subscriber").await;

    // No subscription yet.
    let (status, _) = send_json(&app, "GET", &format!("/api/subscriptions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/subscriptions",
        Some(json!({ "user_id": user_id, "plan_id": 1, "payment_tx_hash": "0xabc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");

    let (status, body) = send_json(&app, "GET", &format!("/api/subscriptions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan_id"], 1);
}

#[tokio::test]
async fn wallet_storage_and_listing() {
    let app = test_app().await;
    let user_id = register_user(&app, "walletowner").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/wallets",
        Some(json!({
            "user_id": user_id,
            "name": "Main",
            "address": "TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y",
            "network": "trx"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["network"], "TRX");
    // Private keys must never appear in responses.
    assert!(body.get("private_key").is_none());

    let (status, body) = send_json(&app, "GET", &format!("/api/wallets/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/wallets",
        Some(json!({
            "user_id": user_id,
            "name": "Bad",
            "address": "xyz",
            "network": "DOGE"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transaction_requires_gas_fee_payment() {
    let app = test_app().await;
    let user_id = register_user(&app, "sender").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/transactions",
        Some(json!({
            "user_id": user_id,
            "to_address": "0x742d35Cc0123456789012345678901234567890a",
            "amount": "1.5",
            "token": "ETH",
            "network": "ETH",
            "gas_fee_paid": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Gas fee"));
}

#[tokio::test]
async fn paid_transaction_is_created_pending_with_platform_hash() {
    let app = test_app().await;
    let user_id = register_user(&app, "payer").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/transactions",
        Some(json!({
            "user_id": user_id,
            "to_address": "0x742d35Cc0123456789012345678901234567890a",
            "amount": "1.5",
            "token": "ETH",
            "network": "eth",
            "gas_fee_paid": true,
            "flash_fee": "0.019"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["network"], "ETH");
    assert!(body["tx_hash"].as_str().unwrap().starts_with("0x"));

    let (status, body) = send_json(&app, "GET", &format!("/api/transactions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_network_is_rejected_on_transaction_create() {
    let app = test_app().await;
    let user_id = register_user(&app, "wrongnet").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/transactions",
        Some(json!({
            "user_id": user_id,
            "to_address": "addr",
            "amount": "1",
            "token": "DOGE",
            "network": "DOGE",
            "gas_fee_paid": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unsupported network"));
}

#[tokio::test]
async fn gas_payment_flag_can_be_toggled() {
    let app = test_app().await;
    let user_id = register_user(&app, "toggler").await;

    let (_, tx) = send_json(
        &app,
        "POST",
        "/api/transactions",
        Some(json!({
            "user_id": user_id,
            "to_address": "0x742d35Cc0123456789012345678901234567890a",
            "amount": "1",
            "token": "ETH",
            "network": "ETH",
            "gas_fee_paid": true
        })),
    )
    .await;
    let tx_id = tx["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        "PATCH",
        &format!("/api/transactions/{}/gas-payment", tx_id),
        Some(json!({ "confirmed": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gas_fee_paid"], false);

    let (status, _) = send_json(
        &app,
        "PATCH",
        "/api/transactions/99999/gas-payment",
        Some(json!({ "confirmed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blockchain_create_wallet_stamps_requested_network() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/blockchain/create-wallet",
        Some(json!({ "network": "TRX" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["network"], "TRX");
    assert!(!body["address"].as_str().unwrap().is_empty());
    assert!(!body["private_key"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn blockchain_routes_reject_unknown_networks() {
    let app = test_app().await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/blockchain/create-wallet",
        Some(json!({ "network": "DOGE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "GET",
        "/api/blockchain/balance/someaddress/SOL",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, "GET", "/api/blockchain/transaction/0xabc/XMR", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blockchain_balance_flows_through_mock_client() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        "GET",
        "/api/blockchain/balance/TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y/TRX",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "1000");
}

#[tokio::test]
async fn blockchain_balance_degrades_to_zero_on_client_failure() {
    let app = test_app().await;

    // The mock validates addresses, so an EVM address on the TRX route
    // makes the client fail; the facade degrades that to "0".
    let (status, body) = send_json(
        &app,
        "GET",
        "/api/blockchain/balance/0x742d35Cc0123456789012345678901234567890a/TRX",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "0");
}

#[tokio::test]
async fn market_price_is_404_when_unresolvable() {
    let app = test_app().await;

    let (status, _) = send_json(&app, "GET", "/api/market/price/BTC", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The list endpoints degrade to empty instead.
    let (status, body) = send_json(&app, "GET", "/api/market/prices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send_json(&app, "GET", "/api/market/history/BTC?days=7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

//! Server initialization, route registration, and HTTP server startup.

use crate::blockchain::BlockchainService;
use crate::config::Config;
use crate::database::{create_pool, seed, DbPool};
use crate::handlers;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub blockchain: Arc<BlockchainService>,
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<BlockchainService> {
    fn from_ref(state: &AppState) -> Self {
        state.blockchain.clone()
    }
}

/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            migrations_path: "./migrations",
        }
    }
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// Returns an error if configuration loading, database setup, blockchain
/// client construction, or socket binding fails.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing();

    info!("FLASHPAY BACKEND STARTING");

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    app_config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure the data directory exists for SQLite databases
    if let Some(db_path) = app_config.database_url.strip_prefix("sqlite:") {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
    }

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!("Running migrations from: {}", config.migrations_path);
    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(config.migrations_path)).await?;
    migrator.run(&pool).await?;

    seed::seed_defaults(&pool).await?;

    info!("Initializing blockchain clients...");
    let blockchain = Arc::new(BlockchainService::new(&app_config)?);
    blockchain.start_price_updates();

    let state = AppState {
        db: pool,
        config: app_config,
        blockchain,
    };

    let app = create_router(state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("SERVER READY: http://{}", config.bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(&log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    // Tests may install their own subscriber first.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/wallets", post(handlers::wallets::store_wallet))
        .route("/api/wallets/:user_id", get(handlers::wallets::list_wallets))
        .route(
            "/api/transactions",
            post(handlers::transactions::create_transaction),
        )
        .route(
            "/api/transactions/:user_id",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/transactions/:id/gas-payment",
            patch(handlers::transactions::update_gas_payment),
        )
        .route("/api/gas-fees", get(handlers::gas::get_gas_fees))
        .route(
            "/api/admin/gas-receiver",
            get(handlers::gas::get_gas_receiver).post(handlers::gas::set_gas_receiver),
        )
        .route(
            "/api/blockchain/create-wallet",
            post(handlers::blockchain::create_wallet),
        )
        .route(
            "/api/blockchain/balance/:address/:network",
            get(handlers::blockchain::get_balance),
        )
        .route(
            "/api/blockchain/send",
            post(handlers::blockchain::send_transaction),
        )
        .route(
            "/api/blockchain/transaction/:hash/:network",
            get(handlers::blockchain::get_transaction_status),
        )
        .route("/api/market/prices", get(handlers::market::get_prices))
        .route("/api/market/price/:symbol", get(handlers::market::get_price))
        .route(
            "/api/market/history/:symbol",
            get(handlers::market::get_history),
        )
        .route("/api/networks", get(handlers::networks::list_networks))
        .route(
            "/api/subscription-plans",
            get(handlers::subscriptions::list_plans),
        )
        .route(
            "/api/subscriptions",
            post(handlers::subscriptions::create_subscription),
        )
        .route(
            "/api/subscriptions/:user_id",
            get(handlers::subscriptions::get_subscription),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

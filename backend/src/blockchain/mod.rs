//! Multi-network dispatch facade.
//!
//! One entry point ([`BlockchainService`]) routes wallet, balance, transfer,
//! and status-poll calls to the per-chain client selected by a typed
//! [`Network`] tag. Unknown tags are an error on every operation; failures of
//! an underlying client are converted to degraded defaults (`"0"` balance,
//! failed transaction result) at this boundary and logged, never propagated.

pub mod bitcoin;
pub mod ethereum;
pub mod market;
pub mod tron;

use crate::config::{Config, TronMode};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use shared::{ChartPoint, MarketPrice, Network, TransactionResult, WalletConnection};
use std::sync::Arc;
use tracing::{error, info, warn};

pub use self::bitcoin::BitcoinClient;
pub use self::ethereum::EthereumClient;
pub use self::market::MarketDataClient;
pub use self::tron::{MockTronClient, TronClient};

/// The contract every per-chain client implements.
///
/// Clients return real errors; the facade decides which operations degrade
/// to defaults instead of surfacing them.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Generate a fresh keypair locally. Never performs a network call.
    async fn create_wallet(&self) -> Result<WalletConnection>;

    /// Balance as a decimal string in the network's display unit.
    async fn get_balance(&self, address: &str) -> Result<String>;

    /// Sign and broadcast a transfer; returns the pending hash immediately.
    async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        gas_price: Option<&str>,
    ) -> Result<TransactionResult>;

    /// One status poll. Absence of a record is `pending`, not an error.
    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionResult>;
}

/// Symbols refreshed by the background price loop.
const PRICE_UPDATE_SYMBOLS: [&str; 6] = ["BTC", "ETH", "BNB", "TRX", "SOL", "USDT"];
const PRICE_UPDATE_INTERVAL_SECS: u64 = 30;

pub struct BlockchainService {
    ethereum: Arc<dyn ChainClient>,
    bitcoin: Arc<dyn ChainClient>,
    tron: Arc<dyn ChainClient>,
    market: MarketDataClient,
}

impl BlockchainService {
    pub fn new(config: &Config) -> Result<Self> {
        let ethereum: Arc<dyn ChainClient> = Arc::new(EthereumClient::new(&config.eth_rpc_url)?);
        let bitcoin: Arc<dyn ChainClient> = Arc::new(BitcoinClient::new(
            &config.btc_api_url,
            config.btc_testnet,
            config.btc_fee_rate,
        ));

        // The mock is only wired when asked for explicitly; a bad TronGrid
        // configuration fails here, at startup, not on the first call.
        let tron: Arc<dyn ChainClient> = match config.tron_mode {
            TronMode::Grid => {
                Arc::new(TronClient::new(&config.tron_api_url, &config.tron_api_key)?)
            }
            TronMode::Mock => {
                warn!("[BLOCKCHAIN] TRON_MODE=mock - Tron calls return synthetic results");
                Arc::new(MockTronClient::new())
            }
        };

        Ok(Self {
            ethereum,
            bitcoin,
            tron,
            market: MarketDataClient::new(),
        })
    }

    /// Wire specific clients; used by tests to inject mocks.
    pub fn with_clients(
        ethereum: Arc<dyn ChainClient>,
        bitcoin: Arc<dyn ChainClient>,
        tron: Arc<dyn ChainClient>,
        market: MarketDataClient,
    ) -> Self {
        Self {
            ethereum,
            bitcoin,
            tron,
            market,
        }
    }

    fn parse_network(tag: &str) -> Result<Network> {
        tag.parse()
            .map_err(|_| AppError::UnsupportedNetwork(tag.to_string()))
    }

    /// BSC shares RPC semantics with Ethereum and routes to the EVM client.
    fn client(&self, network: Network) -> &dyn ChainClient {
        match network {
            Network::Eth | Network::Bsc => self.ethereum.as_ref(),
            Network::Btc => self.bitcoin.as_ref(),
            Network::Trx => self.tron.as_ref(),
        }
    }

    pub async fn create_wallet(&self, network_tag: &str) -> Result<WalletConnection> {
        let network = Self::parse_network(network_tag)?;
        let mut wallet = self.client(network).create_wallet().await?;
        // The EVM client serves two tags; stamp the one that was asked for.
        wallet.network = network;
        Ok(wallet)
    }

    /// Degrades to `"0"` on any underlying client error. The UI treats this
    /// as a display value, not a financial assertion.
    pub async fn get_balance(&self, address: &str, network_tag: &str) -> Result<String> {
        let network = Self::parse_network(network_tag)?;
        match self.client(network).get_balance(address).await {
            Ok(balance) => Ok(balance),
            Err(e) => {
                warn!("[BLOCKCHAIN] {} balance fetch failed: {}", network, e);
                Ok("0".to_string())
            }
        }
    }

    /// Degrades to `{hash: "", status: failed}`; callers check `status`,
    /// not errors.
    pub async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        network_tag: &str,
        gas_price: Option<&str>,
    ) -> Result<TransactionResult> {
        let network = Self::parse_network(network_tag)?;
        match self
            .client(network)
            .send_transaction(from_private_key, to_address, amount, gas_price)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("[BLOCKCHAIN] {} send failed: {}", network, e);
                Ok(TransactionResult::failed(""))
            }
        }
    }

    pub async fn get_transaction_status(
        &self,
        hash: &str,
        network_tag: &str,
    ) -> Result<TransactionResult> {
        let network = Self::parse_network(network_tag)?;
        match self.client(network).get_transaction_status(hash).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("[BLOCKCHAIN] {} status poll failed: {}", network, e);
                Ok(TransactionResult::failed(hash))
            }
        }
    }

    pub async fn get_current_price(&self, symbol: &str) -> Option<MarketPrice> {
        self.market.get_current_price(symbol).await
    }

    pub async fn get_multiple_prices(&self, symbols: &[&str]) -> Vec<MarketPrice> {
        self.market.get_multiple_prices(symbols).await
    }

    pub async fn get_historical_data(&self, symbol: &str, days: u32) -> Vec<ChartPoint> {
        self.market.get_historical_data(symbol, days).await
    }

    pub async fn get_top_cryptocurrencies(&self, limit: u32) -> Vec<MarketPrice> {
        self.market.get_top_cryptocurrencies(limit).await
    }

    /// Fire-and-forget background price refresh; errors are logged inside
    /// the loop. There is no cancellation hook.
    pub fn start_price_updates(&self) {
        info!(
            "[BLOCKCHAIN] Starting price refresh loop ({}s interval)",
            PRICE_UPDATE_INTERVAL_SECS
        );
        self.market
            .clone()
            .start_price_updates(&PRICE_UPDATE_SYMBOLS, PRICE_UPDATE_INTERVAL_SECS);
    }
}

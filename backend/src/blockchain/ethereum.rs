//! EVM client backed by a JSON-RPC endpoint via alloy.
//!
//! Serves both the Ethereum and BNB Smart Chain tags; the endpoint is
//! whatever the configuration points at. Amounts cross the boundary as
//! decimal ether strings, gas prices as gwei strings.

use crate::error::{AppError, Result};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::utils::{format_ether, parse_ether, parse_units};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use shared::{Network, TransactionResult, TxStatus, WalletConnection};
use tracing::{debug, info};
use url::Url;

pub struct EthereumClient {
    provider: RootProvider,
    rpc_url: Url,
}

impl EthereumClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url: Url = rpc_url
            .parse()
            .map_err(|e| AppError::Config(format!("invalid ETH RPC url '{}': {}", rpc_url, e)))?;

        info!("[ETH] RPC endpoint: {}", rpc_url);

        Ok(Self {
            provider: RootProvider::new_http(rpc_url.clone()),
            rpc_url,
        })
    }

    fn parse_signer(private_key: &str) -> Result<PrivateKeySigner> {
        private_key
            .trim_start_matches("0x")
            .parse::<PrivateKeySigner>()
            .map_err(|e| AppError::InvalidInput(format!("invalid private key: {}", e)))
    }

    fn parse_address(address: &str) -> Result<Address> {
        address
            .parse::<Address>()
            .map_err(|e| AppError::InvalidInput(format!("invalid address '{}': {}", address, e)))
    }

    /// Gas estimate for a plain value transfer, as a string. Falls back to
    /// the fixed 21000 transfer cost when the node refuses to estimate.
    pub async fn estimate_gas(&self, from: &str, to: &str, amount: &str) -> String {
        let request = match (Self::parse_address(from), Self::parse_address(to)) {
            (Ok(from), Ok(to)) => TransactionRequest::default()
                .with_from(from)
                .with_to(to)
                .with_value(parse_ether(amount).unwrap_or(U256::ZERO)),
            _ => return "21000".to_string(),
        };

        match self.provider.estimate_gas(request).await {
            Ok(gas) => gas.to_string(),
            Err(e) => {
                debug!("[ETH] gas estimation failed, using transfer default: {}", e);
                "21000".to_string()
            }
        }
    }
}

#[async_trait::async_trait]
impl super::ChainClient for EthereumClient {
    async fn create_wallet(&self) -> Result<WalletConnection> {
        let signer = PrivateKeySigner::random();
        let address = signer.address().to_checksum(None);
        let private_key = format!("0x{}", hex::encode(signer.to_bytes()));

        Ok(WalletConnection {
            address,
            private_key: Some(private_key),
            balance: "0".to_string(),
            network: Network::Eth,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<String> {
        let address = Self::parse_address(address)?;
        let wei = self
            .provider
            .get_balance(address)
            .await
            .map_err(|e| AppError::Rpc(format!("eth_getBalance failed: {}", e)))?;

        Ok(format_ether(wei))
    }

    async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        gas_price: Option<&str>,
    ) -> Result<TransactionResult> {
        let signer = Self::parse_signer(from_private_key)?;
        let to = Self::parse_address(to_address)?;
        let value = parse_ether(amount)
            .map_err(|e| AppError::InvalidInput(format!("invalid amount '{}': {}", amount, e)))?;

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());

        let mut request = TransactionRequest::default().with_to(to).with_value(value);

        if let Some(gwei) = gas_price {
            let price: U256 = parse_units(gwei, "gwei")
                .map_err(|e| {
                    AppError::InvalidInput(format!("invalid gas price '{}': {}", gwei, e))
                })?
                .into();
            request = request.with_gas_price(price.to::<u128>());
        }

        let pending = provider
            .send_transaction(request)
            .await
            .map_err(|e| AppError::Rpc(format!("transaction broadcast failed: {}", e)))?;

        let hash = *pending.tx_hash();
        info!("[ETH] Broadcast transaction {}", hash);

        Ok(TransactionResult::pending(&hash.to_string()))
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionResult> {
        let tx_hash = hash
            .parse::<TxHash>()
            .map_err(|e| AppError::InvalidInput(format!("invalid tx hash '{}': {}", hash, e)))?;

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| AppError::Rpc(format!("receipt fetch failed: {}", e)))?;

        let Some(receipt) = receipt else {
            // Not yet mined.
            return Ok(TransactionResult::pending(hash));
        };

        let status = if receipt.status() {
            TxStatus::Confirmed
        } else {
            TxStatus::Failed
        };

        let block_number = receipt.block_number;
        let confirmations = match block_number {
            Some(block) => {
                let head = self
                    .provider
                    .get_block_number()
                    .await
                    .map_err(|e| AppError::Rpc(format!("block number fetch failed: {}", e)))?;
                Some(head.saturating_sub(block))
            }
            None => None,
        };

        let gas_used = receipt.gas_used;
        let fee_wei = U256::from(gas_used) * U256::from(receipt.effective_gas_price);

        Ok(TransactionResult {
            hash: hash.to_string(),
            status,
            block_number: block_number.map(|b| b.to_string()),
            confirmations,
            gas_used: Some(gas_used.to_string()),
            gas_fee: Some(format_ether(fee_wei)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainClient;

    fn client() -> EthereumClient {
        EthereumClient::new("https://eth.llamarpc.com").unwrap()
    }

    #[tokio::test]
    async fn create_wallet_yields_evm_keypair() {
        let wallet = client().create_wallet().await.unwrap();

        assert!(wallet.address.starts_with("0x"));
        assert_eq!(wallet.address.len(), 42);

        let key = wallet.private_key.unwrap();
        assert!(key.starts_with("0x"));
        assert_eq!(key.len(), 66);

        // Key round-trips to the same address.
        let signer = EthereumClient::parse_signer(&key).unwrap();
        assert_eq!(signer.address().to_checksum(None), wallet.address);
    }

    #[tokio::test]
    async fn wallets_are_unique() {
        let c = client();
        let a = c.create_wallet().await.unwrap();
        let b = c.create_wallet().await.unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn rejects_malformed_rpc_url() {
        assert!(EthereumClient::new("not a url").is_err());
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(EthereumClient::parse_address("0x1234").is_err());
        assert!(EthereumClient::parse_address("TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y").is_err());
    }

    #[test]
    fn ether_units_round_trip() {
        let wei = parse_ether("1.5").unwrap();
        assert_eq!(format_ether(wei), "1.500000000000000000");

        let gwei: U256 = parse_units("30", "gwei").unwrap().into();
        assert_eq!(gwei, U256::from(30_000_000_000u64));
    }
}

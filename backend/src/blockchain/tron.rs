//! Tron client speaking the TronGrid-style full-node REST API, plus the
//! explicitly wired mock used when no TronGrid credentials are configured.
//!
//! Keys are plain secp256k1; the base58check address is derived locally
//! (0x41 version byte over the keccak256 tail of the uncompressed public
//! key). Transactions are created by the node, signed locally over the
//! sha256 transaction id, and broadcast back.

use crate::error::{AppError, Result};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use shared::{Network, TransactionResult, TxStatus, WalletConnection};
use tiny_keccak::{Hasher, Keccak};
use tracing::{info, warn};

const TRON_ADDRESS_PREFIX: u8 = 0x41;
const SUN_PER_TRX: f64 = 1_000_000.0;
const USDT_CONTRACT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
const TRC20_TRANSFER_SELECTOR: &str = "transfer(address,uint256)";
const TRC20_FEE_LIMIT_SUN: u64 = 100_000_000;

pub fn to_sun(amount: &str) -> Result<u64> {
    let trx: f64 = amount
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid TRX amount '{}'", amount)))?;
    if trx <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "TRX amount must be positive, got '{}'",
            amount
        )));
    }
    Ok((trx * SUN_PER_TRX).round() as u64)
}

pub fn from_sun(sun: u64) -> String {
    (sun as f64 / SUN_PER_TRX).to_string()
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// base58check(0x41 ‖ keccak256(uncompressed pubkey body)[12..]).
fn derive_address(key: &SigningKey) -> String {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut payload = [0u8; 21];
    payload[0] = TRON_ADDRESS_PREFIX;
    payload[1..].copy_from_slice(&hash[12..]);

    bs58::encode(payload).with_check().into_string()
}

/// Decodes a base58check address to its 20-byte account body.
fn decode_address(address: &str) -> Result<[u8; 20]> {
    let payload = bs58::decode(address)
        .with_check(Some(TRON_ADDRESS_PREFIX))
        .into_vec()
        .map_err(|e| AppError::InvalidInput(format!("invalid Tron address '{}': {}", address, e)))?;
    if payload.len() != 21 {
        return Err(AppError::InvalidInput(format!(
            "invalid Tron address '{}': wrong payload length",
            address
        )));
    }
    let mut body = [0u8; 20];
    body.copy_from_slice(&payload[1..]);
    Ok(body)
}

fn parse_signing_key(private_key: &str) -> Result<SigningKey> {
    let bytes = hex::decode(private_key.trim_start_matches("0x"))
        .map_err(|e| AppError::InvalidInput(format!("invalid private key hex: {}", e)))?;
    SigningKey::from_slice(&bytes)
        .map_err(|e| AppError::InvalidInput(format!("invalid private key: {}", e)))
}

/// ABI parameter block for `transfer(address,uint256)`: two left-padded
/// 32-byte words.
fn encode_trc20_transfer(to_body: &[u8; 20], amount_units: u128) -> String {
    let mut params = [0u8; 64];
    params[12..32].copy_from_slice(to_body);
    params[48..].copy_from_slice(&amount_units.to_be_bytes());
    hex::encode(params)
}

pub struct TronClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl TronClient {
    /// Fails when no API key is configured; the mock must be chosen
    /// explicitly, never substituted for a broken production setup.
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(AppError::Config(
                "TRON_API_KEY is required when TRON_MODE=grid".to_string(),
            ));
        }

        info!("[TRX] TronGrid endpoint: {}", api_url);

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{}", self.api_url, path);
        let response = self
            .http
            .post(&url)
            .header("TRON-PRO-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Rpc(format!("{} request failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Rpc(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Rpc(format!("{} returned bad JSON: {}", path, e)))
    }

    /// Signs the node-built transaction over its sha256 id and appends the
    /// 65-byte recoverable signature.
    fn sign_transaction(mut tx: Value, key: &SigningKey) -> Result<Value> {
        let raw_data_hex = tx["raw_data_hex"]
            .as_str()
            .ok_or_else(|| AppError::Rpc("node response missing raw_data_hex".to_string()))?;
        let raw_data = hex::decode(raw_data_hex)
            .map_err(|e| AppError::Rpc(format!("bad raw_data_hex: {}", e)))?;

        let digest: [u8; 32] = Sha256::digest(&raw_data).into();

        // The digest is the transaction id; a mismatch means the node sent
        // something other than what we asked to sign.
        if let Some(tx_id) = tx["txID"].as_str() {
            if hex::encode(digest) != tx_id {
                return Err(AppError::Rpc(
                    "transaction id does not match raw data".to_string(),
                ));
            }
        }

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| AppError::Internal(format!("signing failed: {}", e)))?;

        let mut sig_bytes = signature.to_bytes().to_vec();
        sig_bytes.push(recovery_id.to_byte());
        tx["signature"] = json!([hex::encode(sig_bytes)]);

        Ok(tx)
    }

    async fn broadcast(&self, signed: Value) -> Result<String> {
        let tx_id = signed["txID"].as_str().unwrap_or_default().to_string();
        let response = self.post("wallet/broadcasttransaction", signed).await?;

        if response["result"].as_bool() == Some(true) {
            return Ok(tx_id);
        }

        // Failure messages come back hex-encoded.
        let message = response["message"]
            .as_str()
            .and_then(|m| hex::decode(m).ok())
            .and_then(|b| String::from_utf8(b).ok())
            .unwrap_or_else(|| response.to_string());
        Err(AppError::Rpc(format!("broadcast rejected: {}", message)))
    }

    async fn current_block_number(&self) -> Result<u64> {
        let block = self.post("wallet/getnowblock", json!({})).await?;
        block["block_header"]["raw_data"]["number"]
            .as_u64()
            .ok_or_else(|| AppError::Rpc("getnowblock missing block number".to_string()))
    }

    async fn token_decimals(&self, owner: &str, contract: &str) -> u32 {
        let result = self
            .post(
                "wallet/triggerconstantcontract",
                json!({
                    "owner_address": owner,
                    "contract_address": contract,
                    "function_selector": "decimals()",
                    "visible": true,
                }),
            )
            .await;

        result
            .ok()
            .and_then(|r| {
                r["constant_result"][0]
                    .as_str()
                    .and_then(|h| u32::from_str_radix(h.trim_start_matches('0'), 16).ok())
            })
            .unwrap_or_else(|| {
                warn!("[TRX] decimals() lookup failed for {}, assuming 6", contract);
                6
            })
    }

    /// TRC-20 transfer; defaults to the mainnet USDT contract.
    pub async fn send_usdt(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        contract: Option<&str>,
    ) -> Result<TransactionResult> {
        let key = parse_signing_key(from_private_key)?;
        let owner = derive_address(&key);
        let contract = contract.unwrap_or(USDT_CONTRACT);
        let to_body = decode_address(to_address)?;

        let decimals = self.token_decimals(&owner, contract).await;
        let value: f64 = amount
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("invalid token amount '{}'", amount)))?;
        let amount_units = (value * 10f64.powi(decimals as i32)).round() as u128;

        let response = self
            .post(
                "wallet/triggersmartcontract",
                json!({
                    "owner_address": owner,
                    "contract_address": contract,
                    "function_selector": TRC20_TRANSFER_SELECTOR,
                    "parameter": encode_trc20_transfer(&to_body, amount_units),
                    "fee_limit": TRC20_FEE_LIMIT_SUN,
                    "call_value": 0,
                    "visible": true,
                }),
            )
            .await?;

        let tx = response["transaction"].clone();
        if tx.is_null() {
            return Err(AppError::Rpc(format!(
                "triggersmartcontract returned no transaction: {}",
                response["result"]
            )));
        }

        let signed = Self::sign_transaction(tx, &key)?;
        let tx_id = self.broadcast(signed).await?;
        info!("[TRX] Broadcast TRC-20 transfer {}", tx_id);

        Ok(TransactionResult::pending(&tx_id))
    }
}

#[async_trait::async_trait]
impl super::ChainClient for TronClient {
    async fn create_wallet(&self) -> Result<WalletConnection> {
        let key = SigningKey::random(&mut OsRng);

        Ok(WalletConnection {
            address: derive_address(&key),
            private_key: Some(hex::encode(key.to_bytes())),
            balance: "0".to_string(),
            network: Network::Trx,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<String> {
        decode_address(address)?;
        let account = self
            .post(
                "wallet/getaccount",
                json!({ "address": address, "visible": true }),
            )
            .await?;

        // Accounts with no on-chain activity come back empty.
        let sun = account["balance"].as_u64().unwrap_or(0);
        Ok(from_sun(sun))
    }

    async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        _gas_price: Option<&str>,
    ) -> Result<TransactionResult> {
        let key = parse_signing_key(from_private_key)?;
        let owner = derive_address(&key);
        decode_address(to_address)?;
        let sun = to_sun(amount)?;

        let tx = self
            .post(
                "wallet/createtransaction",
                json!({
                    "owner_address": owner,
                    "to_address": to_address,
                    "amount": sun,
                    "visible": true,
                }),
            )
            .await?;

        if let Some(error) = tx["Error"].as_str() {
            return Err(AppError::Rpc(format!("createtransaction failed: {}", error)));
        }

        let signed = Self::sign_transaction(tx, &key)?;
        let tx_id = self.broadcast(signed).await?;
        info!("[TRX] Broadcast {} ({} sun)", tx_id, sun);

        Ok(TransactionResult::pending(&tx_id))
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionResult> {
        let tx = self
            .post(
                "wallet/gettransactionbyid",
                json!({ "value": hash, "visible": true }),
            )
            .await?;

        // An unknown id yields an empty object, not an error.
        if tx["txID"].as_str().is_none() {
            return Ok(TransactionResult::pending(hash));
        }

        let contract_ret = tx["ret"][0]["contractRet"].as_str().unwrap_or("");
        if contract_ret != "SUCCESS" {
            return Ok(TransactionResult::failed(hash));
        }

        let info = self
            .post("wallet/gettransactioninfobyid", json!({ "value": hash }))
            .await?;
        let block_number = info["blockNumber"].as_u64();

        let confirmations = match block_number {
            Some(block) => Some(self.current_block_number().await?.saturating_sub(block)),
            None => None,
        };

        Ok(TransactionResult {
            hash: hash.to_string(),
            status: TxStatus::Confirmed,
            block_number: block_number.map(|b| b.to_string()),
            confirmations,
            gas_used: None,
            gas_fee: info["fee"].as_u64().map(from_sun),
        })
    }
}

/// Stand-in wired only by explicit configuration. Keypairs are generated
/// for real (a local operation); every network result is synthetic.
pub struct MockTronClient;

impl MockTronClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockTronClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl super::ChainClient for MockTronClient {
    async fn create_wallet(&self) -> Result<WalletConnection> {
        let key = SigningKey::random(&mut OsRng);

        Ok(WalletConnection {
            address: derive_address(&key),
            private_key: Some(hex::encode(key.to_bytes())),
            balance: "0".to_string(),
            network: Network::Trx,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<String> {
        decode_address(address)?;
        Ok("1000".to_string())
    }

    async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        _gas_price: Option<&str>,
    ) -> Result<TransactionResult> {
        parse_signing_key(from_private_key)?;
        decode_address(to_address)?;
        to_sun(amount)?;

        let hash = format!("mock{}", uuid::Uuid::new_v4().simple());
        Ok(TransactionResult::pending(&hash))
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionResult> {
        Ok(TransactionResult {
            hash: hash.to_string(),
            status: TxStatus::Confirmed,
            block_number: Some("1".to_string()),
            confirmations: Some(19),
            gas_used: None,
            gas_fee: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainClient;

    #[test]
    fn sun_conversions_are_inverses_for_six_decimals() {
        for amount in ["1", "1.5", "0.000001", "550", "123.456789"] {
            let sun = to_sun(amount).unwrap();
            let back = from_sun(sun);
            assert_eq!(to_sun(&back).unwrap(), sun, "round trip for {}", amount);
        }

        assert_eq!(to_sun("1.5").unwrap(), 1_500_000);
        assert_eq!(from_sun(1_500_000), "1.5");
        assert_eq!(from_sun(1), "0.000001");
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(to_sun("abc").is_err());
        assert!(to_sun("-5").is_err());
        assert!(to_sun("0").is_err());
    }

    #[test]
    fn derived_addresses_decode_to_prefixed_payload() {
        let key = SigningKey::random(&mut OsRng);
        let address = derive_address(&key);

        assert!(address.starts_with('T'));
        assert_eq!(address.len(), 34);
        decode_address(&address).unwrap();
    }

    #[test]
    fn address_derivation_is_deterministic() {
        let key = SigningKey::random(&mut OsRng);
        let private_key = hex::encode(key.to_bytes());

        let reparsed = parse_signing_key(&private_key).unwrap();
        assert_eq!(derive_address(&key), derive_address(&reparsed));
    }

    #[test]
    fn decode_rejects_foreign_addresses() {
        assert!(decode_address("0x742d35Cc0123456789012345678901234567890a").is_err());
        assert!(decode_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").is_err());
        assert!(decode_address("TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y").is_ok());
    }

    #[test]
    fn trc20_parameters_are_two_padded_words() {
        let body = decode_address("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").unwrap();
        let encoded = encode_trc20_transfer(&body, 1_000_000);

        assert_eq!(encoded.len(), 128);
        assert!(encoded.starts_with("000000000000000000000000"));
        assert!(encoded.ends_with("0f4240"));
    }

    #[test]
    fn grid_client_requires_api_key() {
        assert!(TronClient::new("https://api.trongrid.io", "").is_err());
        assert!(TronClient::new("https://api.trongrid.io", "key").is_ok());
    }

    #[tokio::test]
    async fn mock_returns_synthetic_results() {
        let mock = MockTronClient::new();
        let wallet = mock.create_wallet().await.unwrap();

        assert!(wallet.address.starts_with('T'));
        assert_eq!(mock.get_balance(&wallet.address).await.unwrap(), "1000");

        let result = mock
            .send_transaction(
                wallet.private_key.as_deref().unwrap(),
                "TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y",
                "1.5",
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.status, TxStatus::Pending);
        assert!(result.hash.starts_with("mock"));

        let status = mock.get_transaction_status(&result.hash).await.unwrap();
        assert_eq!(status.status, TxStatus::Confirmed);
    }

    #[tokio::test]
    async fn mock_still_validates_inputs() {
        let mock = MockTronClient::new();
        assert!(mock.get_balance("not-an-address").await.is_err());
        assert!(mock
            .send_transaction("zz", "TQm8yS3XZHgXiHMtMWbrQwwmLCztyvAG8y", "1", None)
            .await
            .is_err());
    }
}

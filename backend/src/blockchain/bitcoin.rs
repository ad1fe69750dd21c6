//! Bitcoin client over an Esplora-compatible REST API.
//!
//! Key handling, transaction assembly, and signing are local (legacy P2PKH);
//! the explorer is used for balances, UTXO lookup, broadcast, and status.
//! Fees are sized from a configured sat/vB rate and the estimated virtual
//! size of the assembled transaction.

use crate::error::{AppError, Result};
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, Network as BtcNetwork, OutPoint, PrivateKey, ScriptBuf, Sequence, Transaction,
    TxIn, TxOut, Txid, Witness,
};
use serde::Deserialize;
use shared::{Network, TransactionResult, TxStatus, WalletConnection};
use std::str::FromStr;
use tracing::info;

/// Outputs below this are uneconomical; change under it is left to the fee.
const DUST_LIMIT_SATS: u64 = 546;

/// P2PKH weight model: 148 vB per input, 34 per output, 10 overhead.
fn estimate_vsize(inputs: usize, outputs: usize) -> u64 {
    148 * inputs as u64 + 34 * outputs as u64 + 10
}

/// A transaction in the tip block has one confirmation.
fn confirmations_at(tip_height: u64, block_height: u64) -> u64 {
    tip_height.saturating_sub(block_height) + 1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
}

#[derive(Debug, Deserialize)]
struct AddressStats {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraTxStatus {
    confirmed: bool,
    block_height: Option<u64>,
}

/// Inputs picked for a spend, with the fee they imply.
#[derive(Debug)]
struct Selection {
    inputs: Vec<Utxo>,
    total_sats: u64,
    fee_sats: u64,
}

/// Greedy selection in the order the explorer returned the UTXOs. The fee is
/// re-derived as each input is added since every input grows the transaction.
fn select_utxos(utxos: &[Utxo], target_sats: u64, fee_rate: u64) -> Result<Selection> {
    let mut inputs = Vec::new();
    let mut total_sats = 0u64;

    for utxo in utxos {
        inputs.push(utxo.clone());
        total_sats += utxo.value;

        let fee_sats = fee_rate * estimate_vsize(inputs.len(), 2);
        if total_sats >= target_sats + fee_sats {
            return Ok(Selection {
                inputs,
                total_sats,
                fee_sats,
            });
        }
    }

    let fee_sats = fee_rate * estimate_vsize(inputs.len().max(1), 2);
    Err(AppError::InsufficientFunds(format!(
        "have {} sats, need {} (amount {} + fee {})",
        total_sats,
        target_sats + fee_sats,
        target_sats,
        fee_sats
    )))
}

fn sats_to_btc(sats: u64) -> String {
    (sats as f64 / 100_000_000.0).to_string()
}

fn btc_to_sats(amount: &str) -> Result<u64> {
    let value: f64 = amount
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid BTC amount '{}'", amount)))?;
    if value <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "BTC amount must be positive, got '{}'",
            amount
        )));
    }
    // Round, don't truncate: the f64 product of common decimals lands just
    // below the integer (0.00015 * 1e8 = 14999.999...).
    Ok((value * 100_000_000.0).round() as u64)
}

pub struct BitcoinClient {
    http: reqwest::Client,
    api_url: String,
    network: BtcNetwork,
    fee_rate: u64,
}

impl BitcoinClient {
    pub fn new(api_url: &str, testnet: bool, fee_rate: u64) -> Self {
        let network = if testnet {
            BtcNetwork::Testnet
        } else {
            BtcNetwork::Bitcoin
        };

        info!("[BTC] Explorer {} ({})", api_url, network);

        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            network,
            fee_rate,
        }
    }

    fn parse_wif(&self, wif: &str) -> Result<PrivateKey> {
        let key = PrivateKey::from_wif(wif)
            .map_err(|e| AppError::InvalidInput(format!("invalid WIF key: {}", e)))?;
        if key.network != self.network.into() {
            return Err(AppError::InvalidInput(
                "private key is for a different bitcoin network".to_string(),
            ));
        }
        Ok(key)
    }

    fn parse_address(&self, address: &str) -> Result<Address> {
        Address::from_str(address)
            .map_err(|e| AppError::InvalidInput(format!("invalid address '{}': {}", address, e)))?
            .require_network(self.network)
            .map_err(|_| {
                AppError::InvalidInput(format!(
                    "address '{}' is not valid for {}",
                    address, self.network
                ))
            })
    }

    async fn get_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        let url = format!("{}/address/{}/utxo", self.api_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Explorer(format!("utxo fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Explorer(format!(
                "utxo fetch returned {}",
                response.status()
            )));
        }

        response
            .json::<Vec<Utxo>>()
            .await
            .map_err(|e| AppError::Explorer(format!("bad utxo response: {}", e)))
    }

    async fn tip_height(&self) -> Result<u64> {
        let url = format!("{}/blocks/tip/height", self.api_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Explorer(format!("tip height fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Explorer(format!(
                "tip height fetch returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Explorer(format!("bad tip height response: {}", e)))?;
        body.trim()
            .parse()
            .map_err(|e| AppError::Explorer(format!("bad tip height '{}': {}", body.trim(), e)))
    }

    async fn broadcast(&self, tx_hex: String) -> Result<String> {
        let url = format!("{}/tx", self.api_url);
        let response = self
            .http
            .post(&url)
            .body(tx_hex)
            .send()
            .await
            .map_err(|e| AppError::Explorer(format!("broadcast failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::Explorer(format!(
                "broadcast rejected ({}): {}",
                status, body
            )));
        }

        Ok(body.trim().to_string())
    }
}

#[async_trait::async_trait]
impl super::ChainClient for BitcoinClient {
    async fn create_wallet(&self) -> Result<WalletConnection> {
        let secp = Secp256k1::new();
        let (secret_key, _) = secp.generate_keypair(&mut bitcoin::key::rand::thread_rng());
        let private_key = PrivateKey::new(secret_key, self.network);
        let public_key = private_key.public_key(&secp);
        let address = Address::p2pkh(&public_key, self.network);

        Ok(WalletConnection {
            address: address.to_string(),
            private_key: Some(private_key.to_wif()),
            balance: "0".to_string(),
            network: Network::Btc,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<String> {
        let url = format!("{}/address/{}", self.api_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Explorer(format!("balance fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Explorer(format!(
                "balance fetch returned {}",
                response.status()
            )));
        }

        let stats = response
            .json::<AddressStats>()
            .await
            .map_err(|e| AppError::Explorer(format!("bad address response: {}", e)))?;

        let sats = stats
            .chain_stats
            .funded_txo_sum
            .saturating_sub(stats.chain_stats.spent_txo_sum);

        Ok(sats_to_btc(sats))
    }

    async fn send_transaction(
        &self,
        from_private_key: &str,
        to_address: &str,
        amount: &str,
        _gas_price: Option<&str>,
    ) -> Result<TransactionResult> {
        let secp = Secp256k1::new();
        let private_key = self.parse_wif(from_private_key)?;
        let public_key = private_key.public_key(&secp);
        let from_address = Address::p2pkh(&public_key, self.network);
        let to = self.parse_address(to_address)?;

        let target_sats = btc_to_sats(amount)?;

        let utxos = self.get_utxos(&from_address.to_string()).await?;
        let selection = select_utxos(&utxos, target_sats, self.fee_rate)?;

        let inputs: Vec<TxIn> = selection
            .inputs
            .iter()
            .map(|utxo| {
                let txid = utxo
                    .txid
                    .parse::<Txid>()
                    .map_err(|e| AppError::Explorer(format!("bad utxo txid: {}", e)))?;
                Ok(TxIn {
                    previous_output: OutPoint::new(txid, utxo.vout),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
            })
            .collect::<Result<_>>()?;

        let mut outputs = vec![TxOut {
            value: Amount::from_sat(target_sats),
            script_pubkey: to.script_pubkey(),
        }];

        let change_sats = selection.total_sats - target_sats - selection.fee_sats;
        if change_sats >= DUST_LIMIT_SATS {
            outputs.push(TxOut {
                value: Amount::from_sat(change_sats),
                script_pubkey: from_address.script_pubkey(),
            });
        }

        let mut tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        };

        // All inputs spend the same P2PKH script.
        let spk = from_address.script_pubkey();
        let mut signatures = Vec::with_capacity(tx.input.len());
        {
            let cache = SighashCache::new(&tx);
            for index in 0..tx.input.len() {
                let sighash = cache
                    .legacy_signature_hash(index, &spk, EcdsaSighashType::All.to_u32())
                    .map_err(|e| AppError::Internal(format!("sighash failed: {}", e)))?;
                let message = Message::from_digest(sighash.to_byte_array());
                let signature = secp.sign_ecdsa(&message, &private_key.inner);

                let mut der = signature.serialize_der().to_vec();
                der.push(EcdsaSighashType::All.to_u32() as u8);
                signatures.push(der);
            }
        }

        for (input, der) in tx.input.iter_mut().zip(signatures) {
            let push = PushBytesBuf::try_from(der)
                .map_err(|e| AppError::Internal(format!("signature encoding failed: {}", e)))?;
            input.script_sig = Builder::new()
                .push_slice(push)
                .push_key(&public_key)
                .into_script();
        }

        let txid = self.broadcast(serialize_hex(&tx)).await?;
        info!(
            "[BTC] Broadcast {} ({} sats, fee {} sats)",
            txid, target_sats, selection.fee_sats
        );

        Ok(TransactionResult {
            gas_fee: Some(sats_to_btc(selection.fee_sats)),
            ..TransactionResult::pending(&txid)
        })
    }

    async fn get_transaction_status(&self, hash: &str) -> Result<TransactionResult> {
        let url = format!("{}/tx/{}/status", self.api_url, hash);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Explorer(format!("status fetch failed: {}", e)))?;

        // Esplora 404s transactions it has never seen; treat as still pending.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(TransactionResult::pending(hash));
        }
        if !response.status().is_success() {
            return Err(AppError::Explorer(format!(
                "status fetch returned {}",
                response.status()
            )));
        }

        let status = response
            .json::<EsploraTxStatus>()
            .await
            .map_err(|e| AppError::Explorer(format!("bad status response: {}", e)))?;

        if status.confirmed {
            let confirmations = match status.block_height {
                Some(height) => Some(confirmations_at(self.tip_height().await?, height)),
                None => None,
            };
            Ok(TransactionResult {
                hash: hash.to_string(),
                status: TxStatus::Confirmed,
                block_number: status.block_height.map(|h| h.to_string()),
                confirmations,
                gas_used: None,
                gas_fee: None,
            })
        } else {
            Ok(TransactionResult::pending(hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainClient;

    fn utxo(txid: &str, value: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            vout: 0,
            value,
        }
    }

    #[test]
    fn vsize_model_matches_p2pkh_shape() {
        assert_eq!(estimate_vsize(1, 2), 226);
        assert_eq!(estimate_vsize(2, 2), 374);
    }

    #[test]
    fn confirmations_count_from_tip_height() {
        assert_eq!(confirmations_at(850_000, 850_000), 1);
        assert_eq!(confirmations_at(850_005, 850_000), 6);
        // Stale tip during a reorg still reports the block as confirmed.
        assert_eq!(confirmations_at(849_999, 850_000), 1);
    }

    #[test]
    fn selects_first_sufficient_utxo() {
        let utxos = [utxo("a", 100_000), utxo("b", 50_000)];
        let selection = select_utxos(&utxos, 10_000, 10).unwrap();

        assert_eq!(selection.inputs.len(), 1);
        assert_eq!(selection.total_sats, 100_000);
        assert_eq!(selection.fee_sats, 10 * 226);
    }

    #[test]
    fn accumulates_utxos_until_target_plus_fee_is_covered() {
        let utxos = [utxo("a", 6_000), utxo("b", 6_000), utxo("c", 6_000)];
        // 10_000 + fee(2 inputs) = 10_000 + 3_740 exceeds 12_000, so a third
        // input is pulled in.
        let selection = select_utxos(&utxos, 10_000, 10).unwrap();

        assert_eq!(selection.inputs.len(), 3);
        assert_eq!(selection.total_sats, 18_000);
        assert_eq!(selection.fee_sats, 10 * estimate_vsize(3, 2));
    }

    #[test]
    fn insufficient_funds_is_a_typed_error() {
        let utxos = [utxo("a", 1_000)];
        let err = select_utxos(&utxos, 50_000, 10).unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds(_)));
    }

    #[test]
    fn empty_utxo_set_is_insufficient() {
        assert!(matches!(
            select_utxos(&[], 1, 10),
            Err(AppError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn btc_sat_conversions() {
        assert_eq!(btc_to_sats("1").unwrap(), 100_000_000);
        assert_eq!(btc_to_sats("0.00015").unwrap(), 15_000);
        assert_eq!(sats_to_btc(15_000), "0.00015");
        assert!(btc_to_sats("abc").is_err());
        assert!(btc_to_sats("-1").is_err());
        assert!(btc_to_sats("0").is_err());
    }

    #[test]
    fn btc_amounts_near_float_boundaries_do_not_lose_a_satoshi() {
        // These decimals multiply to x.999... in f64; truncation would
        // short every one of them by one satoshi.
        assert_eq!(btc_to_sats("0.29").unwrap(), 29_000_000);
        assert_eq!(btc_to_sats("0.1").unwrap(), 10_000_000);
        assert_eq!(btc_to_sats("0.00000001").unwrap(), 1);
        for sats in [1u64, 546, 15_000, 29_000_000, 100_000_000] {
            assert_eq!(btc_to_sats(&sats_to_btc(sats)).unwrap(), sats);
        }
    }

    #[tokio::test]
    async fn create_wallet_yields_p2pkh_keypair() {
        let client = BitcoinClient::new("https://blockstream.info/api", false, 10);
        let wallet = client.create_wallet().await.unwrap();

        assert!(wallet.address.starts_with('1'));
        let wif = wallet.private_key.unwrap();
        let key = client.parse_wif(&wif).unwrap();
        assert_eq!(key.to_wif(), wif);
    }

    #[tokio::test]
    async fn testnet_wallets_use_testnet_encoding() {
        let client = BitcoinClient::new("https://blockstream.info/testnet/api", true, 10);
        let wallet = client.create_wallet().await.unwrap();

        assert!(wallet.address.starts_with('m') || wallet.address.starts_with('n'));
    }

    #[test]
    fn mainnet_client_rejects_testnet_address() {
        let client = BitcoinClient::new("https://blockstream.info/api", false, 10);
        assert!(client
            .parse_address("mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn")
            .is_err());
        assert!(client
            .parse_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa")
            .is_ok());
    }
}

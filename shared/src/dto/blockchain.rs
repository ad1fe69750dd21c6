//! # Blockchain Data Transfer Objects
//!
//! Network tags and the normalized result shapes produced by the per-chain
//! clients. Every chain client returns the same two shapes regardless of the
//! underlying SDK: [`WalletConnection`] for wallet creation and
//! [`TransactionResult`] for submitted transfers and status polls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported blockchain networks.
///
/// Parsed case-insensitively from the wire tag; serializes to the canonical
/// uppercase form. BSC shares RPC semantics with Ethereum and is routed to
/// the EVM client by the dispatch facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Btc,
    Eth,
    Bsc,
    Trx,
}

impl Network {
    /// Canonical uppercase tag used on the wire and in the database.
    pub fn tag(&self) -> &'static str {
        match self {
            Network::Btc => "BTC",
            Network::Eth => "ETH",
            Network::Bsc => "BSC",
            Network::Trx => "TRX",
        }
    }

    pub const ALL: [Network; 4] = [Network::Btc, Network::Eth, Network::Bsc, Network::Trx];
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" => Ok(Network::Btc),
            "ETH" => Ok(Network::Eth),
            "BSC" => Ok(Network::Bsc),
            "TRX" => Ok(Network::Trx),
            other => Err(format!("Unsupported network: {}", other)),
        }
    }
}

/// Lifecycle state of a submitted transaction as observed by one poll.
///
/// There is no tracked state machine; callers observe `pending -> confirmed`
/// only by re-polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Confirmed => write!(f, "confirmed"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A freshly created wallet, returned to the caller once.
///
/// The private key is generated client-side by the chain client and is not
/// retained anywhere in the backend after the response is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletConnection {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Balance as a decimal string in the network's display unit.
    pub balance: String,
    pub network: Network,
}

/// Normalized result of a submitted transfer or a status poll.
///
/// Immutable snapshot; re-poll for updated state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionResult {
    pub hash: String,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_fee: Option<String>,
}

impl TransactionResult {
    /// The degraded shape returned when an underlying client call fails.
    pub fn failed(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            status: TxStatus::Failed,
            block_number: None,
            confirmations: None,
            gas_used: None,
            gas_fee: None,
        }
    }

    /// A broadcast accepted by the network but not yet mined.
    pub fn pending(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            status: TxStatus::Pending,
            block_number: None,
            confirmations: None,
            gas_used: None,
            gas_fee: None,
        }
    }
}

/// Request body for `POST /api/blockchain/create-wallet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub network: String,
}

/// Request body for `POST /api/blockchain/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub from_private_key: String,
    pub to_address: String,
    pub amount: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

/// Response for `GET /api/blockchain/balance/{address}/{network}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}

/// Fee tiers and the platform gas receiver address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasFeesResponse {
    pub receiver_address: String,
    pub fees: GasFeeTiers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasFeeTiers {
    pub slow: String,
    pub medium: String,
    pub fast: String,
}

/// Admin request to update the gas receiver address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasReceiverRequest {
    pub address: String,
}

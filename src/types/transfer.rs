//! Transfer-related types.

use alloy::primitives::TxHash;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transfer intent as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Destination address or registered name.
    pub destination: String,
    /// Token-denominated amount, unrounded.
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(destination: impl Into<String>, amount: Decimal) -> Self {
        Self { destination: destination.into(), amount }
    }
}

/// Reasons a transfer is refused before the wallet is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferRejection {
    /// Another transfer has not finished yet.
    #[error("a transfer is already in progress")]
    InProgress,

    /// The session has not finished connecting.
    #[error("wallet session is not ready")]
    NotReady,

    /// No destination was entered.
    #[error("destination address is empty")]
    EmptyDestination,

    /// The destination is neither an address nor a resolvable name.
    #[error("destination '{0}' is not a valid address")]
    InvalidDestination(String),

    /// No token contract is known for the current chain.
    #[error("the current network is not supported")]
    UnsupportedNetwork,

    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    /// The balance has not been fetched.
    #[error("balance is not available")]
    BalanceUnavailable,

    /// The amount exceeds the current balance.
    #[error("amount {requested} exceeds balance {available}")]
    InsufficientBalance { requested: String, available: String },

    /// The wallet left the validated network before the transfer was signed.
    #[error("the network changed before the transfer was submitted")]
    NetworkChanged,
}

/// Outcome of a confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was mined in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Gas used by the transaction.
    pub gas_used: u64,
}

/// What the caller gets back once a transfer is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// Checksummed recipient address.
    pub destination: String,
    /// Amount sent, in token units.
    pub amount: String,
    pub token_symbol: String,
    #[serde(flatten)]
    pub receipt: TransferReceipt,
}

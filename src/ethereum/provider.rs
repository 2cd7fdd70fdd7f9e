//! Wallet provider abstraction.
//!
//! Everything the coordinator needs from a wallet goes through
//! [`WalletProvider`], so a scripted implementation can stand in for the
//! real one in tests.

use std::sync::{Mutex, PoisonError};

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{error::Result, types::TransferReceipt};

/// Stream of chain ids announced by the wallet when the user switches network.
pub type NetworkChanges = mpsc::UnboundedReceiver<u64>;

/// The single point of contact with a wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a usable wallet is present. Computed once at construction.
    fn is_available(&self) -> bool;

    /// Ask the user for account access.
    ///
    /// Fails with `ConnectionRejected` when the user declines or no wallet answers.
    async fn request_accounts(&self) -> Result<Address>;

    /// Current chain id. Fails with `NetworkUnavailable`.
    async fn chain_id(&self) -> Result<u64>;

    /// Address of the connected account.
    async fn account(&self) -> Result<Address>;

    /// Reverse name resolution. `None` on networks without name resolution
    /// and for addresses without a registered name.
    async fn lookup_address(&self, address: Address, chain_id: u64) -> Result<Option<String>>;

    /// Forward name resolution, same network rules as `lookup_address`.
    async fn resolve_name(&self, name: &str, chain_id: u64) -> Result<Option<Address>>;

    /// Subscribe to network switches. Closes any previous subscription.
    fn subscribe_network_changes(&self) -> NetworkChanges;

    /// Drop the current subscription, if any.
    fn unsubscribe_network_changes(&self);

    /// Execute a read-only contract call.
    async fn read_contract(&self, to: Address, calldata: Bytes) -> Result<Bytes>;

    /// Sign and submit a contract transaction on `chain_id`.
    ///
    /// Fails with `TransferRejected` when signing is declined and
    /// `TransferFailed` when the node refuses the transaction or the wallet
    /// is no longer on `chain_id`.
    async fn write_contract(&self, chain_id: u64, to: Address, calldata: Bytes) -> Result<TxHash>;

    /// Wait until the transaction is mined. Fails with `TransferFailed` on revert.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransferReceipt>;
}

/// Single-subscriber fan-out for network change events.
#[derive(Debug, Default)]
pub struct NetworkChangeHub {
    subscriber: Mutex<Option<mpsc::UnboundedSender<u64>>>,
}

impl NetworkChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription, closing the previous one.
    pub fn subscribe(&self) -> NetworkChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        let previous = self.slot().replace(tx);
        if previous.is_some() {
            tracing::debug!("Replacing existing network change subscription");
        }
        rx
    }

    pub fn unsubscribe(&self) {
        self.slot().take();
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Deliver a change to the subscriber. Returns false when nobody listens.
    pub fn emit(&self, chain_id: u64) -> bool {
        match self.slot().as_ref() {
            Some(tx) => tx.send(chain_id).is_ok(),
            None => false,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<u64>>> {
        self.subscriber.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

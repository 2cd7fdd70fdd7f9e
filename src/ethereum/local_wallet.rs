//! Wallet provider backed by a local key and JSON-RPC endpoints.
//!
//! Plays the role of the injected browser wallet: it holds the account,
//! knows which network is active, signs transactions, and announces network
//! switches to its single subscriber.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, Bytes, TxHash, B256},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use crate::{
    config::Config,
    error::{AppError, Result},
    ethereum::{
        constants::{ENS_REGISTRY_ADDRESS, PRIMARY_CHAIN_ID},
        contracts::{namehash, reverse_node, IEnsRegistry, IEnsResolver},
        provider::{NetworkChangeHub, NetworkChanges, WalletProvider},
        AccountKey, EthereumClient,
    },
    types::TransferReceipt,
};

/// Local signing wallet with one RPC client per configured chain.
pub struct LocalWallet {
    key: Option<AccountKey>,
    clients: HashMap<u64, EthereumClient>,
    active_chain: AtomicU64,
    approved: AtomicBool,
    available: bool,
    network_changes: NetworkChangeHub,
    /// Chain each submitted transaction was sent on.
    pending: Mutex<HashMap<TxHash, u64>>,
    receipt_poll_interval: Duration,
}

impl LocalWallet {
    /// Build the wallet from configuration.
    ///
    /// No network calls are made. Without a private key or without any
    /// endpoint the wallet reports itself unavailable.
    pub fn new(config: &Config) -> Result<Self> {
        let key = config.private_key.as_deref().map(AccountKey::from_private_key).transpose()?;

        let mut clients = HashMap::new();
        if let Some(key) = &key {
            for (chain_id, url) in &config.rpc_urls {
                clients.insert(*chain_id, EthereumClient::new(url, key.wallet())?);
            }
        }

        let active_chain = if clients.contains_key(&config.initial_chain_id) {
            config.initial_chain_id
        } else {
            clients.keys().min().copied().unwrap_or(config.initial_chain_id)
        };

        let available = key.is_some() && !clients.is_empty();
        if available {
            tracing::info!(
                chain_id = active_chain,
                networks = clients.len(),
                "Local wallet ready"
            );
        } else {
            tracing::warn!("No wallet key or RPC endpoint configured; wallet unavailable");
        }

        Ok(Self {
            key,
            clients,
            active_chain: AtomicU64::new(active_chain),
            approved: AtomicBool::new(false),
            available,
            network_changes: NetworkChangeHub::new(),
            pending: Mutex::new(HashMap::new()),
            receipt_poll_interval: config.receipt_poll_interval,
        })
    }

    /// Chain the wallet currently points at.
    pub fn active_chain(&self) -> u64 {
        self.active_chain.load(Ordering::SeqCst)
    }

    /// Chains with a configured endpoint, ascending.
    pub fn chains(&self) -> Vec<u64> {
        let mut chains: Vec<u64> = self.clients.keys().copied().collect();
        chains.sort_unstable();
        chains
    }

    /// Switch the active network, as a user would in the wallet UI.
    ///
    /// The change is announced to the current subscriber.
    pub fn switch_network(&self, chain_id: u64) -> Result<()> {
        if !self.clients.contains_key(&chain_id) {
            return Err(AppError::Wallet(format!("No RPC endpoint configured for chain {}", chain_id)));
        }

        let previous = self.active_chain.swap(chain_id, Ordering::SeqCst);
        tracing::info!(from = previous, to = chain_id, "Wallet network switched");

        if !self.network_changes.emit(chain_id) {
            tracing::debug!(chain_id, "No network change subscriber");
        }
        Ok(())
    }

    fn key(&self) -> Result<&AccountKey> {
        self.key.as_ref().ok_or_else(|| AppError::Wallet("No wallet key configured".into()))
    }

    fn client(&self, chain_id: u64) -> Result<&EthereumClient> {
        self.clients
            .get(&chain_id)
            .ok_or_else(|| AppError::Wallet(format!("No RPC endpoint configured for chain {}", chain_id)))
    }

    fn active_client(&self) -> Result<&EthereumClient> {
        self.client(self.active_chain())
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<TxHash, u64>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address of the ENS resolver for `node`, `None` when unset.
    async fn ens_resolver(&self, client: &EthereumClient, node: B256) -> Result<Option<Address>> {
        let registry = IEnsRegistry::new(ENS_REGISTRY_ADDRESS, client.provider().clone());
        let resolver: Address = registry.resolver(node).call().await?;
        Ok((resolver != Address::ZERO).then_some(resolver))
    }
}

/// Whether a node error message says the user refused to sign.
///
/// Covers signers that report the refusal only in text.
fn is_user_rejection(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("user rejected") || message.contains("user denied")
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_accounts(&self) -> Result<Address> {
        if !self.available {
            return Err(AppError::ConnectionRejected("No compatible wallet found".into()));
        }
        let address = self.key()?.address();
        self.approved.store(true, Ordering::SeqCst);
        tracing::info!(address = %address, "Account access granted");
        Ok(address)
    }

    async fn chain_id(&self) -> Result<u64> {
        let client = self.active_client().map_err(|e| AppError::NetworkUnavailable(e.to_string()))?;
        client.chain_id().await.map_err(|e| AppError::NetworkUnavailable(e.to_string()))
    }

    async fn account(&self) -> Result<Address> {
        if !self.approved.load(Ordering::SeqCst) {
            return Err(AppError::Wallet("Account access has not been granted".into()));
        }
        Ok(self.key()?.address())
    }

    async fn lookup_address(&self, address: Address, chain_id: u64) -> Result<Option<String>> {
        if chain_id != PRIMARY_CHAIN_ID {
            return Ok(None);
        }
        let client = self.client(chain_id)?;

        let node = reverse_node(address);
        let Some(resolver) = self.ens_resolver(client, node).await? else {
            return Ok(None);
        };

        let resolver = IEnsResolver::new(resolver, client.provider().clone());
        let name: String = resolver.name(node).call().await?;
        if name.is_empty() {
            return Ok(None);
        }

        // A reverse record is only trusted when the name points back at the address
        match self.resolve_name(&name, chain_id).await? {
            Some(forward) if forward == address => Ok(Some(name)),
            _ => {
                tracing::debug!(address = %address, name = %name, "Reverse record does not match forward resolution");
                Ok(None)
            }
        }
    }

    async fn resolve_name(&self, name: &str, chain_id: u64) -> Result<Option<Address>> {
        if chain_id != PRIMARY_CHAIN_ID {
            return Ok(None);
        }
        let client = self.client(chain_id)?;

        let node = namehash(name);
        let Some(resolver) = self.ens_resolver(client, node).await? else {
            return Ok(None);
        };

        let resolver = IEnsResolver::new(resolver, client.provider().clone());
        let address: Address = resolver.addr(node).call().await?;
        Ok((address != Address::ZERO).then_some(address))
    }

    fn subscribe_network_changes(&self) -> NetworkChanges {
        self.network_changes.subscribe()
    }

    fn unsubscribe_network_changes(&self) {
        self.network_changes.unsubscribe();
    }

    async fn read_contract(&self, to: Address, calldata: Bytes) -> Result<Bytes> {
        self.active_client()?.call_contract(to, calldata).await
    }

    async fn write_contract(&self, chain_id: u64, to: Address, calldata: Bytes) -> Result<TxHash> {
        if !self.approved.load(Ordering::SeqCst) {
            return Err(AppError::TransferRejected("Account access has not been granted".into()));
        }
        let active = self.active_chain();
        if active != chain_id {
            return Err(AppError::TransferFailed(format!(
                "Wallet is on chain {}, transaction was prepared for chain {}",
                active, chain_id
            )));
        }
        let from = self.key()?.address();
        let client = self.client(chain_id)?;

        let tx = TransactionRequest::default().to(to).input(calldata.into()).from(from);

        let tx_hash = client.send_transaction(tx).await.map_err(|e| match e {
            AppError::TransferRejected(_) => e,
            other => {
                let message = other.to_string();
                if is_user_rejection(&message) {
                    AppError::TransferRejected(message)
                } else {
                    AppError::TransferFailed(message)
                }
            }
        })?;

        self.pending().insert(tx_hash, chain_id);
        tracing::info!(tx_hash = %tx_hash, chain_id, "Transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransferReceipt> {
        let chain_id = self.pending().get(&tx_hash).copied().unwrap_or_else(|| self.active_chain());
        let client = self.client(chain_id)?;

        let receipt = loop {
            match client.get_receipt(tx_hash).await {
                Ok(Some(receipt)) => break receipt,
                Ok(None) => tokio::time::sleep(self.receipt_poll_interval).await,
                Err(e) => {
                    tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt poll failed, retrying");
                    tokio::time::sleep(self.receipt_poll_interval).await;
                }
            }
        };
        self.pending().remove(&tx_hash);

        if !receipt.status() {
            return Err(AppError::TransferFailed(format!("Transaction {} reverted", tx_hash)));
        }

        Ok(TransferReceipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("key", &self.key)
            .field("chains", &self.chains())
            .field("active_chain", &self.active_chain())
            .field("available", &self.available)
            .finish()
    }
}

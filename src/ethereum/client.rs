//! Ethereum RPC client.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

/// Type alias for the signing HTTP provider.
pub type HttpProvider = DynProvider;

/// EIP-1193 error code for a request the user declined.
const USER_REJECTED_REQUEST: i64 = 4001;

/// Whether the node answered with the user-rejected error code.
fn is_user_rejected(err: &TransportError) -> bool {
    err.as_error_resp().is_some_and(|payload| payload.code == USER_REJECTED_REQUEST)
}

/// Client for one network's JSON-RPC endpoint, signing with the local key.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: HttpProvider,
    /// RPC URL for logging.
    rpc_url: String,
    /// Lazily initialized chain ID.
    chain_id: Arc<OnceCell<u64>>,
}

impl EthereumClient {
    /// Create a new Ethereum client.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str, wallet: EthereumWallet) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        tracing::debug!(rpc_url = %rpc_url, "Ethereum client created (lazy initialization)");

        Ok(Self { provider, rpc_url: rpc_url.to_string(), chain_id: Arc::new(OnceCell::new()) })
    }

    /// Get the chain ID (fetches from network on first call).
    pub async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self.provider.get_chain_id().await?;
                tracing::info!(chain_id = chain_id, rpc_url = %self.rpc_url, "Connected to Ethereum node");
                Ok(chain_id)
            })
            .await
            .copied()
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// Execute a call without broadcasting.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let result = self.provider.call(tx.clone()).await?;
        Ok(result)
    }

    /// Make a read-only contract call.
    pub async fn call_contract(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.call(&tx).await
    }

    /// Sign and broadcast a transaction, returning its hash.
    ///
    /// A declined signature surfaces as `TransferRejected`.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            if is_user_rejected(&e) {
                AppError::TransferRejected(e.to_string())
            } else {
                AppError::from(e)
            }
        })?;
        Ok(*pending.tx_hash())
    }

    /// Fetch the receipt of a transaction, `None` while it is pending.
    pub async fn get_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt)
    }
}

impl std::fmt::Debug for EthereumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumClient").field("rpc_url", &self.rpc_url).finish()
    }
}

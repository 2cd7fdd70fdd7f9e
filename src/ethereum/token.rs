//! Typed access to the token contract through a wallet provider.

use std::sync::Arc;

use alloy::{
    primitives::{Address, TxHash, U256},
    sol_types::SolCall,
};

use crate::{
    error::{AppError, Result},
    ethereum::{contracts::IERC20, provider::WalletProvider},
    types::{TokenMetadata, TransferReceipt, MAX_TOKEN_DECIMALS},
};

/// The token contract on one network.
#[derive(Clone)]
pub struct TokenContract {
    provider: Arc<dyn WalletProvider>,
    address: Address,
}

impl TokenContract {
    pub fn new(provider: Arc<dyn WalletProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Decimals reported by the contract. Fails with `MetadataFetch`.
    ///
    /// Anything above [`MAX_TOKEN_DECIMALS`] cannot be scaled within a U256
    /// and is refused.
    pub async fn decimals(&self) -> Result<u8> {
        let calldata = IERC20::decimalsCall {}.abi_encode();
        let output = self
            .provider
            .read_contract(self.address, calldata.into())
            .await
            .map_err(|e| AppError::MetadataFetch(e.to_string()))?;

        let decimals = IERC20::decimalsCall::abi_decode_returns(&output)
            .map_err(|e| AppError::MetadataFetch(e.to_string()))?;
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(AppError::MetadataFetch(format!(
                "token reports {} decimals, at most {} are supported",
                decimals, MAX_TOKEN_DECIMALS
            )));
        }
        Ok(decimals)
    }

    /// Decimals bundled with the contract address.
    pub async fn metadata(&self) -> Result<TokenMetadata> {
        let decimals = self.decimals().await?;
        Ok(TokenMetadata { decimals, contract_address: self.address })
    }

    /// Raw balance of `owner` in smallest units.
    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        tracing::debug!(token = %self.address, owner = %owner, "Querying token balance");

        let calldata = IERC20::balanceOfCall { owner }.abi_encode();
        let output = self.provider.read_contract(self.address, calldata.into()).await?;
        let balance = IERC20::balanceOfCall::abi_decode_returns(&output)?;
        Ok(balance)
    }

    /// Submit `transfer(to, amount)` on `chain_id` for signing.
    pub async fn transfer(&self, chain_id: u64, to: Address, amount: U256) -> Result<TxHash> {
        let calldata = IERC20::transferCall { to, amount }.abi_encode();
        let submitted = self.provider.write_contract(chain_id, self.address, calldata.into()).await;
        submitted.map_err(|e| match e {
            AppError::TransferRejected(_) | AppError::TransferFailed(_) => e,
            other => AppError::TransferFailed(other.to_string()),
        })
    }

    /// Wait until a submitted transfer is mined.
    pub async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TransferReceipt> {
        self.provider.wait_for_receipt(tx_hash).await.map_err(|e| match e {
            AppError::TransferFailed(_) => e,
            other => AppError::TransferFailed(other.to_string()),
        })
    }
}

impl std::fmt::Debug for TokenContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenContract").field("address", &self.address).finish()
    }
}

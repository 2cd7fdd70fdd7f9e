//! Token transfer orchestration.
//!
//! Validates a transfer against the session, submits it through the wallet,
//! waits for confirmation and refreshes the balance.

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    ethereum::{constants::TOKEN_SYMBOL, TokenContract},
    services::SessionCoordinator,
    types::{
        decimal_to_units, format_units, NoticeKind, SessionState, TransferOutcome,
        TransferRejection, TransferRequest,
    },
};

/// A transfer that passed every local check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    /// Trimmed destination as entered.
    pub destination: String,
    pub chain_id: u64,
    pub token_address: Address,
    /// Amount in smallest units, from the unrounded input.
    pub raw_amount: U256,
    pub decimals: u8,
}

/// Check `request` against `state` without touching the wallet.
///
/// Whether the destination resolves is checked later, since names need the
/// wallet to resolve.
pub fn validate(
    state: &SessionState,
    request: &TransferRequest,
) -> std::result::Result<ValidatedTransfer, TransferRejection> {
    if !state.is_ready() {
        return Err(TransferRejection::NotReady);
    }

    let destination = request.destination.trim();
    if destination.is_empty() {
        return Err(TransferRejection::EmptyDestination);
    }

    let entry = state.network.entry().ok_or(TransferRejection::UnsupportedNetwork)?;

    if request.amount <= Decimal::ZERO {
        return Err(TransferRejection::NonPositiveAmount);
    }

    let (Some(token), Some(balance)) = (state.token, state.token_balance) else {
        return Err(TransferRejection::BalanceUnavailable);
    };

    let insufficient = || TransferRejection::InsufficientBalance {
        requested: request.amount.normalize().to_string(),
        available: balance.exact(),
    };

    let raw_amount = decimal_to_units(request.amount, token.decimals).map_err(|_| insufficient())?;
    if raw_amount.is_zero() {
        // Finer than the token's smallest unit
        return Err(TransferRejection::NonPositiveAmount);
    }
    if raw_amount > balance.raw {
        return Err(insufficient());
    }

    Ok(ValidatedTransfer {
        destination: destination.to_string(),
        chain_id: entry.chain_id,
        token_address: token.contract_address,
        raw_amount,
        decimals: token.decimals,
    })
}

/// Sends the token on the session's current network.
#[derive(Clone, Debug)]
pub struct TransferService {
    session: SessionCoordinator,
}

impl TransferService {
    pub fn new(session: SessionCoordinator) -> Self {
        Self { session }
    }

    /// Validate, submit and confirm a transfer.
    ///
    /// Every failure is also pushed as a notification.
    pub async fn send(&self, request: TransferRequest) -> Result<TransferOutcome> {
        match self.execute(&request).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(
                    destination = %request.destination,
                    amount = %request.amount,
                    error = %e,
                    "Transfer not completed"
                );
                self.session.notifications().notify_error(&e);
                Err(e)
            }
        }
    }

    async fn execute(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let _guard = self.session.begin_sending().ok_or(TransferRejection::InProgress)?;

        // Read before the state so a concurrent commit can only make it older
        let generation = self.session.generation();
        let transfer = validate(&self.session.state(), request)?;
        let to = self.resolve_destination(&transfer.destination).await?;

        let chain_id = self.session.provider().chain_id().await?;
        if chain_id != transfer.chain_id || self.session.generation() != generation {
            tracing::warn!(
                validated_chain_id = transfer.chain_id,
                wallet_chain_id = chain_id,
                "Wallet network changed before submission"
            );
            return Err(TransferRejection::NetworkChanged.into());
        }

        tracing::info!(
            chain_id = transfer.chain_id,
            token = %transfer.token_address,
            to = %to,
            raw_amount = %transfer.raw_amount,
            "Submitting transfer"
        );

        let token = TokenContract::new(self.session.provider(), transfer.token_address);
        let tx_hash = token.transfer(transfer.chain_id, to, transfer.raw_amount).await?;
        let receipt = token.wait_for_confirmation(tx_hash).await?;

        tracing::info!(
            tx_hash = %receipt.tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transfer confirmed"
        );

        if let Err(e) = self.session.refresh_balance().await {
            tracing::warn!(error = %e, "Balance refresh after transfer failed");
            self.session.notifications().notify_error(&e);
        }

        self.session
            .notifications()
            .push(NoticeKind::TransferConfirmed, Some(receipt.tx_hash.to_string()));

        Ok(TransferOutcome {
            destination: to.to_checksum(None),
            amount: format_units(transfer.raw_amount, transfer.decimals),
            token_symbol: TOKEN_SYMBOL.to_string(),
            receipt,
        })
    }

    /// Parse a hex address, falling back to name resolution on the primary network.
    async fn resolve_destination(&self, destination: &str) -> Result<Address> {
        if let Ok(address) = destination.parse::<Address>() {
            return Ok(address);
        }

        let invalid = || AppError::from(TransferRejection::InvalidDestination(destination.to_string()));

        let registry = self.session.registry();
        let primary = registry.primary_chain_id();
        let on_primary = self.session.state().chain_id == Some(primary);
        if !on_primary || !destination.contains('.') {
            return Err(invalid());
        }

        match self.session.provider().resolve_name(destination, primary).await {
            Ok(Some(address)) => {
                tracing::debug!(name = %destination, address = %address, "Resolved destination name");
                Ok(address)
            }
            Ok(None) => Err(invalid()),
            Err(e) => {
                tracing::debug!(name = %destination, error = %e, "Destination name lookup failed");
                Err(invalid())
            }
        }
    }
}

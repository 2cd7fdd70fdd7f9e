//! Session state and its render snapshot.

use alloy::primitives::Address;
use serde::Serialize;

use crate::{
    ethereum::constants::{BALANCE_DISPLAY_DECIMALS, DISPLAY_ADDRESS_PREFIX_LEN, TOKEN_SYMBOL},
    types::{NetworkStatus, TokenBalance, TokenMetadata},
};

/// Phase of the wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Connecting,
    Resolving,
    Ready,
}

/// Session state owned by the coordinator.
///
/// A fresh value is built for every connect attempt and every network
/// resolution, and swapped in as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub is_wallet_available: bool,
    pub is_connecting: bool,
    pub chain_id: Option<u64>,
    pub network: NetworkStatus,
    pub account_address: Option<Address>,
    /// Checksummed address or resolved name.
    pub display_identity: String,
    pub used_name_resolution: bool,
    /// Token metadata for `chain_id`; dropped whenever the chain changes.
    pub token: Option<TokenMetadata>,
    pub token_balance: Option<TokenBalance>,
}

impl SessionState {
    /// The disconnected shape.
    pub fn new(is_wallet_available: bool) -> Self {
        Self {
            phase: SessionPhase::Idle,
            is_wallet_available,
            is_connecting: false,
            chain_id: None,
            network: NetworkStatus::Unknown,
            account_address: None,
            display_identity: String::new(),
            used_name_resolution: false,
            token: None,
            token_balance: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    /// Drop every field that depends on the chain id.
    pub fn clear_chain(&mut self) {
        self.chain_id = None;
        self.network = NetworkStatus::Unknown;
        self.token = None;
        self.token_balance = None;
    }

    /// Set the account and show its checksummed address.
    pub fn set_account(&mut self, address: Address) {
        self.account_address = Some(address);
        self.display_identity = address.to_checksum(None);
        self.used_name_resolution = false;
    }

    /// Prefer a resolved name for display.
    pub fn set_resolved_name(&mut self, name: String) {
        self.display_identity = name;
        self.used_name_resolution = true;
    }

    /// Render snapshot of this state.
    pub fn view(&self, is_sending: bool) -> SessionView {
        let display_identity = if self.display_identity.is_empty() {
            None
        } else if self.used_name_resolution {
            Some(self.display_identity.clone())
        } else {
            Some(self.display_identity.chars().take(DISPLAY_ADDRESS_PREFIX_LEN).collect())
        };

        let can_send = self.is_ready()
            && !self.is_connecting
            && !is_sending
            && self.network.entry().is_some()
            && self.token_balance.is_some();

        SessionView {
            wallet_available: self.is_wallet_available,
            phase: self.phase,
            is_connecting: self.is_connecting,
            is_sending,
            chain_id: self.chain_id,
            network_label: self.network.label(),
            account_address: self.account_address.map(|a| a.to_checksum(None)),
            display_identity,
            used_name_resolution: self.used_name_resolution,
            balance: self.token_balance.map(|b| b.display(BALANCE_DISPLAY_DECIMALS)),
            token_symbol: TOKEN_SYMBOL.to_string(),
            can_connect: self.is_wallet_available && !self.is_connecting && !is_sending,
            can_send,
        }
    }
}

/// Read-only snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub wallet_available: bool,
    pub phase: SessionPhase,
    pub is_connecting: bool,
    pub is_sending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Network name or "unsupported network".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_address: Option<String>,
    /// Resolved name, or the address cut to its display prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_identity: Option<String>,
    pub used_name_resolution: bool,
    /// Balance rounded for presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    pub token_symbol: String,
    pub can_connect: bool,
    pub can_send: bool,
}

impl Default for SessionView {
    fn default() -> Self {
        SessionState::new(false).view(false)
    }
}

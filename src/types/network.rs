//! Network-related types.

use alloy::primitives::Address;

use crate::ethereum::constants::UNSUPPORTED_NETWORK_LABEL;

/// A supported network and the token contract deployed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    /// Numeric chain identifier.
    pub chain_id: u64,
    /// Display name of the network.
    pub name: String,
    /// Token contract address on this network.
    pub token_address: Address,
}

impl NetworkEntry {
    pub fn new(chain_id: u64, name: impl Into<String>, token_address: Address) -> Self {
        Self { chain_id, name: name.into(), token_address }
    }
}

/// What is known about the wallet's current network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    /// The chain id has not been obtained.
    #[default]
    Unknown,
    /// The chain has a configured token contract.
    Supported(NetworkEntry),
    /// The chain has no registry entry.
    Unsupported(u64),
}

impl NetworkStatus {
    /// The registry entry, if the network is supported.
    pub fn entry(&self) -> Option<&NetworkEntry> {
        match self {
            NetworkStatus::Supported(entry) => Some(entry),
            _ => None,
        }
    }

    /// Label to render, `None` while the network is unknown.
    pub fn label(&self) -> Option<String> {
        match self {
            NetworkStatus::Unknown => None,
            NetworkStatus::Supported(entry) => Some(entry.name.clone()),
            NetworkStatus::Unsupported(_) => Some(UNSUPPORTED_NETWORK_LABEL.to_string()),
        }
    }
}

//! Chain registry.
//!
//! Static mapping from chain id to network name and token contract. Built
//! once at startup and never mutated.

use std::{collections::HashMap, str::FromStr};

use crate::{
    error::{AppError, Result},
    ethereum::constants::{
        ETHEREUM_MAINNET_CHAIN_ID, GNOSIS_CHAIN_ID, JPYC_ETHEREUM_ADDRESS, JPYC_GNOSIS_ADDRESS,
        JPYC_POLYGON_ADDRESS, POLYGON_CHAIN_ID, PRIMARY_CHAIN_ID,
    },
    types::NetworkEntry,
};

/// Which networks the registry contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkProfile {
    /// Ethereum, xDAI and Polygon.
    #[default]
    Full,
    /// Ethereum only.
    Primary,
}

impl FromStr for NetworkProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(NetworkProfile::Full),
            "primary" => Ok(NetworkProfile::Primary),
            _ => Err(format!("Invalid network profile: {}", s)),
        }
    }
}

/// Lookup table of supported networks.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    by_chain_id: HashMap<u64, NetworkEntry>,
    primary_chain_id: u64,
}

impl ChainRegistry {
    /// Registry for the given profile.
    pub fn for_profile(profile: NetworkProfile) -> Self {
        let ethereum = NetworkEntry::new(ETHEREUM_MAINNET_CHAIN_ID, "Ethereum", JPYC_ETHEREUM_ADDRESS);
        let entries = match profile {
            NetworkProfile::Primary => vec![ethereum],
            NetworkProfile::Full => vec![
                ethereum,
                NetworkEntry::new(GNOSIS_CHAIN_ID, "xDAI", JPYC_GNOSIS_ADDRESS),
                NetworkEntry::new(POLYGON_CHAIN_ID, "Polygon", JPYC_POLYGON_ADDRESS),
            ],
        };

        let by_chain_id = entries.into_iter().map(|e| (e.chain_id, e)).collect();
        Self { by_chain_id, primary_chain_id: PRIMARY_CHAIN_ID }
    }

    /// The three-network registry.
    pub fn full() -> Self {
        Self::for_profile(NetworkProfile::Full)
    }

    /// The primary-network-only registry.
    pub fn primary_only() -> Self {
        Self::for_profile(NetworkProfile::Primary)
    }

    /// Build a registry from explicit entries.
    ///
    /// # Errors
    /// Returns a configuration error if two entries share a chain id.
    pub fn from_entries(entries: Vec<NetworkEntry>, primary_chain_id: u64) -> Result<Self> {
        let mut by_chain_id = HashMap::with_capacity(entries.len());
        for entry in entries {
            let chain_id = entry.chain_id;
            if by_chain_id.insert(chain_id, entry).is_some() {
                return Err(AppError::Config(format!("Duplicate chain id in registry: {}", chain_id)));
            }
        }
        Ok(Self { by_chain_id, primary_chain_id })
    }

    /// Entry for `chain_id`, `None` for unsupported networks.
    pub fn lookup(&self, chain_id: u64) -> Option<&NetworkEntry> {
        self.by_chain_id.get(&chain_id)
    }

    /// Whether `chain_id` is the network with name resolution.
    pub fn is_primary(&self, chain_id: u64) -> bool {
        chain_id == self.primary_chain_id
    }

    pub fn primary_chain_id(&self) -> u64 {
        self.primary_chain_id
    }

    /// All entries, ordered by chain id.
    pub fn entries(&self) -> Vec<&NetworkEntry> {
        let mut entries: Vec<&NetworkEntry> = self.by_chain_id.values().collect();
        entries.sort_by_key(|e| e.chain_id);
        entries
    }

    pub fn len(&self) -> usize {
        self.by_chain_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chain_id.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::full()
    }
}

//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{collections::BTreeMap, env, time::Duration};

use crate::{
    error::AppError,
    ethereum::constants::{ETHEREUM_MAINNET_CHAIN_ID, GNOSIS_CHAIN_ID, POLYGON_CHAIN_ID},
    services::NetworkProfile,
};

/// Environment variables holding the RPC endpoint of each known chain.
const RPC_URL_VARS: [(&str, u64); 3] = [
    ("ETHEREUM_RPC_URL", ETHEREUM_MAINNET_CHAIN_ID),
    ("GNOSIS_RPC_URL", GNOSIS_CHAIN_ID),
    ("POLYGON_RPC_URL", POLYGON_CHAIN_ID),
];

/// Default lifetime of a notification.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Private key of the local wallet (hex). No key means no wallet.
    pub private_key: Option<String>,
    /// JSON-RPC endpoint per chain id.
    pub rpc_urls: BTreeMap<u64, String>,
    /// Which chain registry table to use.
    pub network_profile: NetworkProfile,
    /// Network the wallet starts on.
    pub initial_chain_id: u64,
    /// How long notifications stay visible.
    pub notification_ttl: Duration,
    /// How often pending transactions are polled for a receipt.
    pub receipt_poll_interval: Duration,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            private_key: None,
            rpc_urls: BTreeMap::new(),
            network_profile: NetworkProfile::default(),
            initial_chain_id: ETHEREUM_MAINNET_CHAIN_ID,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `WALLET_PRIVATE_KEY`: Private key of the local wallet (hex)
    /// - `ETHEREUM_RPC_URL`, `GNOSIS_RPC_URL`, `POLYGON_RPC_URL`: endpoints per chain
    /// - `NETWORK_PROFILE`: `full` (three networks, default) or `primary`
    /// - `INITIAL_CHAIN_ID`: chain the wallet starts on (default: 1)
    /// - `NOTIFICATION_TTL_SECS`: notification lifetime (default: 5)
    /// - `RECEIPT_POLL_INTERVAL_MS`: receipt poll interval (default: 1000)
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let rpc_urls = RPC_URL_VARS
            .iter()
            .filter_map(|&(key, chain_id)| var(key).map(|url| (chain_id, url)))
            .collect();

        let network_profile = match var("NETWORK_PROFILE") {
            Some(profile) => profile.parse().map_err(AppError::Config)?,
            None => defaults.network_profile,
        };

        let initial_chain_id = match var("INITIAL_CHAIN_ID") {
            Some(id) => id
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid INITIAL_CHAIN_ID '{}': {}", id, e)))?,
            None => defaults.initial_chain_id,
        };

        let notification_ttl = match var("NOTIFICATION_TTL_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|e| {
                AppError::Config(format!("Invalid NOTIFICATION_TTL_SECS '{}': {}", secs, e))
            })?),
            None => defaults.notification_ttl,
        };

        let receipt_poll_interval = match var("RECEIPT_POLL_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(ms.parse().map_err(|e| {
                AppError::Config(format!("Invalid RECEIPT_POLL_INTERVAL_MS '{}': {}", ms, e))
            })?),
            None => defaults.receipt_poll_interval,
        };

        Ok(Self {
            private_key: var("WALLET_PRIVATE_KEY"),
            rpc_urls,
            network_profile,
            initial_chain_id,
            notification_ttl,
            receipt_poll_interval,
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

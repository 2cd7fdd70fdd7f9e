//! Ethereum interaction module.
//!
//! Contains the wallet provider abstraction, the local wallet behind it, the
//! RPC client, and contract bindings.

pub mod client;
pub mod constants;
pub mod contracts;
pub mod local_wallet;
pub mod provider;
pub mod token;
pub mod wallet;

pub use client::{EthereumClient, HttpProvider};
pub use local_wallet::LocalWallet;
pub use provider::{NetworkChangeHub, NetworkChanges, WalletProvider};
pub use token::TokenContract;
pub use wallet::AccountKey;

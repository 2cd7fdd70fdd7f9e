//! Otoshidama
//!
//! Wallet session and JPYC transfer coordinator, exposed as a Model Context
//! Protocol server.
//!
//! # Features
//!
//! - **Session**: connect a wallet, detect its network, resolve its ENS name
//!   and fetch the JPYC balance, re-resolving whenever the network changes
//! - **Networks**: JPYC on Ethereum, xDAI and Polygon, or Ethereum only
//! - **Transfers**: validate, sign, confirm, then refresh the balance
//! - **Notifications**: dismissible, auto-expiring messages for every failure
//!
//! # Example
//!
//! ```rust,ignore
//! use otoshidama::{Config, OtoshidamaServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = OtoshidamaServer::new(config)?;
//!     let view = server.session().connect().await;
//!     println!("{:?}", view.balance);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ethereum;
pub mod mcp;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use ethereum::constants::*;
pub use mcp::OtoshidamaServer;

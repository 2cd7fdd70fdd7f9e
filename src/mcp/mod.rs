//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::OtoshidamaServer;
pub use server::{DismissNotificationInput, SendTokenInput, SwitchNetworkInput};

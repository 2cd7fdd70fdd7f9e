//! MCP server implementation.
//!
//! Each tool forwards one user intent into the coordinator and answers with
//! JSON.

use std::{str::FromStr, sync::Arc, time::Duration};

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::Config,
    error::AppError,
    ethereum::{LocalWallet, WalletProvider},
    services::{ChainRegistry, NotificationCenter, SessionCoordinator, TransferService},
    types::{SessionPhase, TransferRequest},
};

/// How long switch_network waits for the session to re-resolve.
const SWITCH_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Otoshidama MCP server.
///
/// Holds one wallet session and lets a client connect, inspect the session,
/// switch network and send the token.
#[derive(Clone)]
pub struct OtoshidamaServer {
    session: SessionCoordinator,
    transfers: TransferService,
    wallet: Arc<LocalWallet>,
    tool_router: ToolRouter<Self>,
}

impl OtoshidamaServer {
    /// Create a new server.
    ///
    /// No network calls are made here; the wallet is only contacted when a
    /// tool is invoked.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!(profile = ?config.network_profile, "Initializing Otoshidama MCP Server");

        let wallet = Arc::new(LocalWallet::new(&config)?);
        let registry = Arc::new(ChainRegistry::for_profile(config.network_profile));
        let networks: Vec<&str> = registry.entries().into_iter().map(|e| e.name.as_str()).collect();
        tracing::info!(networks = ?networks, "Supported networks");
        let notifications = NotificationCenter::new(config.notification_ttl);

        let provider: Arc<dyn WalletProvider> = wallet.clone();
        let session = SessionCoordinator::new(provider, registry, notifications);
        let transfers = TransferService::new(session.clone());

        tracing::info!("Otoshidama MCP Server initialized successfully");

        Ok(Self { session, transfers, wallet, tool_router: Self::tool_router() })
    }

    /// The underlying session.
    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }
}

/// Input parameters for the send_token tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SendTokenInput {
    /// Destination address (0x...) or ENS name on Ethereum mainnet.
    pub to: String,
    /// Amount to send in JPYC (human-readable, e.g., "1000" or "12.5").
    pub amount: String,
}

/// Input parameters for the switch_network tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SwitchNetworkInput {
    /// Chain ID to switch the wallet to (e.g., 1, 100, 137).
    pub chain_id: u64,
}

/// Input parameters for the dismiss_notification tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct DismissNotificationInput {
    /// Notification ID returned by get_notifications.
    pub id: u64,
}

/// Parse a user-entered amount.
fn parse_amount(s: &str) -> Result<Decimal, McpError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("Amount cannot be empty", None));
    }
    Decimal::from_str(trimmed)
        .map_err(|e| McpError::invalid_params(format!("Invalid amount '{}': {}", s, e), None))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl OtoshidamaServer {
    /// Connect the wallet and resolve network, identity and JPYC balance.
    #[tool(
        description = "Connect the wallet, detect its network, resolve the account name and fetch the JPYC balance. Returns the session view."
    )]
    pub async fn connect_wallet(&self) -> Result<String, McpError> {
        tracing::info!("connect_wallet called");
        let view = self.session.connect().await;
        to_json(&view)
    }

    /// Drop the wallet session.
    #[tool(description = "Disconnect the wallet and reset the session.")]
    pub async fn disconnect_wallet(&self) -> Result<String, McpError> {
        tracing::info!("disconnect_wallet called");
        let view = self.session.disconnect();
        to_json(&view)
    }

    /// Current render snapshot.
    #[tool(
        description = "Get the current wallet session: network, displayed identity, JPYC balance (5 decimals) and which actions are enabled."
    )]
    pub async fn get_session(&self) -> Result<String, McpError> {
        to_json(&self.session.view())
    }

    /// Send JPYC on the current network.
    ///
    /// The amount is converted with the token's actual decimals without
    /// rounding. The call returns once the transaction is mined.
    #[tool(
        description = "Send JPYC on the wallet's current network to an address or ENS name. Waits for confirmation and refreshes the balance."
    )]
    pub async fn send_token(
        &self,
        Parameters(input): Parameters<SendTokenInput>,
    ) -> Result<String, McpError> {
        tracing::info!(to = %input.to, amount = %input.amount, "send_token called");

        let amount = parse_amount(&input.amount)?;
        let outcome = self.transfers.send(TransferRequest::new(input.to, amount)).await?;
        to_json(&outcome)
    }

    /// Switch the wallet's network, as a user would in the wallet itself.
    #[tool(
        description = "Switch the wallet to another network. A connected session re-resolves network and balance automatically."
    )]
    pub async fn switch_network(
        &self,
        Parameters(input): Parameters<SwitchNetworkInput>,
    ) -> Result<String, McpError> {
        tracing::info!(chain_id = input.chain_id, "switch_network called");

        let mut views = self.session.subscribe();
        self.wallet
            .switch_network(input.chain_id)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        // Without a live session nothing re-resolves
        if self.session.state().phase != SessionPhase::Idle {
            let settled = views.wait_for(|view| {
                view.phase == SessionPhase::Ready && view.chain_id == Some(input.chain_id)
            });
            let settled = tokio::time::timeout(SWITCH_SETTLE_TIMEOUT, settled).await.is_ok();
            if !settled {
                tracing::warn!(chain_id = input.chain_id, "Session did not settle after network switch");
            }
        }
        to_json(&self.session.view())
    }

    /// Notifications that have not expired or been dismissed.
    #[tool(description = "List active notifications (errors, warnings, confirmations).")]
    pub async fn get_notifications(&self) -> Result<String, McpError> {
        to_json(&self.session.notifications().active())
    }

    /// Dismiss a notification before it expires.
    #[tool(description = "Dismiss a notification by ID.")]
    pub async fn dismiss_notification(
        &self,
        Parameters(input): Parameters<DismissNotificationInput>,
    ) -> Result<String, McpError> {
        let dismissed = self.session.notifications().dismiss(input.id);
        to_json(&serde_json::json!({ "id": input.id, "dismissed": dismissed }))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for OtoshidamaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "otoshidama".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Otoshidama wallet server. Connect a wallet, check its JPYC balance on \
                 Ethereum, xDAI or Polygon, and send JPYC."
                    .to_string(),
            ),
        }
    }
}

impl std::fmt::Debug for OtoshidamaServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtoshidamaServer")
            .field("session", &self.session)
            .field("wallet", &self.wallet)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_amount(" 1000 ").unwrap(), Decimal::from(1000));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("ten").is_err());
    }
}

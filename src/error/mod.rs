//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use rmcp::ErrorData as McpError;
use thiserror::Error;

use crate::types::{NoticeKind, TransferRejection};

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ethereum RPC errors.
    #[error("Ethereum RPC error: {0}")]
    Rpc(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Wallet-related errors.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The user declined the connection request or no wallet answered.
    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    /// The wallet could not report its current network.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Token metadata could not be read.
    #[error("Token metadata error: {0}")]
    MetadataFetch(String),

    /// The user declined to sign the transfer.
    #[error("Transfer rejected: {0}")]
    TransferRejected(String),

    /// The transfer reverted on-chain or the node refused it.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// The transfer request did not pass local validation.
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(#[from] TransferRejection),
}

impl AppError {
    /// The notification kind this error is surfaced as.
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            AppError::ConnectionRejected(_) => NoticeKind::ConnectionRejected,
            AppError::NetworkUnavailable(_) => NoticeKind::NetworkUnavailable,
            AppError::MetadataFetch(_) => NoticeKind::MetadataFetch,
            AppError::TransferRejected(_) => NoticeKind::TransferRejected,
            AppError::TransferFailed(_) => NoticeKind::TransferFailed,
            AppError::InvalidTransfer(TransferRejection::UnsupportedNetwork) => {
                NoticeKind::UnsupportedNetwork
            }
            AppError::InvalidTransfer(_) => NoticeKind::InvalidTransfer,
            _ => NoticeKind::WalletError,
        }
    }
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<alloy::contract::Error> for AppError {
    fn from(err: alloy::contract::Error) -> Self {
        AppError::Rpc(err.to_string())
    }
}

impl From<alloy::sol_types::Error> for AppError {
    fn from(err: alloy::sol_types::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidTransfer(_) | AppError::Parse(_) => {
                McpError::invalid_params(err.to_string(), None)
            }
            AppError::Config(_) => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

//! User-facing notification types.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ConnectionRejected,
    NetworkUnavailable,
    UnsupportedNetwork,
    MetadataFetch,
    NonStandardDecimals,
    WalletError,
    InvalidTransfer,
    TransferRejected,
    TransferFailed,
    TransferConfirmed,
}

impl NoticeKind {
    /// Default title shown for this kind.
    pub fn title(&self) -> &'static str {
        match self {
            NoticeKind::ConnectionRejected => "Failed to connect to the wallet.",
            NoticeKind::NetworkUnavailable => "Failed to get the current network.",
            NoticeKind::UnsupportedNetwork => "This network may not be supported.",
            NoticeKind::MetadataFetch => "Failed to read the token contract.",
            NoticeKind::NonStandardDecimals => "Something may have gone wrong.",
            NoticeKind::WalletError => "Failed to get the account.",
            NoticeKind::InvalidTransfer => "The transfer cannot be sent.",
            NoticeKind::TransferRejected => "The transfer was not signed.",
            NoticeKind::TransferFailed => "Something may have gone wrong.",
            NoticeKind::TransferConfirmed => "Transfer confirmed.",
        }
    }

    /// Default severity for this kind.
    pub fn level(&self) -> NoticeLevel {
        match self {
            NoticeKind::NonStandardDecimals => NoticeLevel::Warning,
            NoticeKind::TransferConfirmed => NoticeLevel::Success,
            _ => NoticeLevel::Error,
        }
    }
}

/// A dismissible, auto-expiring notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Identifier used to dismiss the notification.
    pub id: u64,
    pub level: NoticeLevel,
    pub kind: NoticeKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub dismissible: bool,
    /// Lifetime in milliseconds.
    pub ttl_ms: u64,
    #[serde(skip)]
    pub created_at: Instant,
}

impl Notification {
    /// Whether the notification has outlived its ttl at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= Duration::from_millis(self.ttl_ms)
    }
}

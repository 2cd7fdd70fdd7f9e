//! Business logic services module.

pub mod chain_registry;
pub mod notifications;
pub mod session;
pub mod transfer;

pub use chain_registry::{ChainRegistry, NetworkProfile};
pub use notifications::NotificationCenter;
pub use session::{SendGuard, SessionCoordinator};
pub use transfer::{validate, TransferService, ValidatedTransfer};

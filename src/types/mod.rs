//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod network;
pub mod notification;
pub mod session;
pub mod token;
pub mod transfer;

pub use network::*;
pub use notification::*;
pub use session::*;
pub use token::*;
pub use transfer::*;

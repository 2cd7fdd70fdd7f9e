//! Smart contract bindings.

pub mod ens;
pub mod erc20;

pub use ens::{namehash, reverse_node, IEnsRegistry, IEnsResolver};
pub use erc20::IERC20;

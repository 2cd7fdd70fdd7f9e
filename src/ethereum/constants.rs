//! Ethereum network constants.
//!
//! Contains chain IDs, token contract addresses and presentation constants.

use alloy::primitives::{address, Address};

// ============================================================================
// Chain IDs
// ============================================================================

/// Ethereum Mainnet chain ID. The only network with name resolution.
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Gnosis Chain (xDAI) chain ID.
pub const GNOSIS_CHAIN_ID: u64 = 100;

/// Polygon PoS chain ID.
pub const POLYGON_CHAIN_ID: u64 = 137;

/// Primary network chain ID.
pub const PRIMARY_CHAIN_ID: u64 = ETHEREUM_MAINNET_CHAIN_ID;

// ============================================================================
// JPYC Token Addresses
// ============================================================================

/// JPYC on Ethereum Mainnet.
pub const JPYC_ETHEREUM_ADDRESS: Address = address!("2370f9d504c7a6e775bf6e14b3f12846b594cd53");

/// JPYC on Gnosis Chain.
pub const JPYC_GNOSIS_ADDRESS: Address = address!("417602f4fbdd471a431ae29fb5fe0a681964c11b");

/// JPYC on Polygon.
pub const JPYC_POLYGON_ADDRESS: Address = address!("6ae7dfc73e0dde2aa99ac063dcf7e8a63265108c");

// ============================================================================
// ENS (Ethereum Mainnet)
// ============================================================================

/// ENS registry address on Ethereum Mainnet.
pub const ENS_REGISTRY_ADDRESS: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

// ============================================================================
// Token and presentation
// ============================================================================

/// Symbol of the tracked token.
pub const TOKEN_SYMBOL: &str = "JPYC";

/// Decimals the token contract is expected to report.
pub const EXPECTED_TOKEN_DECIMALS: u8 = 18;

/// Fractional digits shown for balances.
pub const BALANCE_DISPLAY_DECIMALS: u8 = 5;

/// Characters of an unresolved address shown as the display identity.
pub const DISPLAY_ADDRESS_PREFIX_LEN: usize = 12;

/// Label rendered for a chain without a registry entry.
pub const UNSUPPORTED_NETWORK_LABEL: &str = "unsupported network";

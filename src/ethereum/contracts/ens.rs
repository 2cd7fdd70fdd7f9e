//! ENS registry and resolver bindings.

use alloy::{
    primitives::{keccak256, Address, B256},
    sol,
};

sol! {
    #[sol(rpc)]
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
        function name(bytes32 node) external view returns (string memory);
    }
}

/// Compute the ENS namehash of a dotted name.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let label_hash = keccak256(label.to_lowercase().as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Node of the reverse record for `address` (`<hex>.addr.reverse`).
pub fn reverse_node(address: Address) -> B256 {
    let hex = alloy::hex::encode(address.as_slice());
    namehash(&format!("{hex}.addr.reverse"))
}

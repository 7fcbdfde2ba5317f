//! Error types for conduit-network.

use conduit_topology::NetworkNode;
use thiserror::Error;

use crate::NetworkId;

/// Result type for conduit-network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which kind of node an operation was acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Networking,
    Leaf,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Networking => f.write_str("networking"),
            NodeKind::Leaf => f.write_str("leaf"),
        }
    }
}

/// Errors raised by network edits.
///
/// None of these are recoverable: each one means the caller's view of the
/// block grid and the registry's view have diverged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Removal of a networking block that no live network contains.
    #[error("networking block {0} does not belong to any network")]
    NetworkingNodeNotFound(NetworkNode),

    /// Removal of a leaf block the registry never saw.
    #[error("leaf block {0} is not tracked")]
    LeafNodeNotFound(NetworkNode),

    /// A node removed from a network it is not a member of.
    #[error("{kind} node {node} is not part of network {network}")]
    NotInNetwork {
        network: NetworkId,
        node: NetworkNode,
        kind: NodeKind,
    },

    /// A new block shares connection sides with a block already at that location.
    #[error("{kind} block {node} overlaps connection sides of {existing}")]
    OverlappingConnections {
        node: NetworkNode,
        existing: NetworkNode,
        kind: NodeKind,
    },

    /// The exact same node was added twice.
    #[error("{kind} block {node} is already present")]
    DuplicateNode { node: NetworkNode, kind: NodeKind },

    /// A mutator was called although the matching `can_add_*` check fails.
    #[error("cannot add {kind} node {node} to network {network}")]
    PreconditionViolated {
        network: NetworkId,
        node: NetworkNode,
        kind: NodeKind,
    },
}

//! Conduit Network Tracking
//!
//! Maintains the set of connected components ("networks") formed by conduit
//! blocks on a voxel grid, incrementally, as single blocks are placed,
//! removed or rewired.
//!
//! # Node kinds
//!
//! - **Networking** blocks (cables, pipes) conduct connectivity.
//! - **Leaf** blocks (machines, endpoints) terminate it: a leaf joins every
//!   network it bonds to, but never joins two networks together.
//!
//! Two leaves bonded directly to each other, with no networking block in
//! between, form a *degenerate* network of exactly those two leaves.
//!
//! # Usage
//!
//! ```
//! use conduit_network::{ConnectionMask, Location, NetworkNode, NetworkRegistry};
//!
//! let mut registry = NetworkRegistry::new();
//! let cable = |z| NetworkNode::new(Location::new(0, 0, z), ConnectionMask::ALL);
//!
//! registry.add_networking_block(cable(1)).unwrap();
//! registry.add_networking_block(cable(-1)).unwrap();
//! registry.add_networking_block(cable(0)).unwrap();
//! assert_eq!(registry.network_count(), 1);
//!
//! let changes = registry.consume_topology_changes().unwrap();
//! assert_eq!(changes.merged().len(), 1);
//! ```
//!
//! # Change notification
//!
//! Edits accumulate into a pending [`TopologyChanges`] batch. Consumers
//! drain it with [`NetworkRegistry::consume_topology_changes`], or register
//! [`NetworkTopologyListener`]s and call
//! [`NetworkRegistry::process_topology_changes`] once per tick.

mod changes;
mod components;
mod config;
mod error;
mod listener;
mod network;
mod node_map;
mod registry;

pub use changes::{NetworkDelta, NodeDelta, TopologyChanges};
pub use config::{RegistryConfig, ValidationMode};
pub use error::{Error, NodeKind, Result};
pub use listener::{ListenerId, NetworkTopologyListener};
pub use network::{Network, NetworkId};
pub use node_map::NodeMap;
pub use registry::NetworkRegistry;

pub use conduit_topology::{ConnectionMask, Direction, Location, NetworkNode};

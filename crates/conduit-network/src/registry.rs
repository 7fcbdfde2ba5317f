//! The set of live networks and the block-level edit surface.
//!
//! # Edits
//!
//! Each edit touches only the networks next to the edited block:
//! - adding a networking block joins the first network that accepts it and
//!   merges every other acceptor into that one
//! - adding a leaf block attaches it to every accepting network, and pairs it
//!   with each bonded leaf into a degenerate network
//! - removing a networking block relabels the components of its network and
//!   keeps, deletes or splits it accordingly; every placed leaf bonded to a
//!   remaining networking node is reassigned, including leaves an earlier
//!   merge dropped
//! - removing a leaf block detaches it everywhere and deletes networks left
//!   with fewer than two members
//!
//! # Retirement
//!
//! A network that is merged away, split or deleted is dropped from the live
//! set and never comes back; split results always get fresh ids.

use std::collections::BTreeMap;

use conduit_topology::{ConnectionMask, NetworkNode};
use tracing::{debug, trace, warn};

use crate::components::{self, Component};
use crate::listener::{ListenerId, NetworkTopologyListener};
use crate::network::Network;
use crate::node_map::NodeMap;
use crate::{Error, NetworkId, NodeKind, RegistryConfig, Result, TopologyChanges};

/// Registry of every live network.
pub struct NetworkRegistry {
    config: RegistryConfig,
    networks: BTreeMap<NetworkId, Network>,
    /// Every networking block placed, attached or not
    networking_blocks: NodeMap,
    /// Every leaf block placed, attached or not
    leaf_blocks: NodeMap,
    pending: TopologyChanges,
    listeners: Vec<(ListenerId, Box<dyn NetworkTopologyListener>)>,
    next_network_id: u64,
    next_listener_id: u64,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NetworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkRegistry")
            .field("config", &self.config)
            .field("networks", &self.networks.len())
            .field("networking_blocks", &self.networking_blocks.len())
            .field("leaf_blocks", &self.leaf_blocks.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            networks: BTreeMap::new(),
            networking_blocks: NodeMap::new(),
            leaf_blocks: NodeMap::new(),
            pending: TopologyChanges::default(),
            listeners: Vec::new(),
            next_network_id: 0,
            next_listener_id: 0,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Place a networking block. Returns the network it ended up in.
    pub fn add_networking_block(&mut self, node: NetworkNode) -> Result<NetworkId> {
        if let Err(err) = check_overlap(&self.networking_blocks, &node, NodeKind::Networking) {
            warn!(%node, error = %err, "rejected networking block");
            return Err(err);
        }

        let acceptors: Vec<NetworkId> = self
            .networks
            .values()
            .filter(|network| network.can_add_networking_node(&node))
            .map(Network::id)
            .collect();

        let target = match acceptors.first() {
            Some(&target) => {
                if let Some(network) = self.networks.get_mut(&target) {
                    network.add_networking_node(node)?;
                }
                self.pending.network_updated(target);
                target
            }
            None => {
                let id = self.allocate_network_id();
                let network = Network::with_networking_node(id, node).with_validation(self.config.validation);
                self.networks.insert(id, network);
                self.pending.network_added(id);
                debug!(network = %id, %node, "created network");
                id
            }
        };
        self.networking_blocks.insert(node);
        self.pending.networking_node_added(target, node);

        for &source in acceptors.iter().skip(1) {
            self.merge(target, source);
        }
        self.attach_bonded_leaves(target, &node);

        Ok(target)
    }

    /// Place several networking blocks, stopping at the first error.
    pub fn add_networking_blocks<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = NetworkNode>,
    {
        for node in nodes {
            self.add_networking_block(node)?;
        }
        Ok(())
    }

    /// Remove a networking block and recompute its network's components.
    pub fn remove_networking_block(&mut self, node: &NetworkNode) -> Result<()> {
        let owner = self
            .networks
            .iter()
            .find(|(_, network)| network.has_networking_node(node))
            .map(|(&id, _)| id);
        let Some(mut network) = owner.and_then(|id| self.networks.remove(&id)) else {
            warn!(%node, "networking block is not part of any network");
            return Err(Error::NetworkingNodeNotFound(*node));
        };

        let id = network.id();
        if let Err(err) = network.remove_networking_node(node) {
            self.networks.insert(id, network);
            return Err(err);
        }
        self.networking_blocks.remove(node);
        self.pending.networking_node_removed(id, *node);

        // leaves a merge had to drop may fit again once this block is gone
        let mut candidates = network.leaf_map().clone();
        for remaining in network.networking_nodes() {
            candidates.extend(self.leaf_blocks.connected_to(remaining).copied());
        }

        let mut parts = components::partition(network.networking_map(), &candidates);
        match parts.len() {
            0 => self.retire(network),
            1 => {
                for leaf in network.detach_unbonded_leaves() {
                    trace!(network = %id, %leaf, "leaf detached");
                    self.pending.leaf_node_removed(id, leaf);
                }
                for leaf in parts.remove(0).leaves {
                    if network.insert_leaf(leaf) {
                        trace!(network = %id, %leaf, "leaf attached");
                        self.pending.leaf_node_added(id, leaf);
                    }
                }
                self.pending.network_updated(id);
                self.networks.insert(id, network);
            }
            _ => {
                self.retire(network);
                let results: Vec<NetworkId> = parts.into_iter().map(|part| self.spawn(part)).collect();
                debug!(source = %id, results = results.len(), "split network");
                self.pending.network_split(id, results);
            }
        }
        Ok(())
    }

    /// Remove several networking blocks, stopping at the first error.
    pub fn remove_networking_blocks<'a, I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a NetworkNode>,
    {
        for node in nodes {
            self.remove_networking_block(node)?;
        }
        Ok(())
    }

    /// Change the sides a networking block connects on.
    ///
    /// Adjacency is re-evaluated from scratch, so this is a removal followed
    /// by an addition at the same location.
    pub fn update_networking_block(
        &mut self,
        node: &NetworkNode,
        connections: ConnectionMask,
    ) -> Result<NetworkId> {
        self.remove_networking_block(node)?;
        self.add_networking_block(NetworkNode::new(node.location, connections))
    }

    /// Place a leaf block.
    ///
    /// The leaf joins every network it bonds to, and forms a degenerate
    /// network with each already placed leaf it bonds to directly.
    pub fn add_leaf_block(&mut self, node: NetworkNode) -> Result<()> {
        if let Err(err) = check_overlap(&self.leaf_blocks, &node, NodeKind::Leaf) {
            warn!(%node, error = %err, "rejected leaf block");
            return Err(err);
        }

        let acceptors: Vec<NetworkId> = self
            .networks
            .values()
            .filter(|network| network.can_add_leaf_node(&node))
            .map(Network::id)
            .collect();
        for id in acceptors {
            if let Some(network) = self.networks.get_mut(&id) {
                network.add_leaf_node(node)?;
                trace!(network = %id, %node, "leaf attached");
                self.pending.network_updated(id);
                self.pending.leaf_node_added(id, node);
            }
        }

        let partners: Vec<NetworkNode> = self.leaf_blocks.connected_to(&node).copied().collect();
        for partner in partners {
            let id = self.allocate_network_id();
            let network = Network::degenerate(id, partner, node).with_validation(self.config.validation);
            self.networks.insert(id, network);
            self.pending.network_added(id);
            self.pending.leaf_node_added(id, partner);
            self.pending.leaf_node_added(id, node);
            debug!(network = %id, a = %partner, b = %node, "created degenerate network");
        }

        self.leaf_blocks.insert(node);
        Ok(())
    }

    /// Place several leaf blocks, stopping at the first error.
    pub fn add_leaf_blocks<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = NetworkNode>,
    {
        for node in nodes {
            self.add_leaf_block(node)?;
        }
        Ok(())
    }

    /// Remove a leaf block from every network holding it.
    pub fn remove_leaf_block(&mut self, node: &NetworkNode) -> Result<()> {
        if !self.leaf_blocks.remove(node) {
            warn!(%node, "leaf block is not tracked");
            return Err(Error::LeafNodeNotFound(*node));
        }

        let holders: Vec<NetworkId> = self
            .networks
            .values()
            .filter(|network| network.has_leaf_node(node))
            .map(Network::id)
            .collect();
        for id in holders {
            let Some(network) = self.networks.get_mut(&id) else {
                continue;
            };
            let invalid = network.remove_leaf_node(node)?;
            self.pending.leaf_node_removed(id, *node);
            if invalid {
                if let Some(network) = self.networks.remove(&id) {
                    self.retire(network);
                }
            } else {
                self.pending.network_updated(id);
            }
        }
        Ok(())
    }

    /// Remove several leaf blocks, stopping at the first error.
    pub fn remove_leaf_blocks<'a, I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a NetworkNode>,
    {
        for node in nodes {
            self.remove_leaf_block(node)?;
        }
        Ok(())
    }

    /// Change the sides a leaf block connects on.
    pub fn update_leaf_block(&mut self, node: &NetworkNode, connections: ConnectionMask) -> Result<()> {
        self.remove_leaf_block(node)?;
        self.add_leaf_block(NetworkNode::new(node.location, connections))
    }

    /// All live networks, in id order.
    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn network(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(&id)
    }

    /// False once a network has been merged away, split or deleted.
    pub fn is_network_active(&self, id: NetworkId) -> bool {
        self.networks.contains_key(&id)
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// The network a networking block belongs to.
    pub fn network_with_networking_node(&self, node: &NetworkNode) -> Option<&Network> {
        self.networks.values().find(|network| network.has_networking_node(node))
    }

    /// Every network a leaf block belongs to.
    pub fn networks_with_leaf<'a>(
        &'a self,
        node: &'a NetworkNode,
    ) -> impl Iterator<Item = &'a Network> + 'a {
        self.networks.values().filter(move |network| network.has_leaf_node(node))
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take the changes accumulated since the last drain.
    ///
    /// Returns `None` if nothing changed.
    pub fn consume_topology_changes(&mut self) -> Option<TopologyChanges> {
        let changes = std::mem::take(&mut self.pending).finish();
        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }

    /// Drain pending changes and replay them into every listener, in
    /// registration order.
    pub fn process_topology_changes(&mut self) -> Option<TopologyChanges> {
        let changes = self.consume_topology_changes()?;
        for (_, listener) in self.listeners.iter_mut() {
            changes.dispatch(listener.as_mut());
        }
        Some(changes)
    }

    pub fn add_topology_listener(&mut self, listener: Box<dyn NetworkTopologyListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener, handing it back.
    pub fn remove_topology_listener(&mut self, id: ListenerId) -> Option<Box<dyn NetworkTopologyListener>> {
        let pos = self.listeners.iter().position(|(listener_id, _)| *listener_id == id)?;
        Some(self.listeners.remove(pos).1)
    }

    fn allocate_network_id(&mut self) -> NetworkId {
        let id = NetworkId(self.next_network_id);
        self.next_network_id += 1;
        id
    }

    /// Move every node of `source` into `target` and retire `source`.
    fn merge(&mut self, target: NetworkId, source: NetworkId) {
        let Some(absorbed) = self.networks.remove(&source) else {
            return;
        };
        let Some(network) = self.networks.get_mut(&target) else {
            self.networks.insert(source, absorbed);
            return;
        };

        // a location never holds both kinds in one network: networking wins
        let (networking, leaves) = absorbed.into_parts();
        for node in networking.sorted() {
            self.pending.networking_node_removed(source, node);
            for leaf in network.evict_leaves_at(node.location) {
                self.pending.leaf_node_removed(target, leaf);
            }
            if network.insert_networking(node) {
                self.pending.networking_node_added(target, node);
            }
        }
        for leaf in leaves.sorted() {
            self.pending.leaf_node_removed(source, leaf);
            if network.networking_map().occupies(leaf.location) {
                continue;
            }
            if network.insert_leaf(leaf) {
                self.pending.leaf_node_added(target, leaf);
            }
        }

        self.pending.networks_merged(target, source);
        self.pending.network_removed(source);
        self.pending.network_updated(target);
        debug!(%target, %source, size = network.network_size(), "merged networks");
    }

    /// Attach every placed leaf bonded to `node` that `target` accepts.
    fn attach_bonded_leaves(&mut self, target: NetworkId, node: &NetworkNode) {
        let Some(network) = self.networks.get_mut(&target) else {
            return;
        };
        for leaf in self.leaf_blocks.connected_to(node) {
            if network.can_add_leaf_node(leaf) {
                network.insert_leaf(*leaf);
                self.pending.leaf_node_added(target, *leaf);
                trace!(network = %target, %leaf, "leaf attached");
            }
        }
    }

    /// Create a network from a freshly labelled component.
    fn spawn(&mut self, component: Component) -> NetworkId {
        let id = self.allocate_network_id();
        for &node in &component.networking {
            self.pending.networking_node_added(id, node);
        }
        for &leaf in &component.leaves {
            self.pending.leaf_node_added(id, leaf);
        }
        let network = Network::from_parts(id, component.networking, component.leaves)
            .with_validation(self.config.validation);
        self.networks.insert(id, network);
        self.pending.network_added(id);
        id
    }

    /// Record the removal of a network that has already left the live set.
    fn retire(&mut self, network: Network) {
        let id = network.id();
        for node in network.networking_nodes() {
            self.pending.networking_node_removed(id, *node);
        }
        for leaf in network.leaf_nodes() {
            self.pending.leaf_node_removed(id, *leaf);
        }
        self.pending.network_removed(id);
        debug!(network = %id, "removed network");
    }
}

/// Reject a block that repeats or shares connection sides with one already
/// placed at the same location.
fn check_overlap(placed: &NodeMap, node: &NetworkNode, kind: NodeKind) -> Result<()> {
    for existing in placed.at(node.location) {
        if existing == node {
            return Err(Error::DuplicateNode { node: *node, kind });
        }
        if existing.connections.intersects(node.connections) {
            return Err(Error::OverlappingConnections {
                node: *node,
                existing: *existing,
                kind,
            });
        }
    }
    Ok(())
}

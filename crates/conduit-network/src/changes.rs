//! Batched topology changes.
//!
//! Edits append to a pending [`TopologyChanges`] inside the registry. The
//! consumer drains it once per tick and receives an immutable snapshot; the
//! registry starts the next batch empty.
//!
//! # Coalescing
//!
//! Node deltas cancel within a batch: a node added and then removed from the
//! same network (or the reverse) produces no node event. Network-level sets
//! are kept as recorded, except that `updated` never repeats an id already in
//! `added` or `removed`.

use std::collections::{BTreeMap, BTreeSet};

use conduit_topology::NetworkNode;

use crate::listener::NetworkTopologyListener;
use crate::NetworkId;

/// Net node additions and removals for one network and one node kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDelta {
    added: BTreeSet<NetworkNode>,
    removed: BTreeSet<NetworkNode>,
}

impl NodeDelta {
    fn record_added(&mut self, node: NetworkNode) {
        if !self.removed.remove(&node) {
            self.added.insert(node);
        }
    }

    fn record_removed(&mut self, node: NetworkNode) {
        if !self.added.remove(&node) {
            self.removed.insert(node);
        }
    }

    pub fn added(&self) -> &BTreeSet<NetworkNode> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeSet<NetworkNode> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Node deltas of both kinds for one network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkDelta {
    pub networking: NodeDelta,
    pub leaves: NodeDelta,
}

impl NetworkDelta {
    pub fn is_empty(&self) -> bool {
        self.networking.is_empty() && self.leaves.is_empty()
    }
}

/// Everything that changed since the previous drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopologyChanges {
    added: BTreeSet<NetworkId>,
    updated: BTreeSet<NetworkId>,
    removed: BTreeSet<NetworkId>,
    merged: BTreeMap<NetworkId, BTreeSet<NetworkId>>,
    split: BTreeMap<NetworkId, BTreeSet<NetworkId>>,
    nodes: BTreeMap<NetworkId, NetworkDelta>,
}

impl TopologyChanges {
    /// Networks created in this batch (including split results).
    pub fn added(&self) -> &BTreeSet<NetworkId> {
        &self.added
    }

    /// Pre-existing networks that survived the batch with different members.
    pub fn updated(&self) -> &BTreeSet<NetworkId> {
        &self.updated
    }

    /// Networks retired in this batch: deleted, merged away or split.
    pub fn removed(&self) -> &BTreeSet<NetworkId> {
        &self.removed
    }

    /// Merge target -> networks absorbed into it.
    pub fn merged(&self) -> &BTreeMap<NetworkId, BTreeSet<NetworkId>> {
        &self.merged
    }

    /// Split source -> networks that replaced it.
    pub fn split(&self) -> &BTreeMap<NetworkId, BTreeSet<NetworkId>> {
        &self.split
    }

    /// Per-network node deltas.
    pub fn node_changes(&self) -> &BTreeMap<NetworkId, NetworkDelta> {
        &self.nodes
    }

    /// Node delta of one network, if any of its members changed.
    pub fn node_changes_of(&self, network: NetworkId) -> Option<&NetworkDelta> {
        self.nodes.get(&network)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && self.removed.is_empty()
            && self.merged.is_empty()
            && self.split.is_empty()
            && self.nodes.is_empty()
    }

    /// Replay this batch into a listener.
    ///
    /// Order: additions, node additions, merges, splits, node removals,
    /// updates, removals. A network is therefore always announced before any
    /// node event concerning it, and emptied before it is removed.
    pub fn dispatch(&self, listener: &mut dyn NetworkTopologyListener) {
        for &network in &self.added {
            listener.network_added(network);
        }
        for (&network, delta) in &self.nodes {
            if !delta.networking.added.is_empty() {
                listener.networking_nodes_added(network, &delta.networking.added);
            }
            if !delta.leaves.added.is_empty() {
                listener.leaf_nodes_added(network, &delta.leaves.added);
            }
        }
        for (&target, sources) in &self.merged {
            for &source in sources {
                listener.networks_merged(target, source);
            }
        }
        for (&source, results) in &self.split {
            listener.network_split(source, results);
        }
        for (&network, delta) in &self.nodes {
            if !delta.networking.removed.is_empty() {
                listener.networking_nodes_removed(network, &delta.networking.removed);
            }
            if !delta.leaves.removed.is_empty() {
                listener.leaf_nodes_removed(network, &delta.leaves.removed);
            }
        }
        for &network in &self.updated {
            listener.network_updated(network);
        }
        for &network in &self.removed {
            listener.network_removed(network);
        }
    }

    pub(crate) fn network_added(&mut self, network: NetworkId) {
        self.added.insert(network);
    }

    pub(crate) fn network_updated(&mut self, network: NetworkId) {
        self.updated.insert(network);
    }

    pub(crate) fn network_removed(&mut self, network: NetworkId) {
        self.removed.insert(network);
    }

    pub(crate) fn networks_merged(&mut self, target: NetworkId, source: NetworkId) {
        self.merged.entry(target).or_default().insert(source);
    }

    pub(crate) fn network_split<I>(&mut self, source: NetworkId, results: I)
    where
        I: IntoIterator<Item = NetworkId>,
    {
        self.split.entry(source).or_default().extend(results);
    }

    pub(crate) fn networking_node_added(&mut self, network: NetworkId, node: NetworkNode) {
        self.nodes.entry(network).or_default().networking.record_added(node);
    }

    pub(crate) fn networking_node_removed(&mut self, network: NetworkId, node: NetworkNode) {
        self.nodes.entry(network).or_default().networking.record_removed(node);
    }

    pub(crate) fn leaf_node_added(&mut self, network: NetworkId, node: NetworkNode) {
        self.nodes.entry(network).or_default().leaves.record_added(node);
    }

    pub(crate) fn leaf_node_removed(&mut self, network: NetworkId, node: NetworkNode) {
        self.nodes.entry(network).or_default().leaves.record_removed(node);
    }

    /// Close the batch: drop cancelled node deltas and redundant updates.
    pub(crate) fn finish(mut self) -> Self {
        self.nodes.retain(|_, delta| !delta.is_empty());
        let (added, removed) = (&self.added, &self.removed);
        self.updated
            .retain(|id| !added.contains(id) && !removed.contains(id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_topology::{ConnectionMask, Location};

    fn node(z: i32) -> NetworkNode {
        NetworkNode::new(Location::new(0, 0, z), ConnectionMask::ALL)
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl NetworkTopologyListener for Recorder {
        fn network_added(&mut self, network: NetworkId) {
            self.events.push(format!("added {}", network));
        }
        fn networking_nodes_added(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
            self.events.push(format!("networking+ {} x{}", network, nodes.len()));
        }
        fn networks_merged(&mut self, target: NetworkId, source: NetworkId) {
            self.events.push(format!("merged {} <- {}", target, source));
        }
        fn networking_nodes_removed(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
            self.events.push(format!("networking- {} x{}", network, nodes.len()));
        }
        fn network_updated(&mut self, network: NetworkId) {
            self.events.push(format!("updated {}", network));
        }
        fn network_removed(&mut self, network: NetworkId) {
            self.events.push(format!("removed {}", network));
        }
    }

    #[test]
    fn add_then_remove_node_cancels() {
        let mut changes = TopologyChanges::default();
        changes.networking_node_added(NetworkId(1), node(0));
        changes.networking_node_removed(NetworkId(1), node(0));
        assert!(changes.finish().is_empty());
    }

    #[test]
    fn remove_then_add_node_cancels() {
        let mut changes = TopologyChanges::default();
        changes.leaf_node_removed(NetworkId(1), node(0));
        changes.leaf_node_added(NetworkId(1), node(0));
        assert!(changes.finish().node_changes().is_empty());
    }

    #[test]
    fn updates_of_new_or_dead_networks_are_dropped() {
        let mut changes = TopologyChanges::default();
        changes.network_added(NetworkId(1));
        changes.network_updated(NetworkId(1));
        changes.network_removed(NetworkId(2));
        changes.network_updated(NetworkId(2));
        changes.network_updated(NetworkId(3));

        let changes = changes.finish();
        assert_eq!(changes.updated().iter().copied().collect::<Vec<_>>(), vec![NetworkId(3)]);
    }

    #[test]
    fn dispatch_order() {
        let mut changes = TopologyChanges::default();
        changes.network_removed(NetworkId(2));
        changes.network_updated(NetworkId(1));
        changes.networks_merged(NetworkId(1), NetworkId(2));
        changes.networking_node_removed(NetworkId(2), node(5));
        changes.networking_node_added(NetworkId(1), node(5));
        changes.network_added(NetworkId(3));
        changes.networking_node_added(NetworkId(3), node(9));

        let mut recorder = Recorder::default();
        changes.finish().dispatch(&mut recorder);

        assert_eq!(
            recorder.events,
            vec![
                "added net-3",
                "networking+ net-1 x1",
                "networking+ net-3 x1",
                "merged net-1 <- net-2",
                "networking- net-2 x1",
                "updated net-1",
                "removed net-2",
            ]
        );
    }
}

//! A single connected component of conduit blocks.
//!
//! # Membership
//!
//! A network holds two kinds of nodes:
//! - **networking** nodes conduct: paths may pass through them
//! - **leaf** nodes terminate: a path may start or end on a leaf, never cross one
//!
//! Every member is connected to the rest of the component through networking
//! nodes, except in the degenerate case of two leaves bonded directly to each
//! other with nothing else around.
//!
//! # Distances
//!
//! Distances count face steps along bonds. They are computed by a level-order
//! search that expands only through networking nodes and are memoized per
//! unordered node pair until the next mutation.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use conduit_topology::{Location, NetworkNode};

use crate::node_map::NodeMap;
use crate::{Error, NodeKind, Result, ValidationMode};

/// Registry-assigned handle of a network.
///
/// Handles are never reused: a network that is merged away, split or deleted
/// keeps its id only as a key in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkId(pub u64);

impl NetworkId {
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net-{}", self.0)
    }
}

/// Unordered pair of nodes, used as the distance cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodePair(NetworkNode, NetworkNode);

impl NodePair {
    fn new(a: NetworkNode, b: NetworkNode) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// One connected component.
#[derive(Debug)]
pub struct Network {
    id: NetworkId,
    networking_nodes: NodeMap,
    leaf_nodes: NodeMap,
    distance_cache: RefCell<HashMap<NodePair, u32>>,
    validation: ValidationMode,
}

impl Network {
    /// Create an empty network.
    pub fn new(id: NetworkId) -> Self {
        Self {
            id,
            networking_nodes: NodeMap::new(),
            leaf_nodes: NodeMap::new(),
            distance_cache: RefCell::new(HashMap::new()),
            validation: ValidationMode::default(),
        }
    }

    /// Create a network holding a single networking node.
    pub fn with_networking_node(id: NetworkId, node: NetworkNode) -> Self {
        let mut network = Self::new(id);
        network.networking_nodes.insert(node);
        network
    }

    /// Create a network of two leaves bonded directly to each other.
    ///
    /// No adjacency check is made; the caller places both nodes.
    pub fn degenerate(id: NetworkId, a: NetworkNode, b: NetworkNode) -> Self {
        let mut network = Self::new(id);
        network.leaf_nodes.insert(a);
        network.leaf_nodes.insert(b);
        network
    }

    /// Rebuild a network from an already-connected node set.
    pub(crate) fn from_parts<N, L>(id: NetworkId, networking: N, leaves: L) -> Self
    where
        N: IntoIterator<Item = NetworkNode>,
        L: IntoIterator<Item = NetworkNode>,
    {
        let mut network = Self::new(id);
        network.networking_nodes.extend(networking);
        network.leaf_nodes.extend(leaves);
        network
    }

    /// Set how strictly mutators re-check their preconditions.
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    /// Whether `node` may join as a networking node.
    pub fn can_add_networking_node(&self, node: &NetworkNode) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.contains(node) || self.leaf_nodes.occupies(node.location) {
            return false;
        }
        self.networking_nodes.any_connected_to(node)
    }

    /// Whether `node` may join as a leaf.
    ///
    /// Leaves need a networking node to hang off; two bare leaves only form a
    /// network through [`Network::degenerate`].
    pub fn can_add_leaf_node(&self, node: &NetworkNode) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.contains(node) || self.networking_nodes.occupies(node.location) {
            return false;
        }
        self.networking_nodes.any_connected_to(node)
    }

    pub fn add_networking_node(&mut self, node: NetworkNode) -> Result<()> {
        if self.validation.is_strict() && !self.can_add_networking_node(&node) {
            return Err(self.precondition_violated(node, NodeKind::Networking));
        }
        self.insert_networking(node);
        Ok(())
    }

    pub fn add_leaf_node(&mut self, node: NetworkNode) -> Result<()> {
        if self.validation.is_strict() && !self.can_add_leaf_node(&node) {
            return Err(self.precondition_violated(node, NodeKind::Leaf));
        }
        self.insert_leaf(node);
        Ok(())
    }

    /// Remove a networking node without re-checking connectivity.
    ///
    /// The remaining nodes may no longer form a single component; working
    /// that out needs the whole component and is done by the registry.
    pub fn remove_networking_node(&mut self, node: &NetworkNode) -> Result<()> {
        if !self.networking_nodes.remove(node) {
            return Err(self.not_in_network(*node, NodeKind::Networking));
        }
        self.invalidate_distances();
        Ok(())
    }

    /// Remove a leaf.
    ///
    /// Returns `true` when the network is left with no networking nodes and
    /// at most one leaf; such a network must be discarded by the caller.
    pub fn remove_leaf_node(&mut self, node: &NetworkNode) -> Result<bool> {
        if !self.leaf_nodes.remove(node) {
            return Err(self.not_in_network(*node, NodeKind::Leaf));
        }
        self.invalidate_distances();
        Ok(self.networking_nodes.is_empty() && self.leaf_nodes.len() <= 1)
    }

    /// Insert a networking node unconditionally. Returns false if present.
    pub(crate) fn insert_networking(&mut self, node: NetworkNode) -> bool {
        self.invalidate_distances();
        self.networking_nodes.insert(node)
    }

    /// Insert a leaf unconditionally. Returns false if present.
    pub(crate) fn insert_leaf(&mut self, node: NetworkNode) -> bool {
        self.invalidate_distances();
        self.leaf_nodes.insert(node)
    }

    /// Drop every leaf no networking node bonds to any more.
    pub(crate) fn detach_unbonded_leaves(&mut self) -> Vec<NetworkNode> {
        let detached: Vec<NetworkNode> = self
            .leaf_nodes
            .sorted()
            .into_iter()
            .filter(|leaf| !self.networking_nodes.any_connected_to(leaf))
            .collect();
        for leaf in &detached {
            self.leaf_nodes.remove(leaf);
        }
        if !detached.is_empty() {
            self.invalidate_distances();
        }
        detached
    }

    /// Drop every leaf sitting at `location`.
    pub(crate) fn evict_leaves_at(&mut self, location: Location) -> Vec<NetworkNode> {
        let evicted = self.leaf_nodes.at(location).to_vec();
        for leaf in &evicted {
            self.leaf_nodes.remove(leaf);
        }
        if !evicted.is_empty() {
            self.invalidate_distances();
        }
        evicted
    }

    /// Consume the network, yielding its networking and leaf node maps.
    pub(crate) fn into_parts(self) -> (NodeMap, NodeMap) {
        (self.networking_nodes, self.leaf_nodes)
    }

    pub(crate) fn networking_map(&self) -> &NodeMap {
        &self.networking_nodes
    }

    pub(crate) fn leaf_map(&self) -> &NodeMap {
        &self.leaf_nodes
    }

    fn invalidate_distances(&mut self) {
        self.distance_cache.get_mut().clear();
    }

    fn precondition_violated(&self, node: NetworkNode, kind: NodeKind) -> Error {
        Error::PreconditionViolated {
            network: self.id,
            node,
            kind,
        }
    }

    fn not_in_network(&self, node: NetworkNode, kind: NodeKind) -> Error {
        Error::NotInNetwork {
            network: self.id,
            node,
            kind,
        }
    }

    pub fn has_networking_node(&self, node: &NetworkNode) -> bool {
        self.networking_nodes.contains(node)
    }

    pub fn has_leaf_node(&self, node: &NetworkNode) -> bool {
        self.leaf_nodes.contains(node)
    }

    /// Member of either kind.
    pub fn contains(&self, node: &NetworkNode) -> bool {
        self.has_networking_node(node) || self.has_leaf_node(node)
    }

    pub fn networking_nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.networking_nodes.iter()
    }

    pub fn leaf_nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.leaf_nodes.iter()
    }

    pub fn networking_nodes_at(&self, location: Location) -> &[NetworkNode] {
        self.networking_nodes.at(location)
    }

    pub fn leaf_nodes_at(&self, location: Location) -> &[NetworkNode] {
        self.leaf_nodes.at(location)
    }

    pub fn networking_node_count(&self) -> usize {
        self.networking_nodes.len()
    }

    pub fn leaf_node_count(&self) -> usize {
        self.leaf_nodes.len()
    }

    /// Networking plus leaf nodes; co-located nodes count separately.
    pub fn network_size(&self) -> usize {
        self.networking_nodes.len() + self.leaf_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networking_nodes.is_empty() && self.leaf_nodes.is_empty()
    }

    /// Two leaves and nothing else.
    pub fn is_degenerate(&self) -> bool {
        self.networking_nodes.is_empty() && self.leaf_nodes.len() == 2
    }

    /// Number of bonds on the shortest path between two members.
    ///
    /// Returns `None` if either node is not a member or `to` cannot be
    /// reached from `from` through networking nodes.
    pub fn distance(&self, from: &NetworkNode, to: &NetworkNode) -> Option<u32> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(0);
        }

        let key = NodePair::new(*from, *to);
        if let Some(&cached) = self.distance_cache.borrow().get(&key) {
            return Some(cached);
        }

        let found = self.search(from, to, None)?;
        self.distance_cache.borrow_mut().insert(key, found);
        Some(found)
    }

    /// Whether `to` is reachable from `from` in at most `max_distance` bonds.
    ///
    /// Stops searching once the frontier passes `max_distance`, so it is
    /// cheaper than [`Network::distance`] for threshold checks.
    pub fn is_in_distance(&self, max_distance: u32, from: &NetworkNode, to: &NetworkNode) -> bool {
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        if from == to {
            return true;
        }

        let key = NodePair::new(*from, *to);
        if let Some(&cached) = self.distance_cache.borrow().get(&key) {
            return cached <= max_distance;
        }

        match self.search(from, to, Some(max_distance)) {
            Some(found) => {
                self.distance_cache.borrow_mut().insert(key, found);
                true
            }
            None => false,
        }
    }

    /// Level-order search from `from`, crossing networking nodes only.
    fn search(&self, from: &NetworkNode, to: &NetworkNode, limit: Option<u32>) -> Option<u32> {
        let within = |distance: u32| limit.map_or(true, |max| distance <= max);

        if from.connects_to(to) {
            return within(1).then_some(1);
        }

        let mut visited: HashSet<NetworkNode> = HashSet::new();
        visited.insert(*from);

        let mut frontier: Vec<NetworkNode> = self
            .networking_nodes
            .connected_to(from)
            .copied()
            .filter(|n| visited.insert(*n))
            .collect();

        // every node in the frontier is `distance` bonds from `from`
        let mut distance = 1;
        while !frontier.is_empty() {
            distance += 1;
            if !within(distance) {
                return None;
            }
            if frontier.iter().any(|n| n.connects_to(to)) {
                return Some(distance);
            }

            let mut next = Vec::new();
            for node in &frontier {
                for neighbor in self.networking_nodes.connected_to(node) {
                    if visited.insert(*neighbor) {
                        next.push(*neighbor);
                    }
                }
            }
            frontier = next;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_topology::{ConnectionMask, Direction};

    fn node(x: i32, y: i32, z: i32) -> NetworkNode {
        NetworkNode::new(Location::new(x, y, z), ConnectionMask::ALL)
    }

    fn chain(length: i32) -> Network {
        let mut network = Network::new(NetworkId(1)).with_validation(ValidationMode::Strict);
        for z in 0..length {
            network.add_networking_node(node(0, 0, z)).unwrap();
        }
        network
    }

    #[test]
    fn empty_network_accepts_any_networking_node() {
        let network = Network::new(NetworkId(1));
        assert!(network.can_add_networking_node(&node(5, 5, 5)));
        assert!(!network.can_add_leaf_node(&node(5, 5, 5)));
    }

    #[test]
    fn networking_node_must_bond_to_networking_node() {
        let network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        assert!(network.can_add_networking_node(&node(0, 0, 1)));
        assert!(!network.can_add_networking_node(&node(0, 0, 2)));
        assert!(!network.can_add_networking_node(&node(1, 1, 0)));
    }

    #[test]
    fn member_cannot_be_added_again() {
        let network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        assert!(!network.can_add_networking_node(&node(0, 0, 0)));
        assert!(!network.can_add_leaf_node(&node(0, 0, 0)));
    }

    #[test]
    fn location_cannot_be_both_kinds() {
        let mut network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        let leaf = NetworkNode::with_directions(Location::new(0, 0, 1), [Direction::Forward]);
        network.add_leaf_node(leaf).unwrap();

        let cable = NetworkNode::with_directions(Location::new(0, 0, 1), [Direction::Forward, Direction::Up]);
        assert!(!network.can_add_networking_node(&cable));
    }

    #[test]
    fn leaf_never_bonds_through_leaf() {
        let mut network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        network.add_leaf_node(node(0, 0, 1)).unwrap();
        assert!(!network.can_add_leaf_node(&node(0, 0, 2)));
    }

    #[test]
    fn degenerate_network_rejects_everything() {
        let network = Network::degenerate(NetworkId(1), node(0, 0, 0), node(0, 0, 1));
        assert!(network.is_degenerate());
        assert_eq!(network.network_size(), 2);
        assert!(!network.can_add_leaf_node(&node(0, 0, 2)));
        assert!(!network.can_add_networking_node(&node(0, 0, 2)));
    }

    #[test]
    fn strict_mode_rejects_unchecked_add() {
        let mut network = Network::with_networking_node(NetworkId(7), node(0, 0, 0))
            .with_validation(ValidationMode::Strict);
        let err = network.add_networking_node(node(3, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            Error::PreconditionViolated {
                network: NetworkId(7),
                node: node(3, 0, 0),
                kind: NodeKind::Networking,
            }
        );
        assert_eq!(network.network_size(), 1);
    }

    #[test]
    fn trusted_mode_inserts_without_checking() {
        let mut network = Network::with_networking_node(NetworkId(7), node(0, 0, 0))
            .with_validation(ValidationMode::Trusted);
        network.add_networking_node(node(3, 0, 0)).unwrap();
        assert_eq!(network.networking_node_count(), 2);
    }

    #[test]
    fn removing_leaf_reports_invalid_network() {
        let mut network = Network::degenerate(NetworkId(1), node(0, 0, 0), node(0, 0, 1));
        assert!(network.remove_leaf_node(&node(0, 0, 0)).unwrap());

        let mut network = Network::with_networking_node(NetworkId(2), node(0, 0, 0));
        network.add_leaf_node(node(0, 0, 1)).unwrap();
        assert!(!network.remove_leaf_node(&node(0, 0, 1)).unwrap());
    }

    #[test]
    fn removing_foreign_node_fails() {
        let mut network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        assert!(matches!(
            network.remove_leaf_node(&node(0, 0, 1)),
            Err(Error::NotInNetwork { kind: NodeKind::Leaf, .. })
        ));
        assert!(matches!(
            network.remove_networking_node(&node(0, 0, 1)),
            Err(Error::NotInNetwork { kind: NodeKind::Networking, .. })
        ));
    }

    #[test]
    fn size_counts_colocated_nodes_separately() {
        let lr = NetworkNode::with_directions(Location::ORIGIN, [Direction::Left, Direction::Right]);
        let fb = NetworkNode::with_directions(Location::ORIGIN, [Direction::Forward, Direction::Backward]);
        let network = Network::from_parts(NetworkId(1), [lr, fb], []);
        assert_eq!(network.network_size(), 2);
        assert_eq!(network.networking_nodes_at(Location::ORIGIN).len(), 2);
    }

    #[test]
    fn distance_basics() {
        let network = chain(3);
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 0)), Some(0));
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 1)), Some(1));
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 2)), Some(2));
        assert_eq!(network.distance(&node(0, 0, 2), &node(0, 0, 0)), Some(2));
    }

    #[test]
    fn distance_to_non_member_is_none() {
        let network = chain(3);
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 9)), None);
        assert!(!network.is_in_distance(100, &node(0, 0, 0), &node(0, 0, 9)));
    }

    #[test]
    fn ten_node_chain_distances() {
        let network = chain(10);
        let first = node(0, 0, 0);
        let last = node(0, 0, 9);

        assert!(network.is_in_distance(9, &first, &last));
        assert!(!network.is_in_distance(8, &first, &last));
        assert_eq!(network.distance(&first, &last), Some(9));
        // answered from the cache now
        assert!(!network.is_in_distance(8, &first, &last));
        assert!(network.is_in_distance(12, &first, &last));
    }

    #[test]
    fn leaves_are_never_intermediate_hops() {
        // networking - leaf - networking is not a path
        let mut network = Network::from_parts(NetworkId(1), [node(0, 0, 0), node(0, 0, 2)], []);
        network.insert_leaf(node(0, 0, 1));
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 1)), Some(1));
        assert_eq!(network.distance(&node(0, 0, 0), &node(0, 0, 2)), None);
    }

    #[test]
    fn leaf_to_leaf_through_networking() {
        let mut network = chain(3);
        network.add_leaf_node(node(0, 0, -1)).unwrap();
        network.add_leaf_node(node(0, 0, 3)).unwrap();
        assert_eq!(network.distance(&node(0, 0, -1), &node(0, 0, 3)), Some(4));
    }

    #[test]
    fn mutation_clears_cached_distance() {
        let mut network = chain(3);
        network.add_leaf_node(node(1, 0, 2)).unwrap();
        assert_eq!(network.distance(&node(0, 0, 0), &node(1, 0, 2)), Some(3));

        // second route of equal length
        network.add_networking_node(node(1, 0, 1)).unwrap();
        assert_eq!(network.distance(&node(0, 0, 0), &node(1, 0, 2)), Some(3));

        network.remove_networking_node(&node(0, 0, 1)).unwrap();
        assert_eq!(network.distance(&node(0, 0, 0), &node(1, 0, 2)), None);
    }

    #[test]
    fn detach_drops_orphaned_leaves() {
        let mut network = chain(2);
        network.add_leaf_node(node(0, 0, 2)).unwrap();
        network.add_leaf_node(node(0, 0, -1)).unwrap();
        network.remove_networking_node(&node(0, 0, 1)).unwrap();

        let detached = network.detach_unbonded_leaves();
        assert_eq!(detached, vec![node(0, 0, 2)]);
        assert_eq!(network.network_size(), 2);
    }

    #[test]
    fn evict_clears_location() {
        let mut network = Network::with_networking_node(NetworkId(1), node(0, 0, 0));
        let facing = NetworkNode::with_directions(Location::new(0, 0, 1), [Direction::Forward]);
        let down = NetworkNode::with_directions(Location::new(0, 0, 1), [Direction::Down]);
        network.insert_leaf(facing);
        network.insert_leaf(down);

        let evicted = network.evict_leaves_at(Location::new(0, 0, 1));
        assert_eq!(evicted.len(), 2);
        assert!(network.leaf_nodes_at(Location::new(0, 0, 1)).is_empty());
        assert!(network.evict_leaves_at(Location::ORIGIN).is_empty());
    }
}

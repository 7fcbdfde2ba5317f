//! Location-keyed multimap of network nodes.
//!
//! One block location may host several nodes with different connection
//! masks, so lookups by location return a slice.

use std::collections::HashMap;

use conduit_topology::{Location, NetworkNode};

#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    by_location: HashMap<Location, Vec<NetworkNode>>,
    len: usize,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Returns false if it was already present.
    pub fn insert(&mut self, node: NetworkNode) -> bool {
        let slot = self.by_location.entry(node.location).or_default();
        if slot.contains(&node) {
            return false;
        }
        slot.push(node);
        self.len += 1;
        true
    }

    /// Remove a node. Returns false if it was absent.
    pub fn remove(&mut self, node: &NetworkNode) -> bool {
        let Some(slot) = self.by_location.get_mut(&node.location) else {
            return false;
        };
        let Some(pos) = slot.iter().position(|n| n == node) else {
            return false;
        };
        slot.swap_remove(pos);
        if slot.is_empty() {
            self.by_location.remove(&node.location);
        }
        self.len -= 1;
        true
    }

    pub fn contains(&self, node: &NetworkNode) -> bool {
        self.at(node.location).contains(node)
    }

    /// True if any node sits at `location`.
    pub fn occupies(&self, location: Location) -> bool {
        self.by_location.contains_key(&location)
    }

    /// Nodes at a location (empty if none).
    pub fn at(&self, location: Location) -> &[NetworkNode] {
        self.by_location
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes at the locations `node` faces that bond back to it.
    pub fn connected_to<'a>(
        &'a self,
        node: &'a NetworkNode,
    ) -> impl Iterator<Item = &'a NetworkNode> + 'a {
        node.facing_locations()
            .flat_map(move |location| self.at(location))
            .filter(move |other| node.connects_to(other))
    }

    /// True if some node in the map bonds with `node`.
    pub fn any_connected_to(&self, node: &NetworkNode) -> bool {
        self.connected_to(node).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkNode> {
        self.by_location.values().flatten()
    }

    /// Nodes sorted by location then mask, for deterministic traversal.
    pub fn sorted(&self) -> Vec<NetworkNode> {
        let mut nodes: Vec<_> = self.iter().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Extend<NetworkNode> for NodeMap {
    fn extend<I: IntoIterator<Item = NetworkNode>>(&mut self, iter: I) {
        for node in iter {
            self.insert(node);
        }
    }
}

impl FromIterator<NetworkNode> for NodeMap {
    fn from_iter<I: IntoIterator<Item = NetworkNode>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

//! Connected-component labeling after a networking node is removed.
//!
//! Components are grown by breadth-first flood fill over networking nodes.
//! Leaves are then assigned to every component that has a networking node
//! bonded to them, so a leaf sitting between two components ends up in both.
//! A component that already has a networking node at the leaf's location is
//! skipped.

use std::collections::{HashMap, VecDeque};

use conduit_topology::NetworkNode;

use crate::node_map::NodeMap;

/// Nodes of one connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Component {
    pub networking: Vec<NetworkNode>,
    pub leaves: Vec<NetworkNode>,
}

/// Split the given nodes into connected components.
///
/// Output order is deterministic: components are seeded in node order, and
/// node lists are sorted.
pub(crate) fn partition(networking: &NodeMap, leaves: &NodeMap) -> Vec<Component> {
    let mut labels: HashMap<NetworkNode, usize> = HashMap::with_capacity(networking.len());
    let mut components: Vec<Component> = Vec::new();

    for seed in networking.sorted() {
        if labels.contains_key(&seed) {
            continue;
        }

        let label = components.len();
        let mut members = vec![seed];
        let mut queue = VecDeque::new();
        labels.insert(seed, label);
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            for neighbor in networking.connected_to(&current) {
                if !labels.contains_key(neighbor) {
                    labels.insert(*neighbor, label);
                    members.push(*neighbor);
                    queue.push_back(*neighbor);
                }
            }
        }

        members.sort();
        components.push(Component {
            networking: members,
            leaves: Vec::new(),
        });
    }

    for leaf in leaves.sorted() {
        // a component with a networking node at the leaf's location cannot hold it
        let blocked: Vec<usize> = networking
            .at(leaf.location)
            .iter()
            .filter_map(|n| labels.get(n).copied())
            .collect();
        let mut owners: Vec<usize> = networking
            .connected_to(&leaf)
            .filter_map(|n| labels.get(n).copied())
            .filter(|label| !blocked.contains(label))
            .collect();
        owners.sort_unstable();
        owners.dedup();
        for owner in owners {
            components[owner].leaves.push(leaf);
        }
    }

    components
}

//! Shared fixtures for the conduit end-to-end tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Once;

use conduit_network::{NetworkId, NetworkRegistry, NetworkTopologyListener};
use conduit_topology::{ConnectionMask, Direction, Location, NetworkNode};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
///
/// Filtered by `RUST_LOG`; silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
            .with_test_writer()
            .try_init();
    });
}

/// Block with every face open.
pub fn block(x: i32, y: i32, z: i32) -> NetworkNode {
    NetworkNode::new(Location::new(x, y, z), ConnectionMask::ALL)
}

/// Block open only on the given faces.
pub fn block_facing<I>(x: i32, y: i32, z: i32, faces: I) -> NetworkNode
where
    I: IntoIterator<Item = Direction>,
{
    NetworkNode::with_directions(Location::new(x, y, z), faces)
}

/// Listener that tallies every callback.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountingListener {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub merged: usize,
    pub split: usize,
    pub networking_added: usize,
    pub networking_removed: usize,
    pub leaves_added: usize,
    pub leaves_removed: usize,
}

impl NetworkTopologyListener for CountingListener {
    fn network_added(&mut self, _network: NetworkId) {
        self.added += 1;
    }

    fn networking_nodes_added(&mut self, _network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.networking_added += nodes.len();
    }

    fn leaf_nodes_added(&mut self, _network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.leaves_added += nodes.len();
    }

    fn networks_merged(&mut self, _target: NetworkId, _source: NetworkId) {
        self.merged += 1;
    }

    fn network_split(&mut self, _source: NetworkId, _results: &BTreeSet<NetworkId>) {
        self.split += 1;
    }

    fn networking_nodes_removed(&mut self, _network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.networking_removed += nodes.len();
    }

    fn leaf_nodes_removed(&mut self, _network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.leaves_removed += nodes.len();
    }

    fn network_updated(&mut self, _network: NetworkId) {
        self.updated += 1;
    }

    fn network_removed(&mut self, _network: NetworkId) {
        self.removed += 1;
    }
}

/// Members of one network as seen through notifications.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirroredNetwork {
    pub networking: BTreeSet<NetworkNode>,
    pub leaves: BTreeSet<NetworkNode>,
}

/// Listener that rebuilds the registry's state purely from notifications.
///
/// Panics as soon as an event contradicts what it has seen so far: node
/// events for unknown networks, duplicate additions, removal of absent
/// nodes, or a network removed while it still has members.
#[derive(Debug, Default, Clone)]
pub struct MirrorListener {
    pub networks: BTreeMap<NetworkId, MirroredNetwork>,
    pub retired: BTreeSet<NetworkId>,
}

impl MirrorListener {
    fn live(&mut self, network: NetworkId) -> &mut MirroredNetwork {
        self.networks
            .get_mut(&network)
            .unwrap_or_else(|| panic!("event for unknown network {network}"))
    }

    /// Assert the mirror matches the registry exactly.
    pub fn assert_matches(&self, registry: &NetworkRegistry) {
        let expected: BTreeMap<NetworkId, MirroredNetwork> = registry
            .networks()
            .map(|network| {
                let mirrored = MirroredNetwork {
                    networking: network.networking_nodes().copied().collect(),
                    leaves: network.leaf_nodes().copied().collect(),
                };
                (network.id(), mirrored)
            })
            .collect();
        assert_eq!(self.networks, expected);
    }
}

impl NetworkTopologyListener for MirrorListener {
    fn network_added(&mut self, network: NetworkId) {
        assert!(!self.retired.contains(&network), "{network} reused after removal");
        let previous = self.networks.insert(network, MirroredNetwork::default());
        assert!(previous.is_none(), "{network} added twice");
    }

    fn networking_nodes_added(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        let live = self.live(network);
        for node in nodes {
            assert!(live.networking.insert(*node), "{node} already in {network}");
        }
    }

    fn leaf_nodes_added(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        let live = self.live(network);
        for node in nodes {
            assert!(live.leaves.insert(*node), "{node} already in {network}");
        }
    }

    fn networks_merged(&mut self, target: NetworkId, source: NetworkId) {
        assert!(self.networks.contains_key(&target), "merge into unknown {target}");
        assert!(self.networks.contains_key(&source), "merge from unknown {source}");
    }

    fn network_split(&mut self, source: NetworkId, results: &BTreeSet<NetworkId>) {
        assert!(self.networks.contains_key(&source), "split of unknown {source}");
        assert!(results.len() >= 2, "{source} split into {} networks", results.len());
        for result in results {
            assert!(self.networks.contains_key(result), "split result {result} not announced");
        }
    }

    fn networking_nodes_removed(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        let live = self.live(network);
        for node in nodes {
            assert!(live.networking.remove(node), "{node} not in {network}");
        }
    }

    fn leaf_nodes_removed(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        let live = self.live(network);
        for node in nodes {
            assert!(live.leaves.remove(node), "{node} not in {network}");
        }
    }

    fn network_updated(&mut self, network: NetworkId) {
        self.live(network);
    }

    fn network_removed(&mut self, network: NetworkId) {
        let members = self
            .networks
            .remove(&network)
            .unwrap_or_else(|| panic!("removal of unknown network {network}"));
        assert_eq!(members, MirroredNetwork::default(), "{network} removed while populated");
        self.retired.insert(network);
    }
}

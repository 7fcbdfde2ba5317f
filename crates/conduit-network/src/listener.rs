//! Topology listener contract.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use conduit_topology::NetworkNode;

use crate::NetworkId;

/// Receives topology changes when the registry's batch is processed.
///
/// All methods default to doing nothing, so listeners implement only the
/// events they care about. Networks are identified by id; ids reported in
/// `network_removed` are never live again.
pub trait NetworkTopologyListener {
    fn network_added(&mut self, _network: NetworkId) {}

    fn networking_nodes_added(&mut self, _network: NetworkId, _nodes: &BTreeSet<NetworkNode>) {}

    fn leaf_nodes_added(&mut self, _network: NetworkId, _nodes: &BTreeSet<NetworkNode>) {}

    /// `source` was absorbed into `target`.
    fn networks_merged(&mut self, _target: NetworkId, _source: NetworkId) {}

    /// `source` fell apart into `results`.
    fn network_split(&mut self, _source: NetworkId, _results: &BTreeSet<NetworkId>) {}

    fn networking_nodes_removed(&mut self, _network: NetworkId, _nodes: &BTreeSet<NetworkNode>) {}

    fn leaf_nodes_removed(&mut self, _network: NetworkId, _nodes: &BTreeSet<NetworkNode>) {}

    fn network_updated(&mut self, _network: NetworkId) {}

    fn network_removed(&mut self, _network: NetworkId) {}
}

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Lets the caller keep a handle on a listener the registry owns.
impl<L: NetworkTopologyListener + ?Sized> NetworkTopologyListener for Rc<RefCell<L>> {
    fn network_added(&mut self, network: NetworkId) {
        self.borrow_mut().network_added(network);
    }

    fn networking_nodes_added(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.borrow_mut().networking_nodes_added(network, nodes);
    }

    fn leaf_nodes_added(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.borrow_mut().leaf_nodes_added(network, nodes);
    }

    fn networks_merged(&mut self, target: NetworkId, source: NetworkId) {
        self.borrow_mut().networks_merged(target, source);
    }

    fn network_split(&mut self, source: NetworkId, results: &BTreeSet<NetworkId>) {
        self.borrow_mut().network_split(source, results);
    }

    fn networking_nodes_removed(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.borrow_mut().networking_nodes_removed(network, nodes);
    }

    fn leaf_nodes_removed(&mut self, network: NetworkId, nodes: &BTreeSet<NetworkNode>) {
        self.borrow_mut().leaf_nodes_removed(network, nodes);
    }

    fn network_updated(&mut self, network: NetworkId) {
        self.borrow_mut().network_updated(network);
    }

    fn network_removed(&mut self, network: NetworkId) {
        self.borrow_mut().network_removed(network);
    }
}

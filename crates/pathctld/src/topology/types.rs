//! Immutable topology snapshot types.

use pathctl_types::{Dpid, PortNo};
use std::collections::BTreeMap;

/// One direction of a link, viewed from a given switch.
///
/// The symmetric reverse entry lives under the peer switch with
/// `out_port` and `peer_port` swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAttr {
    /// Port on this switch leading toward the neighbor.
    pub out_port: PortNo,
    /// Port on the neighbor's side.
    pub peer_port: PortNo,
    /// Link weight, identical in both directions.
    pub weight: u32,
}

/// An immutable, point-in-time view of the topology graph.
///
/// Snapshots are what the path engine and the rule installer operate on:
/// a query never locks against store mutation, it just works on the graph
/// as it was when the snapshot was captured. Adjacency uses ordered maps
/// so that iteration order, and with it the path engine's tie-breaking,
/// is a pure function of the graph contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologySnapshot {
    adjacency: BTreeMap<Dpid, BTreeMap<Dpid, LinkAttr>>,
}

impl TopologySnapshot {
    pub(crate) fn from_adjacency(adjacency: BTreeMap<Dpid, BTreeMap<Dpid, LinkAttr>>) -> Self {
        Self { adjacency }
    }

    /// Returns true if the switch is present in this snapshot.
    pub fn contains_switch(&self, dpid: Dpid) -> bool {
        self.adjacency.contains_key(&dpid)
    }

    /// Iterates all switches in ascending datapath ID order.
    pub fn switches(&self) -> impl Iterator<Item = Dpid> + '_ {
        self.adjacency.keys().copied()
    }

    /// Iterates a switch's neighbors in ascending datapath ID order.
    ///
    /// Yields nothing for a switch absent from the snapshot.
    pub fn neighbors(&self, dpid: Dpid) -> impl Iterator<Item = (Dpid, &LinkAttr)> + '_ {
        self.adjacency
            .get(&dpid)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(peer, attr)| (*peer, attr)))
    }

    /// Returns the link attributes for the directed pair `(from, to)`.
    pub fn link(&self, from: Dpid, to: Dpid) -> Option<&LinkAttr> {
        self.adjacency.get(&from)?.get(&to)
    }

    /// Returns the port on `from` leading toward `to`, if such a link
    /// exists in this snapshot.
    pub fn port_towards(&self, from: Dpid, to: Dpid) -> Option<PortNo> {
        self.link(from, to).map(|attr| attr.out_port)
    }

    /// Number of switches.
    pub fn switch_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected links.
    pub fn link_count(&self) -> usize {
        let directed: usize = self.adjacency.values().map(|edges| edges.len()).sum();
        directed / 2
    }
}

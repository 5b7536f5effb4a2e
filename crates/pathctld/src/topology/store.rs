//! Mutable topology store.

use super::types::{LinkAttr, TopologySnapshot};
use log::debug;
use pathctl_common::{LinkSpec, TopologyListing};
use pathctl_types::Dpid;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Error type for topology mutations.
///
/// A rejected mutation is always a no-op: the store keeps the graph it
/// had before the call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TopologyError {
    #[error("invalid topology element: {0}")]
    InvalidElement(String),
}

/// Result type for topology mutations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Mutation counters, exposed through the coordinator's dump surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyStats {
    pub switches_added: u64,
    pub switches_removed: u64,
    pub links_upserted: u64,
    pub links_removed: u64,
    pub full_replacements: u64,
}

/// The controller's undirected switch graph.
///
/// Each physical link is stored as two directed entries so the
/// per-direction output port falls out of a single adjacency lookup.
/// The pair is always written together; there is no state in which only
/// one direction of a link exists.
///
/// The store has exactly one writer (the coordinator task). Concurrent
/// readers never touch the store itself - they capture a
/// [`TopologySnapshot`] and work on that.
#[derive(Debug, Default)]
pub struct TopologyStore {
    adjacency: BTreeMap<Dpid, BTreeMap<Dpid, LinkAttr>>,
    stats: TopologyStats,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an isolated switch. Idempotent: re-adding an existing switch
    /// leaves the graph, including its incident links, untouched.
    pub fn add_switch(&mut self, dpid: Dpid) {
        if self.adjacency.contains_key(&dpid) {
            return;
        }
        self.adjacency.insert(dpid, BTreeMap::new());
        self.stats.switches_added += 1;
        debug!("topology: switch {} added", dpid);
    }

    /// Removes a switch and every link incident to it. Idempotent.
    pub fn remove_switch(&mut self, dpid: Dpid) {
        let Some(edges) = self.adjacency.remove(&dpid) else {
            return;
        };
        for peer in edges.keys() {
            if let Some(peer_edges) = self.adjacency.get_mut(peer) {
                peer_edges.remove(&dpid);
            }
        }
        self.stats.switches_removed += 1;
        self.stats.links_removed += edges.len() as u64;
        debug!(
            "topology: switch {} removed along with {} links",
            dpid,
            edges.len()
        );
    }

    /// Upserts a link. A re-announcement of an existing link overwrites
    /// its port pair and weight; duplicates never accumulate. Endpoint
    /// switches are created if the link announcement races ahead of the
    /// switch-join event. Both directions are written in one call, so no
    /// snapshot can ever contain half a link.
    ///
    /// # Errors
    ///
    /// Rejects self-loops; the store is left unchanged.
    pub fn add_link(&mut self, spec: &LinkSpec) -> Result<()> {
        if spec.src_dpid == spec.dst_dpid {
            return Err(TopologyError::InvalidElement(format!(
                "self-loop link on switch {}",
                spec.src_dpid
            )));
        }

        self.add_switch(spec.src_dpid);
        self.add_switch(spec.dst_dpid);

        self.adjacency.entry(spec.src_dpid).or_default().insert(
            spec.dst_dpid,
            LinkAttr {
                out_port: spec.src_port,
                peer_port: spec.dst_port,
                weight: spec.weight,
            },
        );
        self.adjacency.entry(spec.dst_dpid).or_default().insert(
            spec.src_dpid,
            LinkAttr {
                out_port: spec.dst_port,
                peer_port: spec.src_port,
                weight: spec.weight,
            },
        );

        self.stats.links_upserted += 1;
        debug!(
            "topology: link {}:{} <-> {}:{} (weight {})",
            spec.src_dpid, spec.src_port, spec.dst_dpid, spec.dst_port, spec.weight
        );
        Ok(())
    }

    /// Removes the link between two switches, if present. Idempotent.
    pub fn remove_link(&mut self, a: Dpid, b: Dpid) {
        let removed = self
            .adjacency
            .get_mut(&a)
            .map(|edges| edges.remove(&b).is_some())
            .unwrap_or(false);
        if let Some(edges) = self.adjacency.get_mut(&b) {
            edges.remove(&a);
        }
        if removed {
            self.stats.links_removed += 1;
            debug!("topology: link {} <-> {} removed", a, b);
        }
    }

    /// Atomically replaces the whole graph with an authoritative listing.
    ///
    /// The replacement graph is built and validated completely before it
    /// is swapped in. On error the previous graph is untouched, and
    /// snapshots taken before the swap keep describing the old graph
    /// either way.
    pub fn replace_all(&mut self, listing: &TopologyListing) -> Result<()> {
        let mut next: BTreeMap<Dpid, BTreeMap<Dpid, LinkAttr>> = BTreeMap::new();

        for dpid in &listing.switches {
            next.entry(*dpid).or_default();
        }
        for spec in &listing.links {
            if spec.src_dpid == spec.dst_dpid {
                return Err(TopologyError::InvalidElement(format!(
                    "self-loop link on switch {} in resync listing",
                    spec.src_dpid
                )));
            }
            next.entry(spec.src_dpid).or_default().insert(
                spec.dst_dpid,
                LinkAttr {
                    out_port: spec.src_port,
                    peer_port: spec.dst_port,
                    weight: spec.weight,
                },
            );
            next.entry(spec.dst_dpid).or_default().insert(
                spec.src_dpid,
                LinkAttr {
                    out_port: spec.dst_port,
                    peer_port: spec.src_port,
                    weight: spec.weight,
                },
            );
        }

        self.adjacency = next;
        self.stats.full_replacements += 1;
        Ok(())
    }

    /// Captures an immutable snapshot of the current graph.
    ///
    /// The snapshot is an independent copy: later mutations of the store
    /// are invisible to it, and path computation on it needs no locking.
    pub fn snapshot(&self) -> Arc<TopologySnapshot> {
        Arc::new(TopologySnapshot::from_adjacency(self.adjacency.clone()))
    }

    /// Exports the graph as a listing, one entry per undirected link.
    pub fn listing(&self) -> TopologyListing {
        let switches: Vec<Dpid> = self.adjacency.keys().copied().collect();
        let mut links = Vec::new();
        for (a, edges) in &self.adjacency {
            for (b, attr) in edges {
                if a < b {
                    links.push(LinkSpec::new(*a, attr.out_port, *b, attr.peer_port, attr.weight));
                }
            }
        }
        TopologyListing { switches, links }
    }

    pub fn contains_switch(&self, dpid: Dpid) -> bool {
        self.adjacency.contains_key(&dpid)
    }

    pub fn switch_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn link_count(&self) -> usize {
        let directed: usize = self.adjacency.values().map(|edges| edges.len()).sum();
        directed / 2
    }

    pub fn stats(&self) -> &TopologyStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathctl_types::PortNo;
    use pretty_assertions::assert_eq;

    fn dpid(n: u64) -> Dpid {
        Dpid::new(n).unwrap()
    }

    fn port(n: u32) -> PortNo {
        PortNo::new(n).unwrap()
    }

    fn link(a: u64, pa: u32, b: u64, pb: u32) -> LinkSpec {
        LinkSpec::unit(dpid(a), port(pa), dpid(b), port(pb))
    }

    #[test]
    fn test_add_switch_idempotent() {
        let mut store = TopologyStore::new();
        store.add_switch(dpid(1));
        store.add_link(&link(1, 1, 2, 1)).unwrap();
        let before = store.snapshot();

        store.add_switch(dpid(1));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_add_link_idempotent_upsert() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 2)).unwrap();
        let before = store.snapshot();

        store.add_link(&link(1, 1, 2, 2)).unwrap();
        assert_eq!(*store.snapshot(), *before);
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn test_duplicate_announcement_overwrites() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 2)).unwrap();
        store.add_link(&link(1, 5, 2, 6)).unwrap();

        let snap = store.snapshot();
        assert_eq!(store.link_count(), 1);
        assert_eq!(snap.port_towards(dpid(1), dpid(2)), Some(port(5)));
        assert_eq!(snap.port_towards(dpid(2), dpid(1)), Some(port(6)));
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut store = TopologyStore::new();
        store.add_link(&link(7, 3, 9, 4)).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.port_towards(dpid(7), dpid(9)), Some(port(3)));
        assert_eq!(snap.port_towards(dpid(9), dpid(7)), Some(port(4)));
        assert_eq!(snap.link(dpid(7), dpid(9)).unwrap().weight, 1);
        assert_eq!(snap.link(dpid(9), dpid(7)).unwrap().weight, 1);
    }

    #[test]
    fn test_self_loop_rejected_as_noop() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 2)).unwrap();
        let before = store.snapshot();

        let err = store.add_link(&link(3, 1, 3, 2));
        assert!(matches!(err, Err(TopologyError::InvalidElement(_))));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_remove_switch_cascades_links() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 1)).unwrap();
        store.add_link(&link(2, 2, 3, 1)).unwrap();

        store.remove_switch(dpid(2));

        let snap = store.snapshot();
        assert!(!snap.contains_switch(dpid(2)));
        assert_eq!(snap.link_count(), 0);
        assert_eq!(snap.port_towards(dpid(1), dpid(2)), None);
        assert_eq!(snap.port_towards(dpid(3), dpid(2)), None);
    }

    #[test]
    fn test_remove_switch_idempotent() {
        let mut store = TopologyStore::new();
        store.remove_switch(dpid(5));
        assert_eq!(store.stats().switches_removed, 0);
    }

    #[test]
    fn test_remove_link_idempotent() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 1)).unwrap();
        store.remove_link(dpid(1), dpid(2));
        store.remove_link(dpid(1), dpid(2));

        assert_eq!(store.link_count(), 0);
        assert_eq!(store.stats().links_removed, 1);
        assert!(store.contains_switch(dpid(1)));
        assert!(store.contains_switch(dpid(2)));
    }

    #[test]
    fn test_replace_all_swaps_whole_graph() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 1)).unwrap();

        let listing = TopologyListing {
            switches: vec![dpid(10), dpid(11), dpid(12)],
            links: vec![link(10, 1, 11, 2)],
        };
        store.replace_all(&listing).unwrap();

        let snap = store.snapshot();
        assert!(!snap.contains_switch(dpid(1)));
        assert_eq!(snap.switch_count(), 3);
        assert_eq!(snap.link_count(), 1);
        assert_eq!(snap.port_towards(dpid(10), dpid(11)), Some(port(1)));
    }

    #[test]
    fn test_replace_all_invalid_listing_is_noop() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 1)).unwrap();
        let before = store.snapshot();

        let listing = TopologyListing {
            switches: vec![dpid(10)],
            links: vec![link(10, 1, 10, 2)],
        };
        assert!(store.replace_all(&listing).is_err());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_listing_roundtrip() {
        let mut store = TopologyStore::new();
        store.add_switch(dpid(4));
        store.add_link(&link(1, 1, 2, 2)).unwrap();
        store.add_link(&link(2, 3, 3, 1)).unwrap();

        let mut other = TopologyStore::new();
        other.replace_all(&store.listing()).unwrap();
        assert_eq!(*other.snapshot(), *store.snapshot());
    }

    #[test]
    fn test_snapshot_isolated_from_later_mutation() {
        let mut store = TopologyStore::new();
        store.add_link(&link(1, 1, 2, 1)).unwrap();
        let snap = store.snapshot();

        store.remove_link(dpid(1), dpid(2));
        assert_eq!(snap.port_towards(dpid(1), dpid(2)), Some(port(1)));
        assert_eq!(store.snapshot().port_towards(dpid(1), dpid(2)), None);
    }
}

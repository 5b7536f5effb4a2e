//! Dijkstra shortest-path search.
//!
//! The engine is a pure function of a snapshot and two endpoints: it
//! holds no state between calls, so any number of queries may run
//! concurrently with topology mutation, each against the snapshot it was
//! given.

use crate::topology::TopologySnapshot;
use pathctl_types::Dpid;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap, BTreeSet};

/// A computed switch-level path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedPath {
    /// Switches from source to destination, length >= 1. A single
    /// element means source and destination are the same switch.
    pub hops: Vec<Dpid>,
    /// Sum of link weights along the path.
    pub total_weight: u64,
}

impl ComputedPath {
    /// Number of links traversed.
    pub fn hop_count(&self) -> usize {
        self.hops.len() - 1
    }
}

/// Computes the minimum-weight path between two switches.
///
/// Returns `None` when either endpoint is missing from the snapshot or
/// the two lie in disconnected components; the caller treats that as the
/// signal to fall back to flooding.
///
/// Ties are broken deterministically: the frontier is ordered by
/// (distance, datapath ID) and a relaxation at equal distance keeps the
/// smaller predecessor, so repeated queries against the same snapshot
/// always return the same path. Runs in O((V + E) log V); the frontier
/// is bounded by the snapshot's switch count.
pub fn shortest_path(
    snapshot: &TopologySnapshot,
    src: Dpid,
    dst: Dpid,
) -> Option<ComputedPath> {
    if !snapshot.contains_switch(src) || !snapshot.contains_switch(dst) {
        return None;
    }
    if src == dst {
        return Some(ComputedPath {
            hops: vec![src],
            total_weight: 0,
        });
    }

    // Per-switch best (distance, predecessor) found so far.
    let mut best: BTreeMap<Dpid, (u64, Dpid)> = BTreeMap::new();
    let mut settled: BTreeSet<Dpid> = BTreeSet::new();
    let mut frontier: BinaryHeap<Reverse<(u64, Dpid)>> = BinaryHeap::new();

    best.insert(src, (0, src));
    frontier.push(Reverse((0, src)));

    while let Some(Reverse((distance, node))) = frontier.pop() {
        if !settled.insert(node) {
            continue;
        }
        if node == dst {
            break;
        }

        for (neighbor, attr) in snapshot.neighbors(node) {
            if settled.contains(&neighbor) {
                continue;
            }
            let candidate = distance + u64::from(attr.weight);
            match best.get(&neighbor) {
                None => {
                    best.insert(neighbor, (candidate, node));
                    frontier.push(Reverse((candidate, neighbor)));
                }
                Some((current, _)) if candidate < *current => {
                    best.insert(neighbor, (candidate, node));
                    frontier.push(Reverse((candidate, neighbor)));
                }
                Some((current, predecessor)) if candidate == *current && node < *predecessor => {
                    // Equal distance through a smaller switch: keep the
                    // distance, reroute the predecessor.
                    best.insert(neighbor, (candidate, node));
                }
                Some(_) => {}
            }
        }
    }

    let (total_weight, _) = *best.get(&dst)?;

    let mut hops = vec![dst];
    let mut cursor = dst;
    while cursor != src {
        let (_, predecessor) = best[&cursor];
        hops.push(predecessor);
        cursor = predecessor;
    }
    hops.reverse();

    Some(ComputedPath { hops, total_weight })
}

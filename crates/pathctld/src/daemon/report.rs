//! Read-only reporting over the coordinator's stores.
//!
//! Nothing here participates in routing decisions; these functions
//! render the current state for operators and debugging.

use super::Coordinator;
use crate::hosts::HostTable;
use crate::path::shortest_path;
use crate::topology::{TopologySnapshot, TopologyStore};
use pathctl_types::Dpid;
use std::sync::atomic::Ordering;

/// Renders the topology as dump lines: a summary, then one line per
/// undirected link.
pub fn topology_lines(store: &TopologyStore) -> Vec<String> {
    let listing = store.listing();
    let mut lines = vec![format!(
        "topology: {} switches, {} links",
        listing.switches.len(),
        listing.links.len()
    )];
    for link in &listing.links {
        lines.push(format!(
            "  link {}:{} <-> {}:{} weight {}",
            link.src_dpid, link.src_port, link.dst_dpid, link.dst_port, link.weight
        ));
    }
    lines
}

/// Renders the host table, one line per known host.
pub fn host_lines(hosts: &HostTable) -> Vec<String> {
    let entries = hosts.entries();
    let mut lines = vec![format!("hosts: {} known", entries.len())];
    for (mac, location) in entries {
        lines.push(format!(
            "  {} at {}:{} (last seen {})",
            mac,
            location.dpid,
            location.port,
            location.last_seen.to_rfc3339()
        ));
    }
    lines
}

/// Renders the current shortest path between two switches.
pub fn path_lines(snapshot: &TopologySnapshot, src: Dpid, dst: Dpid) -> Vec<String> {
    match shortest_path(snapshot, src, dst) {
        Some(path) => {
            let hops: Vec<String> = path.hops.iter().map(|d| d.to_string()).collect();
            vec![format!(
                "path {} -> {}: {} (weight {})",
                src,
                dst,
                hops.join(" > "),
                path.total_weight
            )]
        }
        None => vec![format!("path {} -> {}: none", src, dst)],
    }
}

/// Machine-readable state summary: counters from all three stores plus
/// the current topology listing.
pub fn summary_json(coordinator: &Coordinator) -> serde_json::Value {
    let host_stats = coordinator.hosts().stats();
    serde_json::json!({
        "coordinator": coordinator.stats(),
        "topology": {
            "stats": coordinator.topology().stats(),
            "listing": coordinator.topology().listing(),
        },
        "hosts": {
            "known": coordinator.hosts().len(),
            "learned": host_stats.learned.load(Ordering::Relaxed),
            "moved": host_stats.moved.load(Ordering::Relaxed),
            "flushed": host_stats.flushed.load(Ordering::Relaxed),
        },
        "installer": coordinator.installer_stats(),
    })
}

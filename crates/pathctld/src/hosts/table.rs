//! Host location tracking.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;
use pathctl_types::{Dpid, MacAddress, PortNo};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where a host was last observed as a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostLocation {
    /// Switch the host is attached to.
    pub dpid: Dpid,
    /// Port the host is attached on.
    pub port: PortNo,
    /// When the most recent observation happened. Informational only;
    /// entries never expire by age.
    pub last_seen: DateTime<Utc>,
}

/// Observation counters.
#[derive(Debug, Default)]
pub struct HostTableStats {
    /// First-time observations of a MAC.
    pub learned: AtomicU64,
    /// Observations that changed an existing attachment point.
    pub moved: AtomicU64,
    /// Entries dropped because their switch left the fabric.
    pub flushed: AtomicU64,
}

impl Clone for HostTableStats {
    fn clone(&self) -> Self {
        Self {
            learned: AtomicU64::new(self.learned.load(Ordering::Relaxed)),
            moved: AtomicU64::new(self.moved.load(Ordering::Relaxed)),
            flushed: AtomicU64::new(self.flushed.load(Ordering::Relaxed)),
        }
    }
}

/// Maps each host MAC to the (switch, port) where it was last seen.
///
/// Every observed frame updates its source's entry; the newest
/// observation always wins. There is at most one location per host, and
/// an entry only disappears when its switch leaves the fabric - hosts
/// are never aged out.
///
/// Updates are independent per key, so the table takes `&self`
/// everywhere and tolerates concurrent observers with last-write-wins
/// semantics.
#[derive(Debug, Default)]
pub struct HostTable {
    entries: DashMap<MacAddress, HostLocation>,
    stats: HostTableStats,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or overwrites the host's location. Never fails.
    pub fn observe(&self, mac: MacAddress, dpid: Dpid, port: PortNo) {
        let location = HostLocation {
            dpid,
            port,
            last_seen: Utc::now(),
        };
        match self.entries.insert(mac, location) {
            None => {
                self.stats.learned.fetch_add(1, Ordering::Relaxed);
                debug!("hosts: learned {} at {}:{}", mac, dpid, port);
            }
            Some(previous) if previous.dpid != dpid || previous.port != port => {
                self.stats.moved.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "hosts: {} moved {}:{} -> {}:{}",
                    mac, previous.dpid, previous.port, dpid, port
                );
            }
            Some(_) => {}
        }
    }

    /// Returns the host's current location, or `None` when the host has
    /// never been observed as a source. The `None` case is the routing
    /// signal that makes the coordinator flood.
    pub fn lookup(&self, mac: &MacAddress) -> Option<HostLocation> {
        self.entries.get(mac).map(|entry| *entry.value())
    }

    /// Drops every entry attached to the given switch. Returns how many
    /// entries were removed.
    pub fn flush_switch(&self, dpid: Dpid) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, location| location.dpid != dpid);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.flushed.fetch_add(removed as u64, Ordering::Relaxed);
            debug!("hosts: flushed {} entries for switch {}", removed, dpid);
        }
        removed
    }

    /// Returns all entries sorted by MAC, for deterministic reporting.
    pub fn entries(&self) -> Vec<(MacAddress, HostLocation)> {
        let mut all: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        all.sort_by_key(|(mac, _)| *mac.as_bytes());
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &HostTableStats {
        &self.stats
    }
}

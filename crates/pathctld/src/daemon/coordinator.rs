//! Coordinator implementation.

use crate::flow::{output_port_at, FlowInstaller, FlowInstallerConfig};
use crate::hosts::HostTable;
use crate::path::shortest_path;
use crate::topology::TopologyStore;
use log::{debug, info, warn};
use pathctl_common::{
    FlowRule, ForwardingPlane, FrameObserved, NetworkEvent, OutputAction, TopologyAuthority,
};
use pathctl_types::{Dpid, PortNo};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Install the table-miss rule on every switch that joins, so
    /// unmatched frames reach the controller. Disable only when the
    /// transport provisions the miss rule itself.
    pub install_table_miss: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            install_table_miss: true,
        }
    }
}

/// What the coordinator decided to do with one observed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardDecision {
    /// Control-plane discovery frame, dropped before any learning.
    Discarded,
    /// Destination unknown or unreachable: output on all ports except
    /// the ingress.
    Flood,
    /// Unicast out the given port of the observing switch.
    Forward(PortNo),
}

/// Event and decision counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorStats {
    pub events_processed: u64,
    pub frames_seen: u64,
    pub frames_discarded: u64,
    pub floods: u64,
    pub unicast_forwards: u64,
    pub resyncs: u64,
    pub partial_installs: u64,
    pub emit_failures: u64,
}

/// The event coordinator.
///
/// Owns the topology store and host table outright; every mutation runs
/// on the coordinator's task, which is the single-writer discipline that
/// keeps the graph consistent without locks. Path queries and rule
/// installation work on captured snapshots and may observe a view that
/// is one resync behind - an accepted, bounded staleness.
pub struct Coordinator {
    config: CoordinatorConfig,
    topology: TopologyStore,
    hosts: HostTable,
    installer: FlowInstaller,
    plane: Arc<dyn ForwardingPlane>,
    authority: Option<Arc<dyn TopologyAuthority>>,
    stats: CoordinatorStats,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        installer_config: FlowInstallerConfig,
        plane: Arc<dyn ForwardingPlane>,
        authority: Option<Arc<dyn TopologyAuthority>>,
    ) -> Self {
        Self {
            config,
            topology: TopologyStore::new(),
            hosts: HostTable::new(),
            installer: FlowInstaller::new(installer_config, plane.clone()),
            plane,
            authority,
            stats: CoordinatorStats::default(),
        }
    }

    /// Consumes events until the channel closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<NetworkEvent>) {
        info!("coordinator started");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!(
            "event stream closed, coordinator stopping ({} events processed)",
            self.stats.events_processed
        );
    }

    /// Processes one event. Returns the forwarding decision for frame
    /// events, `None` for topology events.
    pub async fn handle_event(&mut self, event: NetworkEvent) -> Option<ForwardDecision> {
        self.stats.events_processed += 1;

        match event {
            NetworkEvent::SwitchJoined(dpid) => {
                info!("switch {} joined", dpid);
                self.topology.add_switch(dpid);
                if self.config.install_table_miss {
                    let miss = FlowRule::table_miss(dpid);
                    if let Err(err) = self.plane.install_rule(&miss).await {
                        warn!("table-miss install on {} failed: {}", dpid, err);
                    }
                }
                self.resync().await;
                None
            }
            NetworkEvent::SwitchLeft(dpid) => {
                info!("switch {} left", dpid);
                self.topology.remove_switch(dpid);
                let flushed = self.hosts.flush_switch(dpid);
                if flushed > 0 {
                    info!("flushed {} host entries for departed switch {}", flushed, dpid);
                }
                self.resync().await;
                None
            }
            NetworkEvent::LinkAdded(spec) => {
                match self.topology.add_link(&spec) {
                    Ok(()) => info!(
                        "link up: {}:{} <-> {}:{}",
                        spec.src_dpid, spec.src_port, spec.dst_dpid, spec.dst_port
                    ),
                    Err(err) => warn!("link announcement rejected: {}", err),
                }
                self.resync().await;
                None
            }
            NetworkEvent::LinkRemoved { a, b } => {
                info!("link down: {} <-> {}", a, b);
                self.topology.remove_link(a, b);
                self.resync().await;
                None
            }
            NetworkEvent::FrameObserved(frame) => Some(self.on_frame(frame).await),
        }
    }

    async fn on_frame(&mut self, frame: FrameObserved) -> ForwardDecision {
        self.stats.frames_seen += 1;

        // Discovery frames belong to the transport's own LLDP exchange
        // and must not pollute host learning.
        if frame.ethertype.is_lldp() {
            self.stats.frames_discarded += 1;
            return ForwardDecision::Discarded;
        }

        self.hosts.observe(frame.src, frame.dpid, frame.in_port);

        let Some(destination) = self.hosts.lookup(&frame.dst) else {
            debug!(
                "frame at {}: destination {} unknown, flooding",
                frame.dpid, frame.dst
            );
            return self.flood(frame).await;
        };

        let snapshot = self.topology.snapshot();
        let Some(path) = shortest_path(&snapshot, frame.dpid, destination.dpid) else {
            debug!(
                "no path {} -> {} for {}, flooding",
                frame.dpid, destination.dpid, frame.dst
            );
            return self.flood(frame).await;
        };
        debug!(
            "path {} -> {} for {}: {} hops, weight {}",
            frame.dpid,
            destination.dpid,
            frame.dst,
            path.hop_count(),
            path.total_weight
        );

        let report = self
            .installer
            .install_path(&snapshot, &path, frame.dst, destination.port)
            .await;
        if !report.is_complete() {
            self.stats.partial_installs += 1;
        }

        // The rules just dispatched serve subsequent frames; the
        // triggering frame is forwarded here with the same first-hop
        // logic the installer used.
        match output_port_at(&snapshot, &path.hops, 0, destination.port) {
            Some(out_port) => {
                self.emit(frame.dpid, OutputAction::Port(out_port), frame.payload)
                    .await;
                self.stats.unicast_forwards += 1;
                ForwardDecision::Forward(out_port)
            }
            None => {
                warn!(
                    "first hop of {} -> {} lost its port, flooding",
                    frame.dpid, destination.dpid
                );
                self.flood(frame).await
            }
        }
    }

    async fn flood(&mut self, frame: FrameObserved) -> ForwardDecision {
        self.stats.floods += 1;
        self.emit(frame.dpid, OutputAction::Flood, frame.payload).await;
        ForwardDecision::Flood
    }

    async fn emit(&mut self, dpid: Dpid, action: OutputAction, payload: Arc<Vec<u8>>) {
        if let Err(err) = self.plane.emit_frame(dpid, action, payload).await {
            self.stats.emit_failures += 1;
            warn!("frame emit on {} ({}) failed: {}", dpid, action, err);
        }
    }

    /// Pulls the authoritative listing and atomically replaces the
    /// graph. Runs after every topology-changing event so that missed or
    /// reordered incremental announcements cannot skew the graph for
    /// longer than one event.
    async fn resync(&mut self) {
        let Some(authority) = self.authority.clone() else {
            debug!("no topology authority attached, keeping incremental view");
            return;
        };

        let listing = authority.full_topology().await;
        match self.topology.replace_all(&listing) {
            Ok(()) => {
                self.stats.resyncs += 1;
                info!(
                    "topology resynced: {} switches, {} links",
                    self.topology.switch_count(),
                    self.topology.link_count()
                );
            }
            Err(err) => warn!("resync listing rejected, keeping previous graph: {}", err),
        }
    }

    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    pub fn hosts(&self) -> &HostTable {
        &self.hosts
    }

    pub fn stats(&self) -> &CoordinatorStats {
        &self.stats
    }

    pub fn installer_stats(&self) -> &crate::flow::InstallerStats {
        self.installer.stats()
    }

    /// Dumps the coordinator's state for debugging and reporting.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "coordinator: {} events, {} floods, {} forwards, {} resyncs",
            self.stats.events_processed,
            self.stats.floods,
            self.stats.unicast_forwards,
            self.stats.resyncs
        )];
        lines.extend(super::report::topology_lines(&self.topology));
        lines.extend(super::report::host_lines(&self.hosts));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pathctl_common::{DispatchError, LinkSpec, TopologyListing};
    use pathctl_types::{EtherType, MacAddress};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn dpid(n: u64) -> Dpid {
        Dpid::new(n).unwrap()
    }

    fn port(n: u32) -> PortNo {
        PortNo::new(n).unwrap()
    }

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, last])
    }

    fn frame(at: u64, in_port: u32, src: u8, dst: u8) -> NetworkEvent {
        NetworkEvent::FrameObserved(FrameObserved::new(
            dpid(at),
            port(in_port),
            mac(src),
            mac(dst),
            EtherType::IPV4,
            vec![],
        ))
    }

    #[derive(Default)]
    struct RecordingPlane {
        rules: Mutex<Vec<FlowRule>>,
        emitted: Mutex<Vec<(Dpid, OutputAction)>>,
    }

    #[async_trait]
    impl ForwardingPlane for RecordingPlane {
        async fn install_rule(&self, rule: &FlowRule) -> Result<(), DispatchError> {
            self.rules.lock().unwrap().push(*rule);
            Ok(())
        }

        async fn emit_frame(
            &self,
            dpid: Dpid,
            action: OutputAction,
            _payload: Arc<Vec<u8>>,
        ) -> Result<(), DispatchError> {
            self.emitted.lock().unwrap().push((dpid, action));
            Ok(())
        }
    }

    struct FixedAuthority {
        listing: TopologyListing,
    }

    #[async_trait]
    impl TopologyAuthority for FixedAuthority {
        async fn full_topology(&self) -> TopologyListing {
            self.listing.clone()
        }
    }

    fn coordinator_with(plane: Arc<RecordingPlane>) -> Coordinator {
        Coordinator::new(
            CoordinatorConfig::default(),
            FlowInstallerConfig::default(),
            plane,
            None,
        )
    }

    async fn build_chain(coordinator: &mut Coordinator) {
        for id in [1, 2, 3] {
            coordinator
                .handle_event(NetworkEvent::SwitchJoined(dpid(id)))
                .await;
        }
        coordinator
            .handle_event(NetworkEvent::LinkAdded(LinkSpec::unit(
                dpid(1),
                port(2),
                dpid(2),
                port(1),
            )))
            .await;
        coordinator
            .handle_event(NetworkEvent::LinkAdded(LinkSpec::unit(
                dpid(2),
                port(2),
                dpid(3),
                port(1),
            )))
            .await;
    }

    #[tokio::test]
    async fn test_lldp_is_discarded_before_learning() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());

        let lldp = NetworkEvent::FrameObserved(FrameObserved::new(
            dpid(1),
            port(1),
            mac(1),
            mac(2),
            EtherType::LLDP,
            vec![],
        ));
        let decision = coordinator.handle_event(lldp).await;

        assert_eq!(decision, Some(ForwardDecision::Discarded));
        assert!(coordinator.hosts().is_empty());
        assert!(plane.emitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_destination_floods_and_learns_source() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());
        build_chain(&mut coordinator).await;

        let decision = coordinator.handle_event(frame(1, 3, 1, 2)).await;

        assert_eq!(decision, Some(ForwardDecision::Flood));
        let location = coordinator.hosts().lookup(&mac(1)).unwrap();
        assert_eq!(location.dpid, dpid(1));
        assert_eq!(location.port, port(3));
        assert_eq!(
            plane.emitted.lock().unwrap().last(),
            Some(&(dpid(1), OutputAction::Flood))
        );
    }

    #[tokio::test]
    async fn test_flood_repeats_until_destination_speaks() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());
        build_chain(&mut coordinator).await;

        assert_eq!(
            coordinator.handle_event(frame(1, 3, 1, 2)).await,
            Some(ForwardDecision::Flood)
        );
        assert_eq!(
            coordinator.handle_event(frame(1, 3, 1, 2)).await,
            Some(ForwardDecision::Flood)
        );

        // The destination talks from s3 port 4; now the reverse flow routes.
        coordinator.handle_event(frame(3, 4, 2, 1)).await;
        let decision = coordinator.handle_event(frame(1, 3, 1, 2)).await;
        assert_eq!(decision, Some(ForwardDecision::Forward(port(2))));
    }

    #[tokio::test]
    async fn test_miss_rule_installed_on_join() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());

        coordinator
            .handle_event(NetworkEvent::SwitchJoined(dpid(7)))
            .await;

        let rules = plane.rules.lock().unwrap().clone();
        assert_eq!(rules, vec![FlowRule::table_miss(dpid(7))]);
    }

    #[tokio::test]
    async fn test_switch_left_flushes_hosts_and_links() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());
        build_chain(&mut coordinator).await;
        coordinator.handle_event(frame(3, 4, 2, 9)).await;
        assert!(coordinator.hosts().lookup(&mac(2)).is_some());

        coordinator
            .handle_event(NetworkEvent::SwitchLeft(dpid(3)))
            .await;

        assert_eq!(coordinator.hosts().lookup(&mac(2)), None);
        assert!(!coordinator.topology().contains_switch(dpid(3)));
        assert_eq!(coordinator.topology().link_count(), 1);
    }

    #[tokio::test]
    async fn test_resync_replaces_incremental_view() {
        let plane = Arc::new(RecordingPlane::default());
        let authority = Arc::new(FixedAuthority {
            listing: TopologyListing {
                switches: vec![dpid(10), dpid(11)],
                links: vec![LinkSpec::unit(dpid(10), port(1), dpid(11), port(1))],
            },
        });
        let mut coordinator = Coordinator::new(
            CoordinatorConfig::default(),
            FlowInstallerConfig::default(),
            plane,
            Some(authority),
        );

        coordinator
            .handle_event(NetworkEvent::SwitchJoined(dpid(1)))
            .await;

        // The authoritative listing wins over the incremental add.
        assert!(!coordinator.topology().contains_switch(dpid(1)));
        assert!(coordinator.topology().contains_switch(dpid(10)));
        assert_eq!(coordinator.stats().resyncs, 1);
    }

    #[tokio::test]
    async fn test_disconnected_destination_floods() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane.clone());
        build_chain(&mut coordinator).await;
        coordinator
            .handle_event(NetworkEvent::SwitchJoined(dpid(9)))
            .await;

        // Destination known on the isolated switch 9.
        coordinator.handle_event(frame(9, 1, 2, 1)).await;
        let decision = coordinator.handle_event(frame(1, 3, 1, 2)).await;

        assert_eq!(decision, Some(ForwardDecision::Flood));
    }

    #[tokio::test]
    async fn test_run_drains_channel_until_close() {
        let plane = Arc::new(RecordingPlane::default());
        let mut coordinator = coordinator_with(plane);
        let (tx, rx) = mpsc::channel(8);

        tx.send(NetworkEvent::SwitchJoined(dpid(1))).await.unwrap();
        tx.send(NetworkEvent::SwitchJoined(dpid(2))).await.unwrap();
        drop(tx);

        coordinator.run(rx).await;
        assert_eq!(coordinator.stats().events_processed, 2);
        assert_eq!(coordinator.topology().switch_count(), 2);
    }
}

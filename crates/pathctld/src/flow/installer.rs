//! Path-to-rule translation and dispatch.

use crate::path::ComputedPath;
use crate::topology::TopologySnapshot;
use log::{debug, warn};
use pathctl_common::{FlowMatch, FlowRule, ForwardingPlane, OutputAction, PRIORITY_PATH};
use pathctl_types::{Dpid, MacAddress, PortNo};
use serde::Serialize;
use std::sync::Arc;

/// Configuration for the rule installer.
#[derive(Debug, Clone)]
pub struct FlowInstallerConfig {
    /// Priority for installed path rules. Must stay above the table-miss
    /// priority or installed paths would never match.
    pub priority: u16,
    /// Idle timeout in seconds for installed rules; zero disables
    /// expiry. When set, the hard timeout is twice the idle timeout.
    pub idle_timeout: u16,
}

impl Default for FlowInstallerConfig {
    fn default() -> Self {
        Self {
            priority: PRIORITY_PATH,
            idle_timeout: 0,
        }
    }
}

/// Outcome of one `install_path` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Rules handed to the forwarding plane.
    pub rules_dispatched: usize,
    /// Switches skipped because the snapshot had no port toward the next
    /// hop (the snapshot raced a topology change).
    pub unresolved_hops: Vec<Dpid>,
    /// Rules the forwarding plane refused to take.
    pub dispatch_failures: usize,
}

impl InstallReport {
    /// True when every hop got its rule dispatched and accepted.
    pub fn is_complete(&self) -> bool {
        self.unresolved_hops.is_empty() && self.dispatch_failures == 0
    }
}

/// Dispatch counters across the installer's lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallerStats {
    pub rules_dispatched: u64,
    pub port_resolution_failures: u64,
    pub dispatch_failures: u64,
}

/// Resolves the output port for hop `index` of a path.
///
/// The last switch outputs on the destination host's attachment port;
/// every other switch outputs toward the next switch in the path.
/// Returns `None` when the snapshot no longer has the required link.
pub fn output_port_at(
    snapshot: &TopologySnapshot,
    hops: &[Dpid],
    index: usize,
    egress_port: PortNo,
) -> Option<PortNo> {
    if index + 1 == hops.len() {
        Some(egress_port)
    } else {
        snapshot.port_towards(*hops.get(index)?, *hops.get(index + 1)?)
    }
}

/// Translates computed paths into per-switch rules and dispatches them.
///
/// The installer holds no record of what it installed: every routing
/// decision recomputes and reinstalls, and the switches age rules out on
/// their own if timeouts are configured.
pub struct FlowInstaller {
    config: FlowInstallerConfig,
    plane: Arc<dyn ForwardingPlane>,
    stats: InstallerStats,
}

impl FlowInstaller {
    pub fn new(config: FlowInstallerConfig, plane: Arc<dyn ForwardingPlane>) -> Self {
        Self {
            config,
            plane,
            stats: InstallerStats::default(),
        }
    }

    /// Installs destination-MAC rules along `path` toward `dst`.
    ///
    /// A hop whose output port cannot be resolved against the snapshot
    /// is logged and skipped; the remaining hops still get their rules.
    /// Partial installation degrades forwarding, it does not abort it.
    /// Dispatch is fire-and-forget: failures are logged and counted,
    /// never retried here.
    pub async fn install_path(
        &mut self,
        snapshot: &TopologySnapshot,
        path: &ComputedPath,
        dst: MacAddress,
        egress_port: PortNo,
    ) -> InstallReport {
        let mut report = InstallReport::default();

        for (index, hop) in path.hops.iter().enumerate() {
            let Some(out_port) = output_port_at(snapshot, &path.hops, index, egress_port) else {
                warn!(
                    "install: no port from {} toward next hop for {} (snapshot raced a topology change), skipping hop",
                    hop, dst
                );
                self.stats.port_resolution_failures += 1;
                report.unresolved_hops.push(*hop);
                continue;
            };

            let rule = FlowRule {
                dpid: *hop,
                matching: FlowMatch::EthDst(dst),
                action: OutputAction::Port(out_port),
                priority: self.config.priority,
                idle_timeout: self.config.idle_timeout,
                hard_timeout: self.config.idle_timeout.saturating_mul(2),
            };

            match self.plane.install_rule(&rule).await {
                Ok(()) => {
                    debug!("install: {}", rule);
                    self.stats.rules_dispatched += 1;
                    report.rules_dispatched += 1;
                }
                Err(err) => {
                    warn!("install: dispatch of {} failed: {}", rule, err);
                    self.stats.dispatch_failures += 1;
                    report.dispatch_failures += 1;
                }
            }
        }

        report
    }

    pub fn stats(&self) -> &InstallerStats {
        &self.stats
    }
}

//! Boundary traits for external collaborators.
//!
//! The switch-control transport lives outside this workspace. The
//! coordinator reaches it only through these two traits, which keeps the
//! whole core unit-testable with in-process mocks.

use crate::event::TopologyListing;
use crate::rule::{FlowRule, OutputAction};
use async_trait::async_trait;
use pathctl_types::Dpid;
use std::sync::Arc;
use thiserror::Error;

/// Error type for forwarding-plane dispatch failures.
///
/// Dispatch is best-effort: the coordinator logs and counts these, but a
/// failed dispatch never changes the routing decision already made for
/// the triggering frame.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("switch {0} is not connected")]
    SwitchNotConnected(Dpid),

    #[error("forwarding plane unavailable: {0}")]
    Unavailable(String),
}

/// On-demand source of the authoritative topology listing.
///
/// After any topology-changing event the coordinator pulls the full
/// listing and atomically replaces its store contents with it, so missed
/// or reordered incremental events cannot leave the graph permanently
/// skewed.
#[async_trait]
pub trait TopologyAuthority: Send + Sync {
    /// Returns the complete switch and link listing as currently known to
    /// the discovery layer.
    async fn full_topology(&self) -> TopologyListing;
}

/// Dispatch surface toward the switches.
///
/// Both operations are asynchronous and best-effort; the core consumes
/// the result only for logging and statistics.
#[async_trait]
pub trait ForwardingPlane: Send + Sync {
    /// Installs a forwarding rule on a switch.
    async fn install_rule(&self, rule: &FlowRule) -> Result<(), DispatchError>;

    /// Emits a single frame out of a switch.
    async fn emit_frame(
        &self,
        dpid: Dpid,
        action: OutputAction,
        payload: Arc<Vec<u8>>,
    ) -> Result<(), DispatchError>;
}

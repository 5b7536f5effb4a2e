//! Network event types consumed by the coordinator.

use pathctl_types::{Dpid, EtherType, MacAddress, PortNo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A directed link announcement: one physical cable reported from the
/// `src` side. The topology store folds the two per-direction
/// announcements into a single symmetric edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Switch on the announcing side.
    pub src_dpid: Dpid,
    /// Port on the announcing side.
    pub src_port: PortNo,
    /// Switch on the far side.
    pub dst_dpid: Dpid,
    /// Port on the far side.
    pub dst_port: PortNo,
    /// Link weight. Discovery reports unit weight; real metrics slot in
    /// here without any other change.
    pub weight: u32,
}

impl LinkSpec {
    /// Creates a link announcement with an explicit weight.
    pub fn new(
        src_dpid: Dpid,
        src_port: PortNo,
        dst_dpid: Dpid,
        dst_port: PortNo,
        weight: u32,
    ) -> Self {
        Self {
            src_dpid,
            src_port,
            dst_dpid,
            dst_port,
            weight,
        }
    }

    /// Creates a unit-weight link announcement, the discovery default.
    pub fn unit(src_dpid: Dpid, src_port: PortNo, dst_dpid: Dpid, dst_port: PortNo) -> Self {
        Self::new(src_dpid, src_port, dst_dpid, dst_port, 1)
    }
}

/// An authoritative full-topology listing, pulled from the
/// [`TopologyAuthority`](crate::TopologyAuthority) boundary when the
/// coordinator resynchronizes after a topology change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyListing {
    pub switches: Vec<Dpid>,
    pub links: Vec<LinkSpec>,
}

/// A frame a switch could not resolve locally, surfaced to the controller.
#[derive(Debug, Clone)]
pub struct FrameObserved {
    /// Switch that punted the frame.
    pub dpid: Dpid,
    /// Port the frame arrived on.
    pub in_port: PortNo,
    /// Source MAC address.
    pub src: MacAddress,
    /// Destination MAC address.
    pub dst: MacAddress,
    /// Frame type code.
    pub ethertype: EtherType,
    /// Opaque frame payload, handed back to the forwarding plane when the
    /// coordinator emits its decision for this frame.
    pub payload: Arc<Vec<u8>>,
}

impl FrameObserved {
    pub fn new(
        dpid: Dpid,
        in_port: PortNo,
        src: MacAddress,
        dst: MacAddress,
        ethertype: EtherType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            dpid,
            in_port,
            src,
            dst,
            ethertype,
            payload: Arc::new(payload),
        }
    }
}

/// The tagged event stream driving the coordinator.
///
/// Events arrive from the transport in arbitrary interleaving; the
/// coordinator serializes them by consuming from a single channel.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// A switch completed its handshake and joined the fabric.
    SwitchJoined(Dpid),
    /// A switch connection was lost.
    SwitchLeft(Dpid),
    /// Discovery reported a new or re-announced inter-switch link.
    LinkAdded(LinkSpec),
    /// Discovery reported a link going down.
    LinkRemoved { a: Dpid, b: Dpid },
    /// A switch punted a frame it had no matching rule for.
    FrameObserved(FrameObserved),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dpid(n: u64) -> Dpid {
        Dpid::new(n).unwrap()
    }

    fn port(n: u32) -> PortNo {
        PortNo::new(n).unwrap()
    }

    #[test]
    fn test_unit_link_has_weight_one() {
        let link = LinkSpec::unit(dpid(1), port(1), dpid(2), port(2));
        assert_eq!(link.weight, 1);
    }

    #[test]
    fn test_topology_listing_default_is_empty() {
        let listing = TopologyListing::default();
        assert!(listing.switches.is_empty());
        assert!(listing.links.is_empty());
    }

    #[test]
    fn test_frame_payload_is_shared() {
        let frame = FrameObserved::new(
            dpid(1),
            port(1),
            "00:00:00:00:00:01".parse().unwrap(),
            "00:00:00:00:00:02".parse().unwrap(),
            EtherType::IPV4,
            vec![0xde, 0xad],
        );
        let clone = frame.clone();
        assert!(Arc::ptr_eq(&frame.payload, &clone.payload));
    }
}

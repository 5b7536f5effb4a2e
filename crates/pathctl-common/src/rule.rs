//! Forwarding-rule intent objects.
//!
//! A [`FlowRule`] is the unit handed across the forwarding-plane boundary.
//! The core never tracks which rules are resident on which switch; every
//! routing decision recomputes and reinstalls.

use pathctl_types::{Dpid, MacAddress, PortNo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority for rules installed along a computed path.
pub const PRIORITY_PATH: u16 = 10;

/// Priority for the table-miss rule that punts unmatched frames to the
/// controller. Must stay below [`PRIORITY_PATH`].
pub const PRIORITY_MISS: u16 = 0;

/// Match criteria for a forwarding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowMatch {
    /// Match frames whose destination MAC equals the given address.
    EthDst(MacAddress),
    /// Match every frame (table-miss).
    Any,
}

impl fmt::Display for FlowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowMatch::EthDst(mac) => write!(f, "eth_dst={}", mac),
            FlowMatch::Any => write!(f, "any"),
        }
    }
}

/// Output action for a forwarding rule or an emitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputAction {
    /// Output on a specific port.
    Port(PortNo),
    /// Output on all ports except the ingress port.
    Flood,
    /// Punt to the controller.
    Controller,
}

impl fmt::Display for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputAction::Port(port) => write!(f, "port:{}", port),
            OutputAction::Flood => write!(f, "flood"),
            OutputAction::Controller => write!(f, "controller"),
        }
    }
}

/// A forwarding rule destined for one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRule {
    /// Switch the rule is installed on.
    pub dpid: Dpid,
    /// Match criteria.
    pub matching: FlowMatch,
    /// Action taken on match.
    pub action: OutputAction,
    /// Rule priority; higher wins.
    pub priority: u16,
    /// Seconds of inactivity before the switch expires the rule.
    /// Zero means no expiry.
    pub idle_timeout: u16,
    /// Absolute lifetime in seconds. Zero means no expiry.
    pub hard_timeout: u16,
}

impl FlowRule {
    /// Creates a path rule: unicast forwarding by destination MAC.
    pub fn path_rule(dpid: Dpid, dst: MacAddress, out_port: PortNo) -> Self {
        Self {
            dpid,
            matching: FlowMatch::EthDst(dst),
            action: OutputAction::Port(out_port),
            priority: PRIORITY_PATH,
            idle_timeout: 0,
            hard_timeout: 0,
        }
    }

    /// Creates the table-miss rule installed when a switch joins, so
    /// frames without a matching path rule reach the controller.
    pub fn table_miss(dpid: Dpid) -> Self {
        Self {
            dpid,
            matching: FlowMatch::Any,
            action: OutputAction::Controller,
            priority: PRIORITY_MISS,
            idle_timeout: 0,
            hard_timeout: 0,
        }
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} (prio {})",
            self.dpid, self.matching, self.action, self.priority
        )
    }
}

//! Common network types for the pathctl control plane.
//!
//! This crate provides type-safe representations of the primitives the
//! controller reasons about:
//!
//! - [`Dpid`]: 64-bit datapath (switch) identifiers
//! - [`PortNo`]: switch port numbers
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`EtherType`]: Ethernet frame type codes

mod dpid;
mod ethertype;
mod mac;
mod port;

pub use dpid::Dpid;
pub use ethertype::EtherType;
pub use mac::MacAddress;
pub use port::PortNo;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid datapath ID: {0} (must be nonzero)")]
    InvalidDpid(String),

    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid port number: {0} (must be nonzero)")]
    InvalidPortNo(u32),
}

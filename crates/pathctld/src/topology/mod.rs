//! Topology store - the controller's view of the switch fabric.
//!
//! This module owns the undirected graph of switches and inter-switch
//! links. Mutations go through [`TopologyStore`] under the coordinator's
//! single-writer discipline; readers work against immutable
//! [`TopologySnapshot`] values that stay valid while the store keeps
//! changing underneath them.

mod store;
mod types;

pub use store::{TopologyError, TopologyStats, TopologyStore};
pub use types::{LinkAttr, TopologySnapshot};

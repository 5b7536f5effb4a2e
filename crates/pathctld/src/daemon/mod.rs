//! Event coordinator - the daemon's orchestrating component.
//!
//! The coordinator is the only place where more than one store changes
//! in a single event: it consumes the network event stream, keeps the
//! topology and host tables current, and decides per frame whether to
//! flood, forward, or install a path.

mod coordinator;
mod report;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorStats, ForwardDecision};
pub use report::{host_lines, path_lines, summary_json, topology_lines};

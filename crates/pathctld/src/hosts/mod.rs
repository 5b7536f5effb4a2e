//! Host location table - where end-stations were last seen.

mod table;

pub use table::{HostLocation, HostTable, HostTableStats};

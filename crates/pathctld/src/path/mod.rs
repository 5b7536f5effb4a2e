//! Path engine - shortest-path computation over topology snapshots.

mod engine;

pub use engine::{shortest_path, ComputedPath};

//! State management module
//!
//! Replication bookmarks per stream and partition, persisted between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - bookmarks keyed by stream name and partition id
//! - `ReplicationTracker` - forward-only advancement and per-partition floors
//! - `StateManager` - file-based state persistence

mod manager;
mod tracker;
mod types;

pub use manager::StateManager;
pub(crate) use tracker::as_instant;
pub use tracker::{compare_values, ReplicationTracker};
pub use types::{PartitionState, State, StreamState};

//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! {"streams": {"orders": {"partitions": {"site_id=RefArch": {
//!     "replication_key": "last_modified",
//!     "replication_key_value": "2024-03-01T10:00:00.000Z"
//! }}}}}
//! ```

use crate::partition::PartitionKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Complete state for a tap run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Bookmark of one partition
    pub fn get_partition(&self, stream: &str, partition: &PartitionKey) -> Option<&PartitionState> {
        self.get_stream(stream)?.partitions.get(&partition.id())
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Per-partition bookmarks keyed by `PartitionKey::id`
    #[serde(default)]
    pub partitions: BTreeMap<String, PartitionState>,
}

/// Bookmark of a single partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Field the value was read from
    pub replication_key: String,
    /// Highest value seen so far
    pub replication_key_value: Value,
}

impl PartitionState {
    /// Create a bookmark
    pub fn new(replication_key: impl Into<String>, value: Value) -> Self {
        Self {
            replication_key: replication_key.into(),
            replication_key_value: value,
        }
    }
}

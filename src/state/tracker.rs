//! Replication state tracker
//!
//! Values only move forward for a given key name. A record with a
//! different key name replaces the bookmark outright.

use super::types::{PartitionState, State};
use crate::partition::PartitionKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// Forward-only bookmarks over a `State`
#[derive(Debug, Clone, Default)]
pub struct ReplicationTracker {
    state: State,
}

impl ReplicationTracker {
    /// Track on top of previously persisted state
    pub fn new(state: State) -> Self {
        Self { state }
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Give back the state
    pub fn into_state(self) -> State {
        self.state
    }

    /// Bookmark of one partition
    pub fn current(&self, stream: &str, partition: &PartitionKey) -> Option<&PartitionState> {
        self.state.get_partition(stream, partition)
    }

    /// Persisted floor of a partition for `key`
    ///
    /// `None` when nothing was stored or the stored key name differs; the
    /// caller then falls back to the configured start date.
    pub fn read_floor(&self, stream: &str, partition: &PartitionKey, key: &str) -> Option<&Value> {
        self.current(stream, partition)
            .filter(|p| p.replication_key == key)
            .map(|p| &p.replication_key_value)
    }

    /// Record `floor` for a partition that has no bookmark yet
    ///
    /// Returns whether anything was written.
    pub fn write_floor_marker(
        &mut self,
        stream: &str,
        partition: &PartitionKey,
        key: &str,
        floor: Value,
    ) -> bool {
        if self.read_floor(stream, partition, key).is_some() {
            return false;
        }
        self.state
            .get_stream_mut(stream)
            .partitions
            .insert(partition.id(), PartitionState::new(key, floor));
        true
    }

    /// Move the bookmark forward to the record's `key` value
    ///
    /// Records without the key, or with a null value, are ignored. Returns
    /// whether the bookmark changed.
    pub fn advance(&mut self, stream: &str, partition: &PartitionKey, key: &str, record: &Value) -> bool {
        let Some(value) = record.get(key).filter(|v| !v.is_null()) else {
            return false;
        };

        let id = partition.id();
        let partitions = &mut self.state.get_stream_mut(stream).partitions;
        if let Some(existing) = partitions.get_mut(&id) {
            if existing.replication_key == key {
                if compare_values(value, &existing.replication_key_value) != Ordering::Greater {
                    return false;
                }
                existing.replication_key_value = value.clone();
                return true;
            }
        }
        partitions.insert(id, PartitionState::new(key, value.clone()));
        true
    }
}

/// Order two replication values
///
/// RFC 3339 timestamps compare as instants, numbers numerically, anything
/// else by its string form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (as_instant(a), as_instant(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    value_text(a).cmp(&value_text(b))
}

/// Parse a replication value as an instant
pub(crate) fn as_instant(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

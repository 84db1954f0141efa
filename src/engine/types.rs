//! Engine types
//!
//! Message types, run statistics and the per-stream run context.

use crate::config::TapConfig;
use crate::http::PageSizeState;
use crate::partition::{EntityContext, PartitionKey};
use crate::stream::StreamCapabilities;
use crate::types::LogLevel;
use serde_json::Value;
use std::collections::HashSet;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One extracted record
    Record {
        /// Stream name
        stream: String,
        /// The record
        data: Value,
        /// Extraction time, milliseconds since the epoch
        emitted_at: i64,
    },
    /// State update
    State {
        /// Stream name
        stream: String,
        /// Bookmarks of the stream's partitions
        data: Value,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, data: Value, emitted_at: i64) -> Self {
        Self::Record {
            stream: stream.into(),
            data,
            emitted_at,
        }
    }

    /// Create a state message
    pub fn state(stream: impl Into<String>, data: Value) -> Self {
        Self::State {
            stream: stream.into(),
            data,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted
    pub records_synced: usize,
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Partitions completed
    pub partitions_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

}

/// Mutable facts about one stream that live for one run
///
/// Shared by every partition of the stream: a shrunk page size and a
/// currency the tenant rejected stay in effect until the run ends. Ceiling
/// restart points belong to the partition that claimed them.
#[derive(Debug)]
pub struct RunContext {
    /// Page size requested from the API
    pub page_size: PageSizeState,
    /// Whether records and state are emitted
    pub emit_records: bool,
    removed_currencies: HashSet<String>,
    used_restart_points: HashSet<(PartitionKey, String)>,
    parent_contexts: Vec<(PartitionKey, EntityContext)>,
    discovered: Discovered,
    pooled: Discovered,
}

/// Contexts in discovery order, without duplicates
#[derive(Debug, Default)]
struct Discovered {
    entries: Vec<(PartitionKey, EntityContext)>,
    seen: HashSet<(PartitionKey, EntityContext)>,
}

impl Discovered {
    fn insert(&mut self, partition: &PartitionKey, context: EntityContext) {
        let entry = (partition.clone(), context);
        if self.seen.insert(entry.clone()) {
            self.entries.push(entry);
        }
    }

    fn take(&mut self) -> Vec<(PartitionKey, EntityContext)> {
        self.seen.clear();
        std::mem::take(&mut self.entries)
    }
}

impl RunContext {
    /// Context starting at `page_size`
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: PageSizeState::new(page_size),
            emit_records: true,
            removed_currencies: HashSet::new(),
            used_restart_points: HashSet::new(),
            parent_contexts: Vec::new(),
            discovered: Discovered::default(),
            pooled: Discovered::default(),
        }
    }

    /// Context for a stream under a configuration
    pub fn for_stream(stream: &dyn StreamCapabilities, config: &TapConfig) -> Self {
        Self::new(stream.page_size(config))
    }

    /// Run without emitting records or state
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.emit_records = false;
        self
    }

    /// Entity contexts produced by the parent stream
    #[must_use]
    pub fn with_parent_contexts(mut self, contexts: Vec<(PartitionKey, EntityContext)>) -> Self {
        self.parent_contexts = contexts;
        self
    }

    /// Currencies rejected so far
    pub fn removed_currencies(&self) -> &HashSet<String> {
        &self.removed_currencies
    }

    /// Drop a currency for the rest of the run
    pub fn remove_currency(&mut self, code: impl Into<String>) -> bool {
        self.removed_currencies.insert(code.into())
    }

    /// Claim a ceiling restart point for a partition; false if that
    /// partition used it before
    pub fn use_restart_point(
        &mut self,
        partition: &PartitionKey,
        value: impl Into<String>,
    ) -> bool {
        self.used_restart_points
            .insert((partition.clone(), value.into()))
    }

    /// Parent contexts that apply to a partition
    ///
    /// Contexts from an implicit parent partition apply everywhere.
    pub fn contexts_for(&self, partition: &PartitionKey) -> Vec<EntityContext> {
        self.parent_contexts
            .iter()
            .filter(|(key, _)| key == partition || key.is_implicit() || partition.is_implicit())
            .map(|(_, context)| context.clone())
            .collect()
    }

    /// Record a context for child streams, ignoring duplicates
    pub fn discover(&mut self, partition: &PartitionKey, context: EntityContext) {
        self.discovered.insert(partition, context);
    }

    /// Contexts discovered so far
    pub fn discovered(&self) -> &[(PartitionKey, EntityContext)] {
        &self.discovered.entries
    }

    /// Hand over the discovered contexts
    pub fn take_discovered(&mut self) -> Vec<(PartitionKey, EntityContext)> {
        self.discovered.take()
    }

    /// Add a context to the shared pool, ignoring duplicates
    pub fn contribute(&mut self, partition: &PartitionKey, context: EntityContext) {
        self.pooled.insert(partition, context);
    }

    /// Contexts contributed to the pool so far
    pub fn pooled(&self) -> &[(PartitionKey, EntityContext)] {
        &self.pooled.entries
    }

    /// Hand over the pooled contexts
    pub fn take_pooled(&mut self) -> Vec<(PartitionKey, EntityContext)> {
        self.pooled.take()
    }
}

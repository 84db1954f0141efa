//! Execution engine module
//!
//! Per-stream read loop over partitions, entities and pages.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PaginationDriver` - runs one stream end to end
//! - `RunContext` - facts about a stream that hold for the whole run
//! - Message types for output (Record, State, Log)
//!
//! # Flow
//!
//! For every stream the driver enumerates partitions, writes a replication
//! floor for each of them, and only then starts fetching. Within a
//! partition it walks the entity contexts handed down by the parent stream
//! and pages through each one until the classifier reports no next cursor.
//! Streams fed by a shared pool (product ids gathered from several
//! streams) replay the pooled contexts as records and make no requests.

mod types;

pub use types::{Message, RunContext, SyncStats};

use crate::auth::{CredentialSource, TokenRegistry};
use crate::classify::{Classification, PagePosition, ResponseClassifier};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RetryPolicy};
use crate::output::MessageSink;
use crate::pagination::{exceeds_ceiling, Cursor, PagingMode};
use crate::partition::{EntityContext, PartitionKey, PartitionRouter, SiteRouter};
use crate::request::RequestBuilder;
use crate::state::{as_instant, ReplicationTracker, State};
use crate::stream::{PageRequest, StreamCapabilities};
use crate::types::StringMap;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives paginated extraction for one tenant
pub struct PaginationDriver {
    config: Arc<TapConfig>,
    client: HttpClient,
    tokens: Arc<TokenRegistry>,
    retry: RetryPolicy,
    tracker: ReplicationTracker,
}

impl PaginationDriver {
    /// Create a driver on top of previously persisted state
    pub fn new(
        config: Arc<TapConfig>,
        client: HttpClient,
        tokens: Arc<TokenRegistry>,
        state: State,
    ) -> Self {
        let retry = RetryPolicy::from_settings(&config.http);
        Self {
            config,
            client,
            tokens,
            retry,
            tracker: ReplicationTracker::new(state),
        }
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current bookmarks
    pub fn state(&self) -> &State {
        self.tracker.state()
    }

    /// Give back the bookmarks
    pub fn into_state(self) -> State {
        self.tracker.into_state()
    }

    /// Run one stream over all of its partitions
    ///
    /// Silent runs (parents pulled in only to feed children) advance a
    /// scratch copy of the bookmarks so the persisted state is untouched.
    pub async fn run_stream(
        &mut self,
        stream: &dyn StreamCapabilities,
        ctx: &mut RunContext,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let credentials: Arc<dyn CredentialSource> =
            self.tokens.resolve(&self.config.domain, stream.grant_flow())?;

        let mut scratch = (!ctx.emit_records)
            .then(|| ReplicationTracker::new(self.tracker.state().clone()));
        let tracker = match scratch.as_mut() {
            Some(scratch) => scratch,
            None => &mut self.tracker,
        };

        let mut run = StreamRun {
            config: &self.config,
            client: &self.client,
            retry: &self.retry,
            credentials,
            tracker,
            paging: stream.paging(&self.config),
            stream,
            ctx,
            sink,
            stats: SyncStats::new(),
        };
        run.run().await?;

        let mut stats = run.stats;
        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            stream = stream.name(),
            records = stats.records_synced,
            pages = stats.pages_fetched,
            "Stream completed"
        );
        Ok(stats)
    }
}

/// Borrowed pieces of one stream run
struct StreamRun<'a> {
    config: &'a TapConfig,
    client: &'a HttpClient,
    retry: &'a RetryPolicy,
    credentials: Arc<dyn CredentialSource>,
    tracker: &'a mut ReplicationTracker,
    paging: PagingMode,
    stream: &'a dyn StreamCapabilities,
    ctx: &'a mut RunContext,
    sink: &'a mut dyn MessageSink,
    stats: SyncStats,
}

impl StreamRun<'_> {
    async fn run(&mut self) -> Result<()> {
        let name = self.stream.name();
        let partitions =
            SiteRouter::new(self.config.site_ids(), self.stream.site_scoped()).partitions();
        if partitions.is_empty() {
            return Err(Error::missing_field("site_id"));
        }

        info!(stream = name, partitions = partitions.len(), "Starting stream");
        self.write_floor_markers(&partitions)?;

        for partition in &partitions {
            debug!(stream = name, %partition, "Starting partition");
            self.run_partition(partition).await?;
            self.stats.add_partition();
        }
        Ok(())
    }

    /// Bookmark every partition before the first fetch of any of them
    fn write_floor_markers(&mut self, partitions: &[PartitionKey]) -> Result<()> {
        let Some(key) = self.stream.replication_key() else {
            return Ok(());
        };
        let floor = Value::String(
            self.config
                .start_date_or_epoch()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        );

        let mut written = false;
        for partition in partitions {
            written |= self
                .tracker
                .write_floor_marker(self.stream.name(), partition, key, floor.clone());
        }
        if written {
            self.emit_state()?;
        }
        Ok(())
    }

    async fn run_partition(&mut self, partition: &PartitionKey) -> Result<()> {
        let floor = self.floor(partition);
        let replays_pool = !self.stream.feeders().is_empty();
        let entities = if self.stream.parent().is_some() || replays_pool {
            self.ctx.contexts_for(partition)
        } else {
            vec![EntityContext::new()]
        };
        debug!(stream = self.stream.name(), %partition, entities = entities.len(), "Entities to fetch");

        if replays_pool {
            self.replay_pool(partition, entities)?;
        } else {
            for entity in entities {
                let mut vars = partition.values();
                vars.extend(entity);
                self.run_entity(partition, &vars, floor).await?;
            }
        }

        if self.stream.replication_key().is_some() {
            self.emit_state()?;
        }
        Ok(())
    }

    /// Replication floor: the stored bookmark, else the configured start
    fn floor(&self, partition: &PartitionKey) -> DateTime<Utc> {
        self.stream
            .replication_key()
            .and_then(|key| self.tracker.read_floor(self.stream.name(), partition, key))
            .and_then(as_instant)
            .unwrap_or_else(|| self.config.start_date_or_epoch())
    }

    async fn run_entity(
        &mut self,
        partition: &PartitionKey,
        vars: &StringMap,
        floor: DateTime<Utc>,
    ) -> Result<()> {
        if !self.paging.has_work(self.ctx.removed_currencies()) {
            debug!(stream = self.stream.name(), "Nothing to request for entity");
            return Ok(());
        }

        let mut cursor: Option<Cursor> = None;
        let mut range_from = floor;

        loop {
            let current = self
                .paging
                .effective_cursor(cursor, self.ctx.removed_currencies());
            if matches!(self.paging, PagingMode::Currency(_)) && current.is_none() {
                break;
            }

            match self.fetch(vars, current, range_from).await? {
                Classification::Success {
                    records,
                    next_cursor,
                } => {
                    self.handle_records(partition, vars, records)?;
                    self.stats.add_page();

                    let Some(next) = next_cursor else {
                        break;
                    };
                    if current == Some(next) {
                        return Err(Error::pagination_loop(self.stream.name(), &next));
                    }

                    if let Cursor::Offset(start) = next {
                        if self.stream.offset_ceiling_restart()
                            && exceeds_ceiling(start, self.ctx.page_size.current())
                        {
                            match self.restart_point(partition) {
                                Some(from) => {
                                    info!(
                                        stream = self.stream.name(),
                                        %partition,
                                        from = %from,
                                        "Offset ceiling reached, restarting from high-water mark"
                                    );
                                    range_from = from;
                                    cursor = None;
                                    continue;
                                }
                                None => {
                                    let message = format!(
                                        "Offset ceiling reached for stream '{}' partition '{}' with no unused restart point; ending partition",
                                        self.stream.name(),
                                        partition
                                    );
                                    warn!("{message}");
                                    self.sink.emit(Message::warn(message))?;
                                    break;
                                }
                            }
                        }
                    }

                    cursor = Some(next);
                }
                Classification::Empty => {
                    debug!(stream = self.stream.name(), "Empty response, entity finished");
                    break;
                }
                Classification::UnsupportedCurrency(code) => {
                    warn!(stream = self.stream.name(), currency = %code, "Currency not supported, dropping it for this run");
                    self.ctx.remove_currency(code);
                    cursor = self
                        .paging
                        .advance_currency(current, self.ctx.removed_currencies());
                    if cursor.is_none() {
                        break;
                    }
                }
                // `execute` escalates retriable outcomes once the budget is spent
                Classification::Retriable(reason) => {
                    return Err(reason.into_error(self.retry.max_attempts));
                }
                Classification::Fatal(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// One page, with retries
    async fn fetch(
        &self,
        vars: &StringMap,
        cursor: Option<Cursor>,
        range_from: DateTime<Utc>,
    ) -> Result<Classification> {
        let builder = RequestBuilder::new(self.config);
        let removed = self.ctx.removed_currencies();

        self.retry
            .execute(&self.ctx.page_size, |page_size| async move {
                let token = self.credentials.access_token().await?;
                let page = PageRequest {
                    paging: &self.paging,
                    cursor,
                    page_size,
                    range_from,
                    now: Utc::now(),
                };
                let request = builder.build(self.stream, vars, &token, &page)?;
                let response = self.client.send(&request).await?;

                let mut secrets = vec![token.as_str(), self.config.client_secret.as_str()];
                if let Some(ref password) = self.config.password {
                    secrets.push(password.as_str());
                }
                let classifier = ResponseClassifier::new(
                    self.stream,
                    &self.config.extra_retry_statuses,
                    secrets,
                );
                let classification = classifier.classify(
                    &response,
                    PagePosition {
                        mode: &self.paging,
                        cursor,
                        removed,
                    },
                );
                debug!(
                    stream = self.stream.name(),
                    status = response.status,
                    outcome = classification.label(),
                    "Classified response"
                );
                Ok::<_, Error>(classification)
            })
            .await
    }

    fn handle_records(
        &mut self,
        partition: &PartitionKey,
        vars: &StringMap,
        records: Vec<Value>,
    ) -> Result<()> {
        let name = self.stream.name();
        let emitted_at = Utc::now().timestamp_millis();

        for mut record in records {
            if let Some(child) = self.stream.child_context(&record, vars) {
                self.ctx.discover(partition, child);
            }
            if let Some(pooled) = self.stream.pool_context(&record, vars) {
                self.ctx.contribute(partition, pooled);
            }
            if let Some(key) = self.stream.replication_key() {
                self.tracker.advance(name, partition, key, &record);
            }
            if self.ctx.emit_records {
                self.stream.stamp_record(&mut record, vars);
                self.sink.emit(Message::record(name, record, emitted_at))?;
                self.stats.add_records(1);
            }
        }
        Ok(())
    }

    /// Emit pooled contexts as records without calling the API
    fn replay_pool(&mut self, partition: &PartitionKey, entities: Vec<EntityContext>) -> Result<()> {
        let records = entities
            .into_iter()
            .map(|entity| {
                Value::Object(
                    entity
                        .into_iter()
                        .map(|(name, value)| (name, Value::String(value)))
                        .collect(),
                )
            })
            .collect();
        self.handle_records(partition, &partition.values(), records)
    }

    /// Claim the partition's high-water mark as a ceiling restart point
    ///
    /// `None` when there is no usable mark or it was already used.
    fn restart_point(&mut self, partition: &PartitionKey) -> Option<DateTime<Utc>> {
        let key = self.stream.replication_key()?;
        let value = self
            .tracker
            .read_floor(self.stream.name(), partition, key)?
            .clone();
        let from = as_instant(&value)?;
        let claimed = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        self.ctx.use_restart_point(partition, claimed).then_some(from)
    }

    fn emit_state(&mut self) -> Result<()> {
        if !self.ctx.emit_records {
            return Ok(());
        }
        let data = match self.tracker.state().get_stream(self.stream.name()) {
            Some(stream_state) => serde_json::to_value(stream_state)?,
            None => return Ok(()),
        };
        self.sink.emit(Message::state(self.stream.name(), data))
    }
}

//! CLI runner - executes commands

use crate::auth::{CredentialSource, GrantFlow, TokenRegistry};
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{Message, PaginationDriver, RunContext};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig};
use crate::output::{JsonLinesSink, MessageSink};
use crate::pagination::PagingMode;
use crate::partition::{EntityContext, PartitionKey};
use crate::redact;
use crate::request::RequestBuilder;
use crate::state::StateManager;
use crate::stream::{self, PageRequest, ResolvedStream};
use crate::types::{LogLevel, StringMap};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// CLI runner
pub struct Runner<W: Write + Send = io::Stdout> {
    cli: Cli,
    out: JsonLinesSink<W>,
}

impl Runner {
    /// Create a runner writing to stdout
    pub fn new(cli: Cli) -> Self {
        Self::with_writer(cli, io::stdout())
    }
}

impl<W: Write + Send> Runner<W> {
    /// Create a runner writing protocol messages to `writer`
    pub fn with_writer(cli: Cli, writer: W) -> Self {
        Self {
            cli,
            out: JsonLinesSink::new(writer),
        }
    }

    /// Give back the output writer
    pub fn into_writer(self) -> W {
        self.out.into_inner()
    }

    /// Run the CLI command
    pub async fn run(&mut self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Streams => self.streams(),
            Commands::Read { streams } => {
                let selected = Cli::selected_streams(streams.as_deref());
                self.read(&selected).await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        Err(Error::config(
            "No configuration given; pass --config or --config-json",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn build_client(config: &TapConfig) -> Result<(HttpClient, TokenRegistry)> {
        let client = HttpClient::with_config(HttpClientConfig::from_settings(&config.http))?;
        let tokens = TokenRegistry::from_config(config, client.inner().clone());
        Ok((client, tokens))
    }

    // ========================================================================
    // check
    // ========================================================================

    /// Check connection
    async fn check(&mut self) -> Result<()> {
        let config = self.load_config()?;
        let (client, tokens) = Self::build_client(&config)?;

        self.out.emit(Message::info(format!(
            "Checking connection to {}",
            config.host()
        )))?;

        let status = match Self::check_connection(&config, &client, &tokens).await {
            Ok(()) => json!({
                "status": "SUCCEEDED",
                "message": "Connection successful"
            }),
            Err(e) => json!({
                "status": "FAILED",
                "message": format!("Connection failed: {e}")
            }),
        };
        self.out.write_value(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }))
    }

    /// Acquire every configured token, then list sites with one record
    async fn check_connection(config: &TapConfig, client: &HttpClient, tokens: &TokenRegistry) -> Result<()> {
        futures::future::try_join_all(tokens.providers().map(|provider| provider.get_token()))
            .await?;

        let sites = stream::find("sites")?;
        let token = tokens
            .resolve(&config.domain, GrantFlow::ClientCredentials)?
            .access_token()
            .await?;
        let paging = PagingMode::Single;
        let page = PageRequest {
            paging: &paging,
            cursor: None,
            page_size: 1,
            range_from: config.start_date_or_epoch(),
            now: Utc::now(),
        };
        let request = RequestBuilder::new(config).build(&sites, &StringMap::new(), &token, &page)?;
        let response = client.send(&request).await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(Error::http_status(
                response.status,
                response.url,
                redact::excerpt(&response.body, &[token.as_str(), config.client_secret.as_str()]),
            ))
        }
    }

    // ========================================================================
    // streams
    // ========================================================================

    /// List stream names
    fn streams(&mut self) -> Result<()> {
        let streams: Vec<Value> = stream::catalog()
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "parent": s.parent,
                    "replication_key": s.replication_key
                })
            })
            .collect();

        self.out.write_value(&json!({
            "type": "STREAMS",
            "streams": streams
        }))
    }

    // ========================================================================
    // read
    // ========================================================================

    /// Read streams in catalog order, feeding parent records to children
    async fn read(&mut self, selected: &[String]) -> Result<()> {
        let sync_start = Instant::now();
        let config = Arc::new(self.load_config()?);
        let state = self.load_state()?;
        let plan = stream::resolve(selected)?;

        let (client, tokens) = Self::build_client(&config)?;
        let mut driver = PaginationDriver::new(
            Arc::clone(&config),
            client,
            Arc::new(tokens),
            state.snapshot().await,
        );

        let mut contexts: HashMap<&str, Vec<(PartitionKey, EntityContext)>> = HashMap::new();
        let mut pools: HashMap<&str, Vec<(PartitionKey, EntityContext)>> = HashMap::new();
        let mut failed: HashSet<&str> = HashSet::new();
        let mut stream_results: Vec<Value> = Vec::new();
        let mut total_records = 0usize;

        for resolved in &plan {
            let descriptor = &resolved.descriptor;
            let name = descriptor.name;

            if let Some(upstream) = descriptor.dependencies().find(|d| failed.contains(d)) {
                failed.insert(name);
                stream_results.push(json!({
                    "stream": name,
                    "status": "SKIPPED",
                    "reason": format!("upstream stream '{upstream}' failed")
                }));
                continue;
            }

            self.out.emit(Message::info(format!(
                "Starting sync for stream: {name}"
            )))?;

            let parent_contexts = if descriptor.fed_by.is_empty() {
                descriptor
                    .parent
                    .and_then(|p| contexts.get(p).cloned())
                    .unwrap_or_default()
            } else {
                merge_pools(&pools, descriptor.fed_by)
            };
            let mut ctx =
                RunContext::for_stream(descriptor, &config).with_parent_contexts(parent_contexts);
            if !resolved.emit {
                ctx = ctx.silent();
            }

            match driver.run_stream(descriptor, &mut ctx, &mut self.out).await {
                Ok(stats) => {
                    total_records += stats.records_synced;
                    if has_children(&plan, name) {
                        contexts.insert(name, ctx.take_discovered());
                    }
                    if feeds_pool(&plan, name) {
                        pools.insert(name, ctx.take_pooled());
                    }
                    stream_results.push(json!({
                        "stream": name,
                        "status": "SUCCESS",
                        "emitted": resolved.emit,
                        "records_synced": stats.records_synced,
                        "pages_fetched": stats.pages_fetched,
                        "partitions_synced": stats.partitions_synced,
                        "duration_ms": stats.duration_ms
                    }));
                }
                Err(e) => {
                    error!(stream = name, error = %e, "Stream failed");
                    self.out.emit(Message::log(
                        LogLevel::Error,
                        format!("Error syncing stream {name}: {e}"),
                    ))?;
                    failed.insert(name);
                    stream_results.push(json!({
                        "stream": name,
                        "status": "FAILED",
                        "error": e.to_string()
                    }));
                }
            }
        }

        // Persist whatever progress was made, failed streams included
        state.replace(driver.into_state()).await;
        let state_file_path = match &self.cli.state {
            Some(path) => {
                state
                    .save_to_file(path)
                    .await
                    .context(format!("Failed to write state file {}", path.display()))?;
                Some(path.to_string_lossy().to_string())
            }
            None => None,
        };

        // Always emit final state to stdout so caller can capture it
        let final_state = state.to_value().await?;
        self.out.write_value(&json!({
            "type": "STATE",
            "state": final_state
        }))?;

        let count = |status: &str| stream_results.iter().filter(|r| r["status"] == status).count();
        let successful_streams = count("SUCCESS");
        let failed_streams = count("FAILED");
        let skipped_streams = count("SKIPPED");
        let total_duration_ms = sync_start.elapsed().as_millis() as u64;

        info!(
            records = total_records,
            failed = failed_streams,
            duration_ms = total_duration_ms,
            "Sync finished"
        );

        self.out.write_value(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if failed_streams == 0 { "SUCCEEDED" } else if successful_streams == 0 { "FAILED" } else { "PARTIAL" },
                "total_records": total_records,
                "total_streams": stream_results.len(),
                "successful_streams": successful_streams,
                "failed_streams": failed_streams,
                "skipped_streams": skipped_streams,
                "duration_ms": total_duration_ms,
                "state_file": state_file_path,
                "streams": stream_results
            }
        }))?;

        if failed_streams > 0 {
            return Err(Error::Other(format!("{failed_streams} stream(s) failed")));
        }
        Ok(())
    }
}

fn has_children(plan: &[ResolvedStream], name: &str) -> bool {
    plan.iter().any(|s| s.descriptor.parent == Some(name))
}

fn feeds_pool(plan: &[ResolvedStream], name: &str) -> bool {
    plan.iter().any(|s| s.descriptor.fed_by.contains(&name))
}

/// Pooled contexts of every feeder, first occurrence wins
fn merge_pools(
    pools: &HashMap<&str, Vec<(PartitionKey, EntityContext)>>,
    feeders: &[&str],
) -> Vec<(PartitionKey, EntityContext)> {
    let mut seen = HashSet::new();
    feeders
        .iter()
        .filter_map(|feeder| pools.get(feeder))
        .flatten()
        .filter(|entry| seen.insert(*entry))
        .cloned()
        .collect()
}

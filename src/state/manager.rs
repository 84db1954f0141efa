//! Loading and persisting replication state
//!
//! State comes from an inline JSON document, a file, or nothing at all. It
//! is written back once per run, through a sibling `.tmp` file that is
//! renamed over the target so a crash never leaves a half-written state.

use super::types::State;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the run's replication state and knows where it lives on disk
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Target file; `None` keeps state in memory only
    path: Option<PathBuf>,
    state: Arc<RwLock<State>>,
}

impl StateManager {
    fn with_state(path: Option<PathBuf>, state: State) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Empty state that will be saved to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_state(Some(path.as_ref().to_path_buf()), State::new())
    }

    /// Empty state that is never written anywhere
    pub fn in_memory() -> Self {
        Self::with_state(None, State::new())
    }

    /// State read from `path`; a missing or empty file is an empty state
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = match std::fs::read_to_string(path) {
            Ok(contents) => parse_state(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(e) => {
                return Err(Error::state(format!(
                    "Failed to read state file {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self::with_state(Some(path.to_path_buf()), state))
    }

    /// State given inline; kept in memory
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(None, parse_state(json)?))
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Replace the current state
    pub async fn replace(&self, state: State) {
        *self.state.write().await = state;
    }

    /// Write to the manager's own file; a no-op in memory
    pub async fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }

    /// Write to `path`, replacing it atomically
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write {}: {e}", temp_path.display())))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to replace {}: {e}", path.display())))
    }

    /// Current state as a JSON document
    pub async fn to_value(&self) -> Result<Value> {
        let state = self.state.read().await;
        serde_json::to_value(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Whether the state has no backing file
    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}

fn parse_state(json: &str) -> Result<State> {
    if json.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}

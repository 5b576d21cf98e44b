//! Daemon state snapshot and its state-file supplier.

use super::events::LiveEvent;
use crate::types::AdjacencyMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STATE_FILENAME: &str = "state.json";

/// Location of the daemon state file under a repository root.
pub fn state_path(root: &Path) -> PathBuf {
    root.join(".codemap").join(STATE_FILENAME)
}

/// Immutable snapshot of what the watch daemon knows about the repository.
///
/// Callers hand this value to the pipeline as-is. Freshness is the supplier's
/// responsibility: a stale snapshot must be withheld rather than passed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub hubs: Vec<String>,
    /// file -> files that import it
    #[serde(default)]
    pub importers: AdjacencyMap,
    /// file -> files it imports
    #[serde(default)]
    pub imports: AdjacencyMap,
    #[serde(default)]
    pub recent_events: Vec<LiveEvent>,
}

impl LiveState {
    pub fn has_dependency_context(&self) -> bool {
        !self.importers.is_empty() || !self.imports.is_empty()
    }

    /// Re-read the persisted daemon state for `root`.
    ///
    /// Returns `None` when the file is missing, unparsable, or older than
    /// `freshness` (the daemon is then assumed not to be running).
    pub fn read(root: &Path, freshness: std::time::Duration) -> Option<LiveState> {
        Self::read_at(root, freshness, Utc::now())
    }

    pub(crate) fn read_at(
        root: &Path,
        freshness: std::time::Duration,
        now: DateTime<Utc>,
    ) -> Option<LiveState> {
        let path = state_path(root);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No daemon state available");
                return None;
            }
        };

        let state: LiveState = match serde_json::from_slice(&data) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unparsable daemon state");
                return None;
            }
        };

        let window = Duration::from_std(freshness).unwrap_or_else(|_| Duration::seconds(30));
        match state.updated_at {
            Some(updated_at) if now.signed_duration_since(updated_at) <= window => Some(state),
            _ => {
                debug!(path = %path.display(), "Daemon state is stale; treating as absent");
                None
            }
        }
    }
}

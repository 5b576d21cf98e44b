//! Handoff snapshot model.
//!
//! The artifact is split in two layers: a slow-changing prefix (repository
//! shape) and a volatile delta (the current working session). Each layer is
//! hashed on its own so a rebuild can tell which layer actually changed.

use super::hasher;
use crate::types::{HexDigest, RelPath};
use crate::watch::EventOp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_SINCE: Duration = Duration::from_secs(6 * 60 * 60);

/// Importer count at which a file counts as a hub.
pub const HUB_IMPORTER_THRESHOLD: usize = 3;
/// Importer count at which a changed file is flagged as a risk.
pub const RISK_IMPORTER_THRESHOLD: usize = 2;

fn is_zero_usize(value: &usize) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Where a changed path was first seen. Later variants outrank earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Branch,
    Modified,
    Staged,
    Untracked,
    Event,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Branch => "branch",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Staged => "staged",
            ChangeStatus::Untracked => "untracked",
            ChangeStatus::Event => "event",
        }
    }
}

/// Structurally important file (import fan-in at or above the hub threshold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSummary {
    pub path: RelPath,
    pub importers: usize,
}

/// Lightweight reference to a changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStub {
    pub path: RelPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HexDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Absent only on stubs recovered from legacy artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
}

/// Changed file annotated with its blast radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFile {
    pub path: RelPath,
    pub importers: usize,
    pub is_hub: bool,
    pub reason: String,
}

/// Compact mirror of a daemon timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub time: DateTime<Utc>,
    pub op: EventOp,
    pub path: RelPath,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub delta: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_hub: bool,
}

/// Stable layer: facts about the repository shape. Never holds working-tree data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixSnapshot {
    #[serde(default, skip_serializing_if = "is_zero_usize")]
    pub file_count: usize,
    #[serde(default)]
    pub hubs: Vec<HubSummary>,
}

/// Volatile layer: everything tied to the current working session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSnapshot {
    #[serde(default)]
    pub changed: Vec<FileStub>,
    #[serde(default)]
    pub risk_files: Vec<RiskFile>,
    #[serde(default)]
    pub recent_events: Vec<EventSummary>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

/// How much of the artifact was reused from the previous build. Always derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetrics {
    #[serde(default)]
    pub prefix_bytes: usize,
    #[serde(default)]
    pub delta_bytes: usize,
    #[serde(default)]
    pub total_bytes: usize,
    #[serde(default)]
    pub unchanged_bytes: usize,
    #[serde(default)]
    pub reuse_ratio: f64,
    #[serde(default)]
    pub prefix_reused: bool,
    #[serde(default)]
    pub delta_reused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_combined_hash: Option<HexDigest>,
}

/// The persisted handoff payload shared between agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub schema_version: u32,
    /// At or before the Unix epoch means "never stamped".
    #[serde(default)]
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub base_ref: String,
    #[serde(default)]
    pub prefix: PrefixSnapshot,
    #[serde(default)]
    pub delta: DeltaSnapshot,
    #[serde(default)]
    pub prefix_hash: HexDigest,
    #[serde(default)]
    pub delta_hash: HexDigest,
    #[serde(default)]
    pub combined_hash: HexDigest,
    #[serde(default)]
    pub metrics: CacheMetrics,

    // Legacy top-level mirror of the delta, kept for older readers.
    #[serde(default)]
    pub changed_files: Vec<RelPath>,
    #[serde(default)]
    pub risk_files: Vec<RiskFile>,
    #[serde(default)]
    pub recent_events: Vec<EventSummary>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

impl Artifact {
    /// Anything at or before the Unix epoch (including Go's zero time) is unset.
    pub fn has_timestamp(&self) -> bool {
        self.generated_at.timestamp() > 0
    }

    pub fn find_changed(&self, path: &str) -> Option<&FileStub> {
        self.delta.changed.iter().find(|stub| stub.path == path)
    }

    /// Overwrite the legacy mirror with the current delta.
    pub fn sync_legacy_mirror(&mut self) {
        self.changed_files = self.delta.changed.iter().map(|s| s.path.clone()).collect();
        self.risk_files = self.delta.risk_files.clone();
        self.recent_events = self.delta.recent_events.clone();
        self.next_steps = self.delta.next_steps.clone();
        self.open_questions = self.delta.open_questions.clone();
    }

    /// Bring an artifact written by any schema version into the current shape.
    ///
    /// Delta slices missing from older artifacts are recovered from the legacy
    /// mirror, the mirror is filled from the delta, and hashes that predate
    /// hashing support are recomputed. Idempotent.
    pub fn normalize(&mut self) {
        if self.schema_version == 0 {
            self.schema_version = SCHEMA_VERSION;
        }

        if self.delta.changed.is_empty() && !self.changed_files.is_empty() {
            self.delta.changed = self
                .changed_files
                .iter()
                .map(|path| FileStub {
                    path: path.clone(),
                    hash: None,
                    size: None,
                    status: None,
                })
                .collect();
        }
        if self.delta.risk_files.is_empty() {
            self.delta.risk_files = self.risk_files.clone();
        }
        if self.delta.recent_events.is_empty() {
            self.delta.recent_events = self.recent_events.clone();
        }
        if self.delta.next_steps.is_empty() {
            self.delta.next_steps = self.next_steps.clone();
        }
        if self.delta.open_questions.is_empty() {
            self.delta.open_questions = self.open_questions.clone();
        }

        if self.changed_files.is_empty() {
            self.changed_files = self.delta.changed.iter().map(|s| s.path.clone()).collect();
        }
        if self.risk_files.is_empty() {
            self.risk_files = self.delta.risk_files.clone();
        }
        if self.recent_events.is_empty() {
            self.recent_events = self.delta.recent_events.clone();
        }
        if self.next_steps.is_empty() {
            self.next_steps = self.delta.next_steps.clone();
        }
        if self.open_questions.is_empty() {
            self.open_questions = self.delta.open_questions.clone();
        }

        if self.prefix_hash.is_empty() {
            if let Ok(digest) = hasher::hash_canonical(&self.prefix) {
                self.prefix_hash = digest.hash;
            }
        }
        if self.delta_hash.is_empty() {
            if let Ok(digest) = hasher::hash_canonical(&self.delta) {
                self.delta_hash = digest.hash;
            }
        }
        if self.combined_hash.is_empty() {
            self.combined_hash = hasher::combined_hash(&self.prefix_hash, &self.delta_hash);
        }
    }
}

/// Dependency context for one changed file, resolved on demand. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetail {
    pub path: RelPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HexDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
    pub importers: Vec<RelPath>,
    pub imports: Vec<RelPath>,
    pub recent_events: Vec<EventSummary>,
    pub is_hub: bool,
}

//! Timeline events published by the watch daemon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem operation recorded in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventOp {
    Create,
    Write,
    Remove,
    Rename,
    /// Any op this version does not understand. Dropped from summaries.
    #[serde(other)]
    Unknown,
}

impl EventOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOp::Create => "CREATE",
            EventOp::Write => "WRITE",
            EventOp::Remove => "REMOVE",
            EventOp::Rename => "RENAME",
            EventOp::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EventOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daemon event with its structural context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub time: DateTime<Utc>,
    pub op: EventOp,
    /// Repository-relative path
    pub path: String,
    /// Line count change (+/-)
    #[serde(default)]
    pub delta: i64,
    /// Importer count of the touched file at event time
    #[serde(default)]
    pub importers: usize,
    #[serde(default)]
    pub is_hub: bool,
}

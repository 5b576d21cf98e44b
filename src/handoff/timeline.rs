//! Recent-events window over the daemon timeline.

use super::collect::ChangedEntry;
use super::types::{ChangeStatus, EventSummary};
use crate::types::{normalize_rel_path, RelPath};
use crate::watch::{EventOp, LiveState};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Events newer than `now - since`, ordered by (time, path, op) and capped to
/// the most recent `max_events`.
pub fn summarize_events(
    state: Option<&LiveState>,
    since: std::time::Duration,
    max_events: usize,
    now: DateTime<Utc>,
) -> Vec<EventSummary> {
    let state = match state {
        Some(state) if !state.recent_events.is_empty() => state,
        _ => return Vec::new(),
    };

    let cutoff = Duration::from_std(since)
        .ok()
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut events: Vec<EventSummary> = state
        .recent_events
        .iter()
        .filter(|e| e.time >= cutoff && e.op != EventOp::Unknown)
        .map(|e| EventSummary {
            time: e.time,
            op: e.op,
            path: normalize_rel_path(&e.path),
            delta: e.delta,
            is_hub: e.is_hub,
        })
        .filter(|e| !e.path.is_empty())
        .collect();

    events.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.op.as_str().cmp(b.op.as_str()))
    });

    if events.len() > max_events {
        events.drain(..events.len() - max_events);
    }
    events
}

/// Unique paths touched by `events`, sorted, each tagged `event`.
pub fn changed_from_events(events: &[EventSummary]) -> Vec<ChangedEntry> {
    let paths: BTreeSet<&RelPath> = events.iter().map(|e| &e.path).collect();
    paths
        .into_iter()
        .map(|path| ChangedEntry::new(path.clone(), ChangeStatus::Event))
        .collect()
}

/// Timeline entries for a single path, in timeline order.
pub fn events_for_path(events: &[EventSummary], path: &str) -> Vec<EventSummary> {
    events.iter().filter(|e| e.path == path).cloned().collect()
}

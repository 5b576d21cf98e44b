//! Blast-radius ranking of changed files and repository hubs.

use super::collect::ChangedEntry;
use super::types::{
    ChangeStatus, HubSummary, RiskFile, HUB_IMPORTER_THRESHOLD, RISK_IMPORTER_THRESHOLD,
};
use crate::types::{AdjacencyMap, RelPath};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Descending importer count, then ascending path.
fn by_impact(a_count: usize, a_path: &str, b_count: usize, b_path: &str) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_path.cmp(b_path))
}

fn importer_count(importers: &AdjacencyMap, path: &str) -> usize {
    importers.get(path).map(Vec::len).unwrap_or(0)
}

/// Risk files among `changed`, ranked by importer count and capped at `max_risk`.
pub fn summarize_risk_files(
    changed: &[RelPath],
    importers: &AdjacencyMap,
    max_risk: usize,
) -> Vec<RiskFile> {
    if importers.is_empty() {
        return Vec::new();
    }

    let mut risk: Vec<RiskFile> = changed
        .iter()
        .filter_map(|path| {
            let count = importer_count(importers, path);
            if count < RISK_IMPORTER_THRESHOLD {
                return None;
            }
            let is_hub = count >= HUB_IMPORTER_THRESHOLD;
            let reason = if is_hub {
                format!("hub file imported by {} files", count)
            } else {
                format!("imported by {} files", count)
            };
            Some(RiskFile {
                path: path.clone(),
                importers: count,
                is_hub,
                reason,
            })
        })
        .collect();

    risk.sort_by(|a, b| by_impact(a.importers, &a.path, b.importers, &b.path));
    risk.truncate(max_risk);
    risk
}

/// Hub files across the whole importer map, ranked like risk files.
pub fn summarize_hubs(importers: &AdjacencyMap, max_hubs: usize) -> Vec<HubSummary> {
    let mut hubs: Vec<HubSummary> = importers
        .iter()
        .filter(|(_, list)| list.len() >= HUB_IMPORTER_THRESHOLD)
        .map(|(path, list)| HubSummary {
            path: path.clone(),
            importers: list.len(),
        })
        .collect();

    hubs.sort_by(|a, b| by_impact(a.importers, &a.path, b.importers, &b.path));
    if max_hubs > 0 {
        hubs.truncate(max_hubs);
    }
    hubs
}

/// Pick at most `max_changed` paths, risk files first in rank order, then the
/// remaining changed paths in their given order.
pub fn prioritize_changed_paths(
    changed: &[RelPath],
    risk: &[RiskFile],
    max_changed: usize,
) -> Vec<RelPath> {
    if changed.len() <= max_changed {
        return changed.to_vec();
    }

    let available: BTreeSet<&str> = changed.iter().map(String::as_str).collect();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::with_capacity(max_changed);

    let risk_first = risk.iter().map(|r| r.path.as_str()).filter(|p| available.contains(p));
    let rest = changed.iter().map(String::as_str);
    for path in risk_first.chain(rest) {
        if out.len() >= max_changed {
            break;
        }
        if seen.insert(path) {
            out.push(path.to_string());
        }
    }
    out
}

/// Entries for `selected` in selection order. Paths with no collected entry
/// came from the timeline and are tagged `event`.
pub fn select_entries(entries: &[ChangedEntry], selected: &[RelPath]) -> Vec<ChangedEntry> {
    let by_path: BTreeMap<&str, ChangeStatus> = entries
        .iter()
        .map(|entry| (entry.path.as_str(), entry.status))
        .collect();

    selected
        .iter()
        .map(|path| {
            let status = by_path
                .get(path.as_str())
                .copied()
                .unwrap_or(ChangeStatus::Event);
            ChangedEntry::new(path.clone(), status)
        })
        .collect()
}

//! Core types shared across the handoff pipeline.

use std::collections::BTreeMap;

/// Repository-relative path with forward-slash separators.
pub type RelPath = String;

/// Hex-encoded SHA-256 digest.
pub type HexDigest = String;

/// Adjacency map keyed by file: importers (file -> files importing it) or
/// imports (file -> files it imports).
pub type AdjacencyMap = BTreeMap<RelPath, Vec<RelPath>>;

/// Normalize a path reported by git, a daemon event, or a caller into the
/// canonical repository-relative form. Returns an empty string for blank input.
pub fn normalize_rel_path(raw: &str) -> RelPath {
    let trimmed = raw.trim();
    let slashed = if std::path::MAIN_SEPARATOR != '/' {
        trimmed.replace(std::path::MAIN_SEPARATOR, "/")
    } else {
        trimmed.to_string()
    };
    slashed.trim_start_matches("./").to_string()
}

//! Cheap repository file count.
//!
//! Only used to pick a budget tier and to guard expensive graph builds, so it
//! walks the tree once without reading any file contents. The walk honours
//! `.gitignore`, `.git/info/exclude` and the global git excludes file.

use ignore::{DirEntry, WalkBuilder};
use std::path::Path;
use tracing::debug;

/// Tool, build, and vendor directories that never count as project files.
pub const IGNORED_DIR_NAMES: &[&str] = &[
    ".git",
    ".codemap",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".next",
    ".nuxt",
];

pub fn is_ignored_dir_name(name: &str) -> bool {
    IGNORED_DIR_NAMES.contains(&name)
}

fn is_ignored_entry(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
        && entry
            .file_name()
            .to_str()
            .map(is_ignored_dir_name)
            .unwrap_or(false)
}

/// Count regular files under `root` that git would consider, skipping
/// ignored directories. Unreadable entries are skipped; an unreadable root
/// yields 0.
pub fn count_repository_files(root: &Path) -> usize {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .follow_links(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .filter_entry(|entry| !is_ignored_entry(entry));

    let count = builder
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .count();
    debug!(root = %root.display(), count, "Counted repository files");
    count
}

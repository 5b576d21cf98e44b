//! Change collection: which files differ from the base ref right now.
//!
//! Four git sources are merged in ascending priority (branch diff, working
//! tree, staged, untracked). A path seen by several sources keeps the highest
//! status. Every candidate passes the noise filter before it is recorded.

use super::diagnostics::{Degradation, Staged};
use super::hasher;
use super::types::{ChangeStatus, FileStub};
use crate::error::HandoffError;
use crate::git::{self, GitRunner};
use crate::scan::is_ignored_dir_name;
use crate::types::{normalize_rel_path, RelPath};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes inspected when deciding whether an unrecognized file is binary.
pub const BINARY_SNIFF_BYTES: u64 = 2048;

/// Build output, binaries, archives and media never belong in a handoff.
const DENIED_EXTENSIONS: &[&str] = &[
    "exe", "dll", "bin", "o", "a", "so", "dylib", "wasm", "class", "jar", "zip", "tar", "gz", "7z",
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "tiff", "mp3", "wav", "ogg", "mp4", "mov",
    "avi", "log", "out", "pdf", "ttf", "otf", "woff", "woff2",
];

/// Extensions trusted as text without opening the file.
const TEXT_EXTENSIONS: &[&str] = &[
    "rs", "go", "py", "js", "mjs", "cjs", "ts", "tsx", "jsx", "java", "kt", "kts", "scala", "c",
    "h", "cc", "cpp", "hpp", "cs", "rb", "php", "swift", "m", "lua", "sh", "bash", "zsh", "sql",
    "md", "txt", "rst", "json", "yaml", "yml", "toml", "ini", "cfg", "xml", "html", "css", "scss",
    "vue", "svelte", "mod", "sum", "lock", "proto", "graphql",
];

/// A changed path and the strongest source that reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedEntry {
    pub path: RelPath,
    pub status: ChangeStatus,
}

impl ChangedEntry {
    pub fn new(path: impl Into<RelPath>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Path to status map with upgrade-only merging.
#[derive(Debug, Default)]
struct ChangeSet {
    entries: BTreeMap<RelPath, ChangeStatus>,
}

impl ChangeSet {
    fn add(&mut self, root: &Path, raw: &str, status: ChangeStatus) {
        let path = normalize_rel_path(raw);
        if path.is_empty() || !include_changed_path(root, &path) {
            return;
        }
        self.entries
            .entry(path)
            .and_modify(|current| {
                if status > *current {
                    *current = status;
                }
            })
            .or_insert(status);
    }

    fn add_all(&mut self, root: &Path, lines: &[String], status: ChangeStatus) {
        for line in lines {
            self.add(root, line, status);
        }
    }

    fn into_entries(self) -> Vec<ChangedEntry> {
        self.entries
            .into_iter()
            .map(|(path, status)| ChangedEntry { path, status })
            .collect()
    }
}

/// Collect changed entries for `root` relative to `base_ref`, sorted by path.
///
/// Only a failed branch diff with nothing found elsewhere is an error; the
/// other sources are best-effort.
pub fn collect_changed_entries(
    git: &dyn GitRunner,
    root: &Path,
    base_ref: &str,
) -> Result<Vec<ChangedEntry>, HandoffError> {
    let mut set = ChangeSet::default();

    let branch_result = git::branch_diff(git, root, base_ref);
    if let Ok(lines) = &branch_result {
        set.add_all(root, lines, ChangeStatus::Branch);
    }

    let optional_sources: [(ChangeStatus, Result<Vec<String>, _>); 3] = [
        (ChangeStatus::Modified, git::working_tree_diff(git, root)),
        (ChangeStatus::Staged, git::staged_diff(git, root)),
        (ChangeStatus::Untracked, git::untracked_files(git, root)),
    ];
    for (status, result) in optional_sources {
        match result {
            Ok(lines) => set.add_all(root, &lines, status),
            Err(e) => debug!(status = status.as_str(), error = %e, "Skipping changed-file source"),
        }
    }

    match branch_result {
        Err(e) if set.entries.is_empty() => Err(HandoffError::ChangedFilesUnavailable(e)),
        Err(e) => {
            debug!(base_ref, error = %e, "Branch diff failed; using other sources");
            Ok(set.into_entries())
        }
        Ok(_) => Ok(set.into_entries()),
    }
}

/// Whether a normalized relative path is worth handing off.
pub fn include_changed_path(root: &Path, rel: &str) -> bool {
    if rel.is_empty() || has_ignored_component(rel) {
        return false;
    }
    match extension_of(rel) {
        Some(ext) if DENIED_EXTENSIONS.contains(&ext.as_str()) => false,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => true,
        _ => !is_likely_binary(&absolute(root, rel)),
    }
}

fn has_ignored_component(rel: &str) -> bool {
    rel.split('/').any(is_ignored_dir_name)
}

fn extension_of(rel: &str) -> Option<String> {
    Path::new(rel)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn absolute(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// A null byte in the first [`BINARY_SNIFF_BYTES`] marks a file as binary.
/// Missing files, directories, and empty files are not binary.
pub fn is_likely_binary(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) if meta.is_file() => {}
        _ => return false,
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut head = Vec::with_capacity(BINARY_SNIFF_BYTES as usize);
    if file.take(BINARY_SNIFF_BYTES).read_to_end(&mut head).is_err() {
        return false;
    }
    head.contains(&0)
}

/// Attach size and content hash to each selected entry.
///
/// Files deleted since collection get a bare stub. Any other read failure is
/// reported as a degradation and also leaves the stub bare.
pub fn build_file_stubs(root: &Path, entries: &[ChangedEntry]) -> Staged<Vec<FileStub>> {
    let mut degradations = Vec::new();
    let stubs = entries
        .iter()
        .map(|entry| {
            let mut stub = FileStub {
                path: entry.path.clone(),
                hash: None,
                size: None,
                status: Some(entry.status),
            };
            let path = absolute(root, &entry.path);
            match stat_and_hash(&path) {
                Ok(Some((size, hash))) => {
                    stub.size = Some(size);
                    stub.hash = Some(hash);
                }
                Ok(None) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(path = %entry.path, error = %e, "Could not stat changed file");
                    degradations.push(Degradation::FileUnreadable {
                        path: entry.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            stub
        })
        .collect();
    Staged {
        value: stubs,
        degradations,
    }
}

fn stat_and_hash(path: &Path) -> io::Result<Option<(u64, String)>> {
    let meta = path.metadata()?;
    if meta.is_dir() {
        return Ok(None);
    }
    let hash = hasher::file_sha256(path)?;
    Ok(Some((meta.len(), hash)))
}

//! Persistence of handoff artifacts under `<root>/.codemap/`.
//!
//! Every JSON file is written to a uniquely named temp file in the same
//! directory and renamed over the destination, so readers see either the old
//! or the new content. The metrics log is appended to and then trimmed to its
//! line cap.

use super::types::{Artifact, CacheMetrics, DeltaSnapshot, PrefixSnapshot};
use crate::concurrency::PathLockManager;
use crate::error::StorageError;
use crate::types::HexDigest;
use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const ARTIFACT_DIR: &str = ".codemap";
pub const LATEST_FILENAME: &str = "handoff.latest.json";
pub const PREFIX_FILENAME: &str = "handoff.prefix.json";
pub const DELTA_FILENAME: &str = "handoff.delta.json";
pub const METRICS_FILENAME: &str = "handoff.metrics.log";
pub const DEFAULT_MAX_METRICS_LINES: usize = 500;

/// One line of the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub generated_at: String,
    pub branch: String,
    pub base_ref: String,
    pub prefix_hash: HexDigest,
    pub delta_hash: HexDigest,
    pub combined_hash: HexDigest,
    pub metrics: CacheMetrics,
}

impl MetricsRecord {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            generated_at: artifact
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            branch: artifact.branch.clone(),
            base_ref: artifact.base_ref.clone(),
            prefix_hash: artifact.prefix_hash.clone(),
            delta_hash: artifact.delta_hash.clone(),
            combined_hash: artifact.combined_hash.clone(),
            metrics: artifact.metrics.clone(),
        }
    }
}

/// Reader and writer for the four persisted handoff files of one repository.
#[derive(Clone)]
pub struct HandoffStore {
    dir: PathBuf,
    max_metrics_lines: usize,
    locks: Arc<PathLockManager>,
}

impl HandoffStore {
    /// Store rooted at `<root>/.codemap`.
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join(ARTIFACT_DIR),
            max_metrics_lines: DEFAULT_MAX_METRICS_LINES,
            locks: PathLockManager::shared(),
        }
    }

    /// Cap the metrics log at `max` lines. Zero disables trimming.
    pub fn with_max_metrics_lines(mut self, max: usize) -> Self {
        self.max_metrics_lines = max;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILENAME)
    }

    pub fn prefix_path(&self) -> PathBuf {
        self.dir.join(PREFIX_FILENAME)
    }

    pub fn delta_path(&self) -> PathBuf {
        self.dir.join(DELTA_FILENAME)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.dir.join(METRICS_FILENAME)
    }

    /// The latest artifact, normalized. `None` when nothing was written yet.
    pub fn read_latest(&self) -> Result<Option<Artifact>, StorageError> {
        let artifact: Option<Artifact> = read_json(&self.latest_path())?;
        Ok(artifact.map(|mut artifact| {
            artifact.normalize();
            artifact
        }))
    }

    pub fn read_prefix(&self) -> Result<Option<PrefixSnapshot>, StorageError> {
        read_json(&self.prefix_path())
    }

    pub fn read_delta(&self) -> Result<Option<DeltaSnapshot>, StorageError> {
        read_json(&self.delta_path())
    }

    /// Metrics records, oldest first. With `limit`, only the most recent ones.
    /// Malformed lines are skipped.
    pub fn read_metrics(&self, limit: Option<usize>) -> Result<Vec<MetricsRecord>, StorageError> {
        let path = self.metrics_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let mut records: Vec<MetricsRecord> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping malformed metrics line");
                    None
                }
            })
            .collect();

        if let Some(limit) = limit {
            if records.len() > limit {
                records.drain(..records.len() - limit);
            }
        }
        Ok(records)
    }

    /// Normalize `artifact`, write the three JSON files, then append a metrics
    /// record.
    pub fn write_latest(&self, artifact: &mut Artifact) -> Result<(), StorageError> {
        artifact.normalize();

        fs::create_dir_all(&self.dir).map_err(|source| StorageError::WriteFailed {
            path: self.dir.clone(),
            source,
        })?;

        let lock = self.locks.get_lock(&self.dir);
        let _guard = lock.write();

        write_json_atomic(&self.latest_path(), &*artifact)?;
        write_json_atomic(&self.prefix_path(), &artifact.prefix)?;
        write_json_atomic(&self.delta_path(), &artifact.delta)?;
        self.append_metrics_locked(&MetricsRecord::from_artifact(artifact))?;

        debug!(
            dir = %self.dir.display(),
            combined_hash = %artifact.combined_hash,
            "Wrote handoff artifact"
        );
        Ok(())
    }

    /// Append one record to the metrics log and enforce the line cap.
    pub fn append_metrics(&self, record: &MetricsRecord) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::WriteFailed {
            path: self.dir.clone(),
            source,
        })?;
        let lock = self.locks.get_lock(&self.dir);
        let _guard = lock.write();
        self.append_metrics_locked(record)
    }

    fn append_metrics_locked(&self, record: &MetricsRecord) -> Result<(), StorageError> {
        let path = self.metrics_path();
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        file.write_all(&line)
            .map_err(|source| StorageError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        drop(file);

        self.trim_metrics(&path)
    }

    fn trim_metrics(&self, path: &Path) -> Result<(), StorageError> {
        if self.max_metrics_lines == 0 {
            return Ok(());
        }
        let content = fs::read_to_string(path)?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() <= self.max_metrics_lines {
            return Ok(());
        }

        let keep = &lines[lines.len() - self.max_metrics_lines..];
        let mut trimmed = keep.join("\n");
        trimmed.push('\n');
        write_bytes_atomic(path, trimmed.as_bytes())?;
        debug!(
            path = %path.display(),
            dropped = lines.len() - keep.len(),
            "Trimmed metrics log"
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::IoError(e)),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| StorageError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Pretty-print `value` and replace `path` atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    write_bytes_atomic(path, &data)
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    let write_failed = |source: io::Error| StorageError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(data).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

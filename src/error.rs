//! Error types for handoff building, persistence, and collaborator calls.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Failure of a single git invocation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} exited with {status}: {stderr}")]
    Failed {
        args: String,
        status: String,
        stderr: String,
    },
}

/// Failure of the dependency graph provider.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("dependency graph unavailable: {0}")]
    Unavailable(String),

    #[error("dependency graph build failed: {0}")]
    BuildFailed(String),
}

/// Errors surfaced to callers of the build pipeline and the detail resolver.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to compute changed files: {0}")]
    ChangedFilesUnavailable(#[source] GitError),

    #[error("failed to hash {snapshot} snapshot: {source}")]
    Hash {
        snapshot: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("handoff artifact is missing")]
    MissingArtifact,

    #[error("file path is required")]
    EmptyPath,

    #[error("file {0:?} was not found in current handoff delta")]
    FileNotInDelta(String),

    #[error("invalid repository root {path}: {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for HandoffError {
    fn from(err: config::ConfigError) -> Self {
        HandoffError::ConfigError(err.to_string())
    }
}

//! In-process serialization of artifact writes
//!
//! Renames keep every individual file consistent, but the metrics trim is a
//! read-modify-rewrite. Writers in the same process take a per-directory
//! write lock so two builds cannot interleave their trims. Readers never lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Per-path lock manager.
///
/// Different artifact directories proceed in parallel; writers to the same
/// directory are serialized.
pub struct PathLockManager {
    locks: Arc<RwLock<HashMap<PathBuf, Arc<RwLock<()>>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Manager shared by every store in this process.
    pub fn shared() -> Arc<PathLockManager> {
        static SHARED: OnceLock<Arc<PathLockManager>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(PathLockManager::new())).clone()
    }

    /// Get or create the lock for `path`.
    pub fn get_lock(&self, path: &Path) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        // Another thread may have inserted it between the two locks.
        let mut map = self.locks.write();
        map.entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}

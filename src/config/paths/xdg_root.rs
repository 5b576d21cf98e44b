//! XDG Base Directory lookups for config files.

use crate::handoff::storage::ARTIFACT_DIR;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.toml";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_home() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/codemap/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|home| home.join("codemap").join(CONFIG_FILENAME))
}

/// `<root>/.codemap/config.toml`
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(ARTIFACT_DIR).join(CONFIG_FILENAME)
}

//! Configuration
//!
//! Layered settings for the handoff pipeline, loaded with the `config` crate.
//! Precedence (lowest to highest): built-in defaults, the global file
//! `$XDG_CONFIG_HOME/codemap/config.toml`, the workspace file
//! `<root>/.codemap/config.toml`, then `CODEMAP__<SECTION>__<KEY>` variables.

mod duration;
mod facade;
pub mod merge {
    pub(crate) mod policy;
    pub mod service;
}
pub mod paths {
    pub mod xdg_root;
}
pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub use duration::{format_duration, parse_duration};
pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::handoff::storage::DEFAULT_MAX_METRICS_LINES;
use crate::handoff::types::DEFAULT_SINCE;
use crate::handoff::BuildOptions;
use crate::limits::RepoSizeLimits;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandoffConfig {
    #[serde(default)]
    pub handoff: HandoffSettings,
    #[serde(default)]
    pub limits: RepoSizeLimits,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_since() -> String {
    format_duration(DEFAULT_SINCE)
}

/// Build defaults. Budget caps left unset follow the repository size tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffSettings {
    /// Base ref for the branch diff. Unset means the first of `main`,
    /// `master` that exists, else `HEAD`.
    #[serde(default)]
    pub base_ref: Option<String>,

    /// Timeline lookback such as `30m`, `6h`, or `2d`.
    #[serde(default = "default_since")]
    pub since: String,

    #[serde(default)]
    pub max_changed: Option<usize>,
    #[serde(default)]
    pub max_risk: Option<usize>,
    #[serde(default)]
    pub max_events: Option<usize>,
    #[serde(default)]
    pub max_hubs: Option<usize>,
}

impl Default for HandoffSettings {
    fn default() -> Self {
        Self {
            base_ref: None,
            since: default_since(),
            max_changed: None,
            max_risk: None,
            max_events: None,
            max_hubs: None,
        }
    }
}

impl HandoffSettings {
    pub fn since_duration(&self) -> Result<Duration, crate::error::HandoffError> {
        parse_duration(&self.since)
    }

    /// Build options seeded from these settings.
    pub fn build_options(&self) -> Result<BuildOptions, crate::error::HandoffError> {
        Ok(BuildOptions {
            base_ref: self.base_ref.clone(),
            since: Some(self.since_duration()?),
            max_changed: self.max_changed,
            max_risk: self.max_risk,
            max_events: self.max_events,
            max_hubs: self.max_hubs,
            state: None,
            previous: None,
        })
    }
}

fn default_max_metrics_lines() -> usize {
    DEFAULT_MAX_METRICS_LINES
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Line cap for `handoff.metrics.log`; 0 disables trimming.
    #[serde(default = "default_max_metrics_lines")]
    pub max_metrics_lines: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_metrics_lines: default_max_metrics_lines(),
        }
    }
}

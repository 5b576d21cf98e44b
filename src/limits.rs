//! Repository size tiers and the handoff budget profile for each tier.
//!
//! Larger repositories get stricter caps so the artifact stays small enough to
//! hand to another agent without blowing its context window.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MEDIUM_REPO_FILE_COUNT: usize = 2000;
pub const DEFAULT_LARGE_REPO_FILE_COUNT: usize = 5000;
pub const DEFAULT_STATE_FRESHNESS_SECS: u64 = 30;

fn default_medium() -> usize {
    DEFAULT_MEDIUM_REPO_FILE_COUNT
}

fn default_large() -> usize {
    DEFAULT_LARGE_REPO_FILE_COUNT
}

fn default_freshness() -> u64 {
    DEFAULT_STATE_FRESHNESS_SECS
}

/// Repo-size thresholds used to scale expensive analysis work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSizeLimits {
    /// Repositories above this file count use the medium budget.
    #[serde(default = "default_medium")]
    pub medium_repo_file_count: usize,

    /// Repositories above this file count use the large budget and skip
    /// fresh dependency graph builds.
    #[serde(default = "default_large")]
    pub large_repo_file_count: usize,

    /// Live state older than this many seconds is treated as absent.
    #[serde(default = "default_freshness")]
    pub state_freshness_secs: u64,
}

impl Default for RepoSizeLimits {
    fn default() -> Self {
        Self {
            medium_repo_file_count: default_medium(),
            large_repo_file_count: default_large(),
            state_freshness_secs: default_freshness(),
        }
    }
}

impl RepoSizeLimits {
    /// Whether a fresh dependency graph build would be too expensive.
    pub fn exceeds_graph_guard(&self, file_count: usize) -> bool {
        file_count > self.large_repo_file_count
    }
}

/// Repository size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoTier {
    Small,
    Medium,
    Large,
}

impl RepoTier {
    /// Classify a repository by file count. An unknown count (0) is small.
    pub fn for_file_count(file_count: usize, limits: &RepoSizeLimits) -> Self {
        if file_count > limits.large_repo_file_count {
            RepoTier::Large
        } else if file_count > limits.medium_repo_file_count {
            RepoTier::Medium
        } else {
            RepoTier::Small
        }
    }

    pub fn budget(self) -> BudgetProfile {
        match self {
            RepoTier::Large => BudgetProfile {
                max_changed: 25,
                max_risk: 8,
                max_events: 10,
                max_hubs: 8,
            },
            RepoTier::Medium => BudgetProfile {
                max_changed: 40,
                max_risk: 10,
                max_events: 15,
                max_hubs: 10,
            },
            RepoTier::Small => BudgetProfile {
                max_changed: 60,
                max_risk: 15,
                max_events: 25,
                max_hubs: 15,
            },
        }
    }
}

/// List-size caps applied to one handoff build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetProfile {
    pub max_changed: usize,
    pub max_risk: usize,
    pub max_events: usize,
    pub max_hubs: usize,
}

impl BudgetProfile {
    /// Budget for a repository of the given size.
    pub fn for_repo(file_count: usize, limits: &RepoSizeLimits) -> Self {
        RepoTier::for_file_count(file_count, limits).budget()
    }

    /// Replace caps with caller overrides. `None` and `Some(0)` keep the tier default.
    pub fn with_overrides(
        mut self,
        max_changed: Option<usize>,
        max_risk: Option<usize>,
        max_events: Option<usize>,
        max_hubs: Option<usize>,
    ) -> Self {
        fn pick(value: Option<usize>, fallback: usize) -> usize {
            value.filter(|v| *v > 0).unwrap_or(fallback)
        }
        self.max_changed = pick(max_changed, self.max_changed);
        self.max_risk = pick(max_risk, self.max_risk);
        self.max_events = pick(max_events, self.max_events);
        self.max_hubs = pick(max_hubs, self.max_hubs);
        self
    }
}

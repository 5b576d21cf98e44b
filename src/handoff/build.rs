//! Build orchestration.
//!
//! One call runs the whole pipeline on the caller's thread: resolve inputs,
//! collect and rank changes, assemble both snapshot layers, hash them, and
//! compare against the previous artifact. Nothing is written here; callers
//! hand the result to [`HandoffStore::write_latest`](super::storage::HandoffStore::write_latest).

use super::collect::{self, ChangedEntry};
use super::diagnostics::{Degradation, Staged};
use super::guidance::{derive_guidance, GuidanceInputs};
use super::hasher::{self, CanonicalDigest};
use super::rank;
use super::storage::HandoffStore;
use super::timeline;
use super::types::{
    Artifact, CacheMetrics, DeltaSnapshot, PrefixSnapshot, DEFAULT_SINCE, SCHEMA_VERSION,
};
use crate::error::HandoffError;
use crate::git::{self, GitCli, GitRunner};
use crate::graph::{DependencyGraph, DependencyGraphProvider, NoGraphProvider};
use crate::limits::{BudgetProfile, RepoSizeLimits};
use crate::scan;
use crate::types::RelPath;
use crate::watch::LiveState;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-build options. Unset fields fall back to defaults and the size-tiered
/// budget.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub base_ref: Option<String>,
    pub since: Option<Duration>,
    pub max_changed: Option<usize>,
    pub max_risk: Option<usize>,
    pub max_events: Option<usize>,
    pub max_hubs: Option<usize>,
    /// Live daemon state. When absent the state file is re-read.
    pub state: Option<LiveState>,
    /// Comparison target for cache metrics. When absent the persisted latest
    /// artifact is used.
    pub previous: Option<Artifact>,
}

/// Options after defaults and the budget have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedOptions {
    base_ref: String,
    since: Duration,
    budget: BudgetProfile,
}

impl ResolvedOptions {
    /// `default_base_ref` runs only when no base ref was given.
    fn resolve(
        options: &BuildOptions,
        default_base_ref: impl FnOnce() -> String,
        file_count: usize,
        limits: &RepoSizeLimits,
    ) -> Self {
        let base_ref = options
            .base_ref
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_base_ref);
        let since = options
            .since
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_SINCE);
        let budget = BudgetProfile::for_repo(file_count, limits).with_overrides(
            options.max_changed,
            options.max_risk,
            options.max_events,
            options.max_hubs,
        );
        Self {
            base_ref,
            since,
            budget,
        }
    }
}

/// Assembles handoff artifacts for repository roots.
#[derive(Clone)]
pub struct HandoffBuilder {
    git: Arc<dyn GitRunner>,
    graph: Arc<dyn DependencyGraphProvider>,
    limits: RepoSizeLimits,
}

impl Default for HandoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HandoffBuilder {
    /// Builder using the `git` binary and no dependency graph provider.
    pub fn new() -> Self {
        Self {
            git: Arc::new(GitCli::new()),
            graph: Arc::new(NoGraphProvider),
            limits: RepoSizeLimits::default(),
        }
    }

    pub fn with_git(mut self, git: Arc<dyn GitRunner>) -> Self {
        self.git = git;
        self
    }

    pub fn with_graph_provider(mut self, graph: Arc<dyn DependencyGraphProvider>) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_limits(mut self, limits: RepoSizeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &RepoSizeLimits {
        &self.limits
    }

    pub fn graph_provider(&self) -> Arc<dyn DependencyGraphProvider> {
        self.graph.clone()
    }

    pub fn build(&self, root: &Path, options: BuildOptions) -> Result<Artifact, HandoffError> {
        self.build_at(root, options, Utc::now())
    }

    /// Build with an explicit clock reading for the timeline window and the
    /// artifact timestamp.
    pub fn build_at(
        &self,
        root: &Path,
        options: BuildOptions,
        now: DateTime<Utc>,
    ) -> Result<Artifact, HandoffError> {
        let root = resolve_root(root)?;
        let mut degradations: Vec<Degradation> = Vec::new();

        let state = options
            .state
            .clone()
            .or_else(|| LiveState::read(&root, self.freshness()));
        let file_count = resolve_file_count(&root, state.as_ref());
        let resolved = ResolvedOptions::resolve(
            &options,
            || git::resolve_base_ref(self.git.as_ref(), &root),
            file_count,
            &self.limits,
        );
        let budget = resolved.budget;
        debug!(
            root = %root.display(),
            base_ref = %resolved.base_ref,
            file_count,
            has_state = state.is_some(),
            ?budget,
            "Resolved handoff inputs"
        );

        let branch = match git::current_branch(self.git.as_ref(), &root) {
            Ok(branch) => branch,
            Err(e) => {
                warn!(error = %e, "Could not resolve current branch");
                degradations.push(Degradation::BranchUnavailable);
                String::new()
            }
        };

        let recent_events = timeline::summarize_events(
            state.as_ref(),
            resolved.since,
            budget.max_events,
            now,
        );

        let mut entries =
            match collect::collect_changed_entries(self.git.as_ref(), &root, &resolved.base_ref) {
                Ok(entries) => entries,
                Err(e) if !recent_events.is_empty() => {
                    warn!(error = %e, "Git change sources failed; using timeline only");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
        if entries.is_empty() && !recent_events.is_empty() {
            entries = timeline::changed_from_events(&recent_events);
            debug!(count = entries.len(), "Derived changed paths from timeline");
        }
        let changed_all: Vec<RelPath> = entries.iter().map(|e| e.path.clone()).collect();

        let graph = resolve_dependency_graph(
            &root,
            state.as_ref(),
            file_count,
            self.graph.as_ref(),
            &self.limits,
        )
        .drain_into(&mut degradations);
        let has_dependency_context = !graph.is_empty();
        let importers = graph.importers;

        let risk_files = rank::summarize_risk_files(&changed_all, &importers, budget.max_risk);
        let selected =
            rank::prioritize_changed_paths(&changed_all, &risk_files, budget.max_changed);
        let selected_entries: Vec<ChangedEntry> = rank::select_entries(&entries, &selected);
        let changed_stubs =
            collect::build_file_stubs(&root, &selected_entries).drain_into(&mut degradations);
        let hubs = rank::summarize_hubs(&importers, budget.max_hubs);

        let guidance = GuidanceInputs {
            base_ref: &resolved.base_ref,
            changed: &selected,
            risk: &risk_files,
            events: &recent_events,
            has_state: state.is_some(),
            has_dependency_context,
        };
        let (next_steps, open_questions) = derive_guidance(&guidance, &degradations);

        let prefix = PrefixSnapshot { file_count, hubs };
        let delta = DeltaSnapshot {
            changed: changed_stubs,
            risk_files,
            recent_events,
            next_steps,
            open_questions,
        };

        let prefix_digest = hasher::hash_canonical(&prefix).map_err(|source| {
            HandoffError::Hash {
                snapshot: "prefix",
                source,
            }
        })?;
        let delta_digest = hasher::hash_canonical(&delta).map_err(|source| HandoffError::Hash {
            snapshot: "delta",
            source,
        })?;
        let combined_hash = hasher::combined_hash(&prefix_digest.hash, &delta_digest.hash);

        let previous = options.previous.or_else(|| read_previous(&root));
        let metrics = compute_cache_metrics(previous.as_ref(), &prefix_digest, &delta_digest);
        let generated_at = match &previous {
            Some(prev)
                if prev.prefix_hash == prefix_digest.hash
                    && prev.delta_hash == delta_digest.hash
                    && prev.has_timestamp() =>
            {
                prev.generated_at
            }
            _ => now,
        };

        let mut artifact = Artifact {
            schema_version: SCHEMA_VERSION,
            generated_at,
            root: root.display().to_string(),
            branch,
            base_ref: resolved.base_ref,
            prefix,
            delta,
            prefix_hash: prefix_digest.hash,
            delta_hash: delta_digest.hash,
            combined_hash,
            metrics,
            ..Default::default()
        };
        artifact.sync_legacy_mirror();

        info!(
            combined_hash = %artifact.combined_hash,
            changed = artifact.delta.changed.len(),
            risk = artifact.delta.risk_files.len(),
            hubs = artifact.prefix.hubs.len(),
            reuse_ratio = artifact.metrics.reuse_ratio,
            open_questions = artifact.delta.open_questions.len(),
            "Built handoff artifact"
        );
        Ok(artifact)
    }

    fn freshness(&self) -> Duration {
        Duration::from_secs(self.limits.state_freshness_secs)
    }
}

pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf, HandoffError> {
    dunce::canonicalize(root).map_err(|source| HandoffError::InvalidRoot {
        path: root.to_path_buf(),
        source,
    })
}

/// Daemon file count when known, otherwise a directory walk.
pub(crate) fn resolve_file_count(root: &Path, state: Option<&LiveState>) -> usize {
    match state {
        Some(state) if state.file_count > 0 => state.file_count,
        _ => scan::count_repository_files(root),
    }
}

/// Importers and imports from live state, or a fresh graph when the
/// repository is small enough. Empty maps mean no dependency context.
pub(crate) fn resolve_dependency_graph(
    root: &Path,
    state: Option<&LiveState>,
    file_count: usize,
    provider: &dyn DependencyGraphProvider,
    limits: &RepoSizeLimits,
) -> Staged<DependencyGraph> {
    if let Some(state) = state.filter(|s| s.has_dependency_context()) {
        return Staged::clean(DependencyGraph {
            importers: state.importers.clone(),
            imports: state.imports.clone(),
        });
    }

    if limits.exceeds_graph_guard(file_count) {
        debug!(
            file_count,
            threshold = limits.large_repo_file_count,
            "Skipping dependency graph build for large repository"
        );
        return Staged::degraded(
            DependencyGraph::default(),
            Degradation::DependencyContextUnavailable,
        );
    }

    match provider.build_graph(root) {
        Ok(graph) => Staged::clean(graph),
        Err(e) => {
            debug!(error = %e, "Dependency graph unavailable");
            Staged::degraded(
                DependencyGraph::default(),
                Degradation::DependencyContextUnavailable,
            )
        }
    }
}

fn read_previous(root: &Path) -> Option<Artifact> {
    match HandoffStore::new(root).read_latest() {
        Ok(previous) => previous,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable previous handoff artifact");
            None
        }
    }
}

/// Reuse metrics of the new layers against `previous`.
pub fn compute_cache_metrics(
    previous: Option<&Artifact>,
    prefix: &CanonicalDigest,
    delta: &CanonicalDigest,
) -> CacheMetrics {
    let total_bytes = prefix.bytes + delta.bytes;
    let mut metrics = CacheMetrics {
        prefix_bytes: prefix.bytes,
        delta_bytes: delta.bytes,
        total_bytes,
        ..Default::default()
    };
    let previous = match previous {
        Some(previous) => previous,
        None => return metrics,
    };

    if !previous.combined_hash.is_empty() {
        metrics.previous_combined_hash = Some(previous.combined_hash.clone());
    }
    if !prefix.hash.is_empty() && previous.prefix_hash == prefix.hash {
        metrics.prefix_reused = true;
        metrics.unchanged_bytes += prefix.bytes;
    }
    if !delta.hash.is_empty() && previous.delta_hash == delta.hash {
        metrics.delta_reused = true;
        metrics.unchanged_bytes += delta.bytes;
    }
    if total_bytes > 0 {
        metrics.reuse_ratio = metrics.unchanged_bytes as f64 / total_bytes as f64;
    }
    metrics
}

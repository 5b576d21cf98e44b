//! On-demand dependency context for one changed file.

use super::build::{resolve_dependency_graph, resolve_file_count};
use super::timeline::events_for_path;
use super::types::{Artifact, FileDetail, HUB_IMPORTER_THRESHOLD};
use crate::error::HandoffError;
use crate::graph::{DependencyGraphProvider, NoGraphProvider};
use crate::limits::RepoSizeLimits;
use crate::types::{normalize_rel_path, RelPath};
use crate::watch::LiveState;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Expands a file stub from a built artifact into a [`FileDetail`].
#[derive(Clone)]
pub struct DetailResolver {
    graph: Arc<dyn DependencyGraphProvider>,
    limits: RepoSizeLimits,
}

impl Default for DetailResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoGraphProvider), RepoSizeLimits::default())
    }
}

impl DetailResolver {
    pub fn new(graph: Arc<dyn DependencyGraphProvider>, limits: RepoSizeLimits) -> Self {
        Self { graph, limits }
    }

    /// Resolve `target` against the artifact's delta.
    ///
    /// Dependency lists come from `state` when it carries graph data, else from
    /// a fresh graph if the repository is under the size guard, else they are
    /// empty. Without `state` the daemon state file under the artifact root is
    /// re-read.
    ///
    /// `is_hub` is recomputed from the resolved importers and can disagree with
    /// the artifact's own risk/hub lists when the two used different sources.
    pub fn resolve(
        &self,
        artifact: &Artifact,
        target: &str,
        state: Option<LiveState>,
    ) -> Result<FileDetail, HandoffError> {
        let target = normalize_rel_path(target);
        if target.is_empty() {
            return Err(HandoffError::EmptyPath);
        }

        let mut artifact = artifact.clone();
        artifact.normalize();
        let stub = artifact
            .find_changed(&target)
            .cloned()
            .ok_or_else(|| HandoffError::FileNotInDelta(target.clone()))?;

        let root = Path::new(&artifact.root);
        let state = state.or_else(|| {
            LiveState::read(root, Duration::from_secs(self.limits.state_freshness_secs))
        });
        let file_count = resolve_file_count(root, state.as_ref());
        let graph = resolve_dependency_graph(
            root,
            state.as_ref(),
            file_count,
            self.graph.as_ref(),
            &self.limits,
        );
        if !graph.degradations.is_empty() {
            debug!(path = %target, "Resolving detail without dependency context");
        }
        let graph = graph.value;

        let importers = unique_sorted(graph.importers.get(&target));
        let imports = unique_sorted(graph.imports.get(&target));
        let is_hub = importers.len() >= HUB_IMPORTER_THRESHOLD;

        Ok(FileDetail {
            path: stub.path,
            hash: stub.hash,
            size: stub.size,
            status: stub.status,
            importers,
            imports,
            recent_events: events_for_path(&artifact.delta.recent_events, &target),
            is_hub,
        })
    }
}

fn unique_sorted(items: Option<&Vec<RelPath>>) -> Vec<RelPath> {
    items
        .into_iter()
        .flatten()
        .filter(|item| !item.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

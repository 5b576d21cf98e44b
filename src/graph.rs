//! Dependency graph collaborator.
//!
//! Building an import graph is somebody else's job; the handoff pipeline only
//! consumes the resulting adjacency maps and treats a failed build as absent.

use crate::error::GraphError;
use crate::types::AdjacencyMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-level import graph for one repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// file -> files that import it
    #[serde(default)]
    pub importers: AdjacencyMap,
    /// file -> files it imports
    #[serde(default)]
    pub imports: AdjacencyMap,
}

impl DependencyGraph {
    pub fn is_empty(&self) -> bool {
        self.importers.is_empty() && self.imports.is_empty()
    }
}

/// Produces a dependency graph for a repository root on demand.
pub trait DependencyGraphProvider: Send + Sync {
    fn build_graph(&self, root: &Path) -> Result<DependencyGraph, GraphError>;
}

/// Provider used when no graph builder is wired in.
#[derive(Debug, Clone, Default)]
pub struct NoGraphProvider;

impl DependencyGraphProvider for NoGraphProvider {
    fn build_graph(&self, root: &Path) -> Result<DependencyGraph, GraphError> {
        Err(GraphError::Unavailable(format!(
            "no dependency graph provider configured for {}",
            root.display()
        )))
    }
}

/// A graph computed ahead of time serves every root it is asked about.
impl DependencyGraphProvider for DependencyGraph {
    fn build_graph(&self, _root: &Path) -> Result<DependencyGraph, GraphError> {
        Ok(self.clone())
    }
}

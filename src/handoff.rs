//! Handoff artifact pipeline.
//!
//! Builds a layered, content-addressed summary of the current working session
//! so another agent can pick up where this one stopped. The prefix layer holds
//! repository shape, the delta layer holds the session itself.

pub mod build;
pub mod collect;
pub mod detail;
pub mod diagnostics;
pub mod guidance;
pub mod hasher;
pub mod rank;
pub mod storage;
pub mod timeline;
pub mod types;

pub use build::{compute_cache_metrics, BuildOptions, HandoffBuilder};
pub use detail::DetailResolver;
pub use diagnostics::{Degradation, Staged};
pub use storage::{HandoffStore, MetricsRecord};
pub use types::{
    Artifact, CacheMetrics, ChangeStatus, DeltaSnapshot, EventSummary, FileDetail, FileStub,
    HubSummary, PrefixSnapshot, RiskFile,
};

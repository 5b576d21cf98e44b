//! Codemap Handoff: cacheable snapshots of in-progress work
//!
//! Builds a layered handoff artifact for a git repository: a stable prefix
//! (repository shape, hub files) and a volatile delta (changed files, risk
//! files, recent timeline, guidance). Each layer is content-hashed so repeated
//! builds can tell what actually changed, and the result is persisted
//! atomically under `<root>/.codemap/`.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod handoff;
pub mod limits;
pub mod logging;
pub mod scan;
pub mod tooling;
pub mod types;
pub mod watch;

pub use error::HandoffError;
pub use handoff::{Artifact, BuildOptions, DetailResolver, HandoffBuilder, HandoffStore};

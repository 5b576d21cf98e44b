//! Tooling & Integration Layer
//!
//! Command-line front end for building and inspecting handoff artifacts.

pub mod cli;

pub use cli::{ArtifactPart, Cli, CliContext, Commands};

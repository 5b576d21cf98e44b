//! CLI Tooling
//!
//! Thin command-line front end over the handoff pipeline. Every command prints
//! JSON on stdout; logs go to stderr or a file.

use crate::config::{parse_duration, ConfigLoader, HandoffConfig};
use crate::error::HandoffError;
use crate::handoff::{BuildOptions, DetailResolver, HandoffBuilder, HandoffStore};
use crate::logging::LoggingConfig;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Codemap handoff CLI - cacheable snapshots of in-progress work
#[derive(Parser)]
#[command(name = "codemap-handoff")]
#[command(about = "Build and inspect handoff artifacts for a git repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging config from the loaded configuration with CLI flags applied.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a handoff artifact and print it
    Build {
        /// Base ref for the branch diff (default from config, else main, master, or HEAD)
        #[arg(long)]
        base_ref: Option<String>,
        /// Timeline lookback, e.g. 30m, 6h, 2d
        #[arg(long)]
        since: Option<String>,
        /// Maximum changed files
        #[arg(long)]
        max_changed: Option<usize>,
        /// Maximum risk files
        #[arg(long)]
        max_risk: Option<usize>,
        /// Maximum timeline events
        #[arg(long)]
        max_events: Option<usize>,
        /// Maximum hub files
        #[arg(long)]
        max_hubs: Option<usize>,
        /// Print without persisting to .codemap/
        #[arg(long)]
        no_write: bool,
    },
    /// Print a persisted artifact part
    Show {
        #[arg(long, value_enum, default_value = "latest")]
        part: ArtifactPart,
    },
    /// Resolve dependency context for one changed file
    Detail {
        /// Repository-relative path of a file in the current delta
        path: String,
    },
    /// Print recent metrics log records
    Metrics {
        /// Number of most recent records
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactPart {
    Latest,
    Prefix,
    Delta,
}

/// CLI context for command execution
pub struct CliContext {
    workspace_root: PathBuf,
    config: HandoffConfig,
    builder: HandoffBuilder,
    store: HandoffStore,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Result<Self, HandoffError> {
        let config = match &config_path {
            Some(cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config))
    }

    /// Context over an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: HandoffConfig) -> Self {
        let builder = HandoffBuilder::new().with_limits(config.limits);
        let store = HandoffStore::new(&workspace_root)
            .with_max_metrics_lines(config.storage.max_metrics_lines);
        Self {
            workspace_root,
            config,
            builder,
            store,
        }
    }

    /// Replace the pipeline builder (custom git runner or graph provider).
    pub fn with_builder(mut self, builder: HandoffBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Execute a CLI command and return its JSON output.
    pub fn execute(&self, command: &Commands) -> Result<String, HandoffError> {
        match command {
            Commands::Build {
                base_ref,
                since,
                max_changed,
                max_risk,
                max_events,
                max_hubs,
                no_write,
            } => {
                let mut options = self.config.handoff.build_options()?;
                if let Some(base_ref) = base_ref {
                    options.base_ref = Some(base_ref.clone());
                }
                if let Some(since) = since {
                    options.since = Some(parse_duration(since)?);
                }
                options.max_changed = max_changed.or(options.max_changed);
                options.max_risk = max_risk.or(options.max_risk);
                options.max_events = max_events.or(options.max_events);
                options.max_hubs = max_hubs.or(options.max_hubs);
                self.handle_build(options, *no_write)
            }
            Commands::Show { part } => self.handle_show(*part),
            Commands::Detail { path } => self.handle_detail(path),
            Commands::Metrics { limit } => to_json(&self.store.read_metrics(Some(*limit))?),
        }
    }

    fn handle_build(&self, options: BuildOptions, no_write: bool) -> Result<String, HandoffError> {
        let mut artifact = self.builder.build(&self.workspace_root, options)?;
        if !no_write {
            let store = HandoffStore::new(Path::new(&artifact.root))
                .with_max_metrics_lines(self.config.storage.max_metrics_lines);
            store.write_latest(&mut artifact)?;
            info!(
                path = %store.latest_path().display(),
                combined_hash = %artifact.combined_hash,
                "Persisted handoff artifact"
            );
        }
        to_json(&artifact)
    }

    fn handle_show(&self, part: ArtifactPart) -> Result<String, HandoffError> {
        match part {
            ArtifactPart::Latest => to_json(&self.require(self.store.read_latest()?)?),
            ArtifactPart::Prefix => to_json(&self.require(self.store.read_prefix()?)?),
            ArtifactPart::Delta => to_json(&self.require(self.store.read_delta()?)?),
        }
    }

    fn handle_detail(&self, path: &str) -> Result<String, HandoffError> {
        let mut artifact = self.require(self.store.read_latest()?)?;
        if artifact.root.is_empty() {
            artifact.root = self.workspace_root.display().to_string();
        }
        let resolver = DetailResolver::new(self.builder.graph_provider(), *self.builder.limits());
        to_json(&resolver.resolve(&artifact, path, None)?)
    }

    fn require<T>(&self, value: Option<T>) -> Result<T, HandoffError> {
        value.ok_or(HandoffError::MissingArtifact)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HandoffError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| HandoffError::StorageError(crate::error::StorageError::Serialization(e)))
}

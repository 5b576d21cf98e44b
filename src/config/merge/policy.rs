//! Merge policy: the built-in defaults every other source layers over.

use crate::config::HandoffConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `HandoffConfig::default()`.
pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&HandoffConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

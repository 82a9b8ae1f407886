//! Checker configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest search accepted by [`CheckConfig::validate`].
pub const MAX_DEPTH: usize = 64;

/// Errors loading a [`CheckConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How properties are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Size bound passed to every strategy.
    pub depth: usize,

    /// Stop a property set at its first failing property.
    pub fail_fast: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            fail_fast: true,
        }
    }
}

impl CheckConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the search depth.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets whether a suite stops at its first failing property.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth > MAX_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "depth {} exceeds maximum {}",
                self.depth, MAX_DEPTH
            )));
        }
        Ok(())
    }
}

//! Demo runner configuration.
//!
//! Loaded from a TOML file, then overridden by CLI arguments.

use std::path::Path;

use clap::ValueEnum;
use depthcheck_checker::CheckConfig;
use serde::{Deserialize, Serialize};

/// Demo runner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Search settings shared by every suite.
    pub check: CheckConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event, with the suite span attached.
    Json,
}

/// Logging of the checker crates while suites run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the workspace crates; dependencies stay at `warn`.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl DemoConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(depth) = args.depth {
            self.check.depth = depth;
        }

        if args.keep_going {
            self.check.fail_fast = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        if let Some(format) = args.log_format {
            self.logging.format = format;
        }
    }

    /// Rejects unknown log levels and depths past the checker's limit.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        self.check.validate()?;
        Ok(())
    }
}

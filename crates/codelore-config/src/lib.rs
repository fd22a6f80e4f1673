//! CodeLore Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.codelore/config.toml`
//! - Local config: `.codelore/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use codelore_core::GraphRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for CodeLore.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoreConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Graph construction rules (`[graph]`)
    ///
    /// ```toml
    /// [graph]
    /// test_command = "pnpm vitest run {path}"
    /// test_markers = [".test", ".spec"]
    /// min_module_members = 3
    /// ```
    pub graph: GraphRules,

    /// Concurrency limits
    pub limits: LimitsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage configuration for the node store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for CodeLore data (default: `.codelore`)
    pub lore_dir: PathBuf,

    /// SQLite database file name inside `lore_dir`
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lore_dir: PathBuf::from(".codelore"),
            database: "graph.db".to_string(),
        }
    }
}

/// Concurrency limits for expensive async work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrently running tasks (fact loading)
    pub max_concurrent: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Accepted values for `logging.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level
    pub log_level: Option<String>,

    /// Override concurrency limit
    pub max_concurrent: Option<usize>,

    /// Override the test-runner template
    pub test_command: Option<String>,
}

impl LoreConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }

        if let Some(max_concurrent) = overrides.max_concurrent {
            self.limits.max_concurrent = max_concurrent;
        }

        if let Some(ref command) = overrides.test_command {
            self.graph.test_command = command.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graph.validate().map_err(ConfigError::invalid_rules)?;

        if self.limits.max_concurrent == 0 {
            return Err(ConfigError::invalid_value(
                "limits.max_concurrent",
                "must be at least 1",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}'. Valid values: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        if self.storage.database.is_empty() {
            return Err(ConfigError::invalid_value(
                "storage.database",
                "file name must not be empty",
            ));
        }

        Ok(())
    }

    /// Get the effective CodeLore directory for a workspace.
    pub fn lore_dir(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.lore_dir.is_absolute() {
            self.storage.lore_dir.clone()
        } else {
            workspace_root.join(&self.storage.lore_dir)
        }
    }

    /// Get the node store database path for a workspace.
    pub fn database_path(&self, workspace_root: &Path) -> PathBuf {
        self.lore_dir(workspace_root).join(&self.storage.database)
    }
}

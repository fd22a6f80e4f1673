//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.codelore/config.toml`
//! 2. Local config: `.codelore/config.toml` (in workspace)
//! 3. CLI overrides
//!
//! Layers are merged as TOML tables before decoding: a key present in a later
//! layer always wins, even when it spells out the default value. Nested tables
//! merge key by key; arrays and scalars are replaced.

use crate::error::ConfigError;
use crate::{ConfigOverrides, LoreConfig};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".codelore";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".codelore";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.codelore`)
    global_config_dir: Option<PathBuf>,

    /// Cached global layer
    global_layer: Option<Table>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.codelore`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_layer: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_layer: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a workspace.
    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a workspace with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates
    /// the result.
    pub fn load(
        &mut self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<LoreConfig, ConfigError> {
        let mut merged = Table::new();

        if let Some(global) = self.global_layer()? {
            merge_layer(&mut merged, global);
        }

        if let Some(local) = self.local_layer(workspace_root)? {
            merge_layer(&mut merged, local);
        }

        finish(merged, overrides)
    }

    /// Load configuration from one explicit file, with optional CLI overrides.
    ///
    /// Global and local files are not consulted.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<LoreConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        finish(read_layer(path)?, overrides)
    }

    /// Load only the global configuration, on top of defaults.
    pub fn load_global(&mut self) -> Result<Option<LoreConfig>, ConfigError> {
        self.global_layer()?.map(decode).transpose()
    }

    /// Load only the local configuration for a workspace, on top of defaults.
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<LoreConfig>, ConfigError> {
        self.local_layer(workspace_root)?.map(decode).transpose()
    }

    /// Save configuration to the local config file for a workspace.
    pub fn save_local(&self, workspace_root: &Path, config: &LoreConfig) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(workspace_root);
        save_config_file(&local_path, config)
    }

    /// Initialize local configuration for a workspace.
    ///
    /// Creates `.codelore/config.toml` with default configuration. An
    /// existing file is left untouched.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        let config_path = self.local_config_path(workspace_root);
        if !config_path.exists() {
            save_config_file(&config_path, &LoreConfig::default())?;
        }

        Ok(config_path)
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_layer = None;
    }

    fn global_layer(&mut self) -> Result<Option<Table>, ConfigError> {
        if let Some(ref layer) = self.global_layer {
            return Ok(Some(layer.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let layer = read_layer(&global_path)?;
        self.global_layer = Some(layer.clone());

        Ok(Some(layer))
    }

    fn local_layer(&self, workspace_root: &Path) -> Result<Option<Table>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        read_layer(&local_path).map(Some)
    }
}

/// Read one config file as a raw TOML table.
///
/// The layer is also decoded once on its own so that type errors are reported
/// against the file they come from.
fn read_layer(path: &Path) -> Result<Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
    let layer: Table = toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))?;

    Value::Table(layer.clone())
        .try_into::<LoreConfig>()
        .map_err(|e| ConfigError::parse(path, e))?;

    Ok(layer)
}

/// Merge `overlay` into `base`. Keys present in `overlay` win.
fn merge_layer(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(nested) => match base.get_mut(&key) {
                Some(Value::Table(existing)) => merge_layer(existing, nested),
                _ => {
                    base.insert(key, Value::Table(nested));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Decode merged layers over defaults.
fn decode(layers: Table) -> Result<LoreConfig, ConfigError> {
    Value::Table(layers)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::invalid_value("config", e.to_string()))
}

/// Decode, apply CLI overrides and validate.
fn finish(layers: Table, overrides: Option<&ConfigOverrides>) -> Result<LoreConfig, ConfigError> {
    let mut config = decode(layers)?;

    if let Some(ovr) = overrides {
        config.apply_overrides(ovr);
    }

    config.validate()?;
    Ok(config)
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &LoreConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::write(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write(path, e))
}

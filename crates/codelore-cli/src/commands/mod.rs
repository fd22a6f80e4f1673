//! CLI command implementations

pub mod build;
pub mod config;
pub mod show;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use codelore_config::{ConfigLoader, ConfigOverrides, LoggingConfig, LoreConfig};
use codelore_core::SqliteStore;

use crate::GlobalOptions;

/// Resolve the workspace path from options or current directory.
pub fn resolve_workspace(global: &GlobalOptions) -> Result<PathBuf> {
    if let Some(ref ws) = global.workspace {
        if !ws.is_dir() {
            anyhow::bail!("Workspace '{}' is not a directory", ws.display());
        }
        return ws
            .canonicalize()
            .with_context(|| format!("Failed to resolve workspace {}", ws.display()));
    }

    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration with optional config file override.
///
/// An explicit `--config` file replaces the global and local files.
pub fn load_config(global: &GlobalOptions, workspace: &Path) -> Result<LoreConfig> {
    load_config_with(global, workspace, global.to_config_overrides())
}

/// Like [`load_config`], with command-specific overrides.
pub fn load_config_with(
    global: &GlobalOptions,
    workspace: &Path,
    overrides: ConfigOverrides,
) -> Result<LoreConfig> {
    if let Some(ref config_path) = global.config {
        return ConfigLoader::new()
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    ConfigLoader::new()
        .load(workspace, Some(&overrides))
        .context("Failed to load configuration")
}

/// Logging settings from config, if the config can be loaded.
pub fn configured_logging(global: &GlobalOptions) -> Option<LoggingConfig> {
    let workspace = resolve_workspace(global).ok()?;
    load_config(global, &workspace).ok().map(|c| c.logging)
}

/// Open the node store of a workspace that has already been built.
pub fn open_existing_store(config: &LoreConfig, workspace: &Path) -> Result<SqliteStore> {
    let db_path = config.database_path(workspace);
    if !db_path.exists() {
        anyhow::bail!(
            "No graph found at {}. Run 'codelore build --facts <PATH>' first.",
            db_path.display()
        );
    }

    SqliteStore::open_existing(&db_path)
        .with_context(|| format!("Failed to open node store {}", db_path.display()))
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}


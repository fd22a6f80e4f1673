//! Configuration error types.

use std::path::PathBuf;

use codelore_core::RulesError;
use thiserror::Error;

/// Errors raised while reading, merging, validating or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file or directory could not be read
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config layer is not valid TOML or does not fit the config schema
    #[error("malformed config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A config file or its directory could not be written
    #[error("cannot write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The merged configuration could not be rendered as TOML
    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    /// A value is out of range or inconsistent
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Report a rejected `[graph]` section under its dotted key.
    pub fn invalid_rules(err: RulesError) -> Self {
        Self::invalid_value(format!("graph.{}", err.field()), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigError::invalid_value("limits.max_concurrent", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration value for 'limits.max_concurrent': must be at least 1"
        );
    }

    #[test]
    fn test_invalid_rules_uses_graph_key() {
        let err = ConfigError::invalid_rules(RulesError::ZeroModuleMembers);
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "graph.min_module_members"
        ));
    }

    #[test]
    fn test_read_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConfigError::read("/tmp/config.toml", io);
        assert!(err.to_string().contains("/tmp/config.toml"));
        assert!(err.to_string().contains("gone"));
    }
}

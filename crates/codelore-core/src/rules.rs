//! Tunables shared by the node builders, selection predicates and edge builders.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder substituted with a test file's path in `test_command`.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Errors reported by [`GraphRules::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("test command template '{0}' does not contain {{path}}")]
    MissingPathPlaceholder(String),

    #[error("min_module_members must be at least 1")]
    ZeroModuleMembers,

    #[error("at least one source extension is required")]
    NoSourceExtensions,

    #[error("source extension '{0}' must start with '.'")]
    BadExtension(String),
}

impl RulesError {
    /// Name of the rule field at fault
    pub fn field(&self) -> &'static str {
        match self {
            RulesError::MissingPathPlaceholder(_) => "test_command",
            RulesError::ZeroModuleMembers => "min_module_members",
            RulesError::NoSourceExtensions | RulesError::BadExtension(_) => "source_extensions",
        }
    }
}

/// Rules deciding which entities become nodes and how relationships resolve.
///
/// Defaults target a TypeScript/JavaScript repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphRules {
    /// Test-runner invocation template for test files
    pub test_command: String,
    /// Suffixes of the extension-less file name marking a test file
    pub test_markers: Vec<String>,
    /// Directory names holding tests
    pub test_dir_names: Vec<String>,
    /// Base name (without extension) of a directory's index file
    pub index_stem: String,
    /// Member count at which a directory without index file becomes a module
    pub min_module_members: usize,
    /// Extensions tried, in order, when resolving relative imports
    pub source_extensions: Vec<String>,
    /// Also try `<dir>/index<ext>` for directory imports (off by default)
    pub resolve_index_files: bool,
}

impl Default for GraphRules {
    fn default() -> Self {
        Self {
            test_command: "npm test -- {path}".to_string(),
            test_markers: vec![".test".to_string(), ".spec".to_string()],
            test_dir_names: vec![
                "__tests__".to_string(),
                "tests".to_string(),
                "test".to_string(),
            ],
            index_stem: "index".to_string(),
            min_module_members: 3,
            source_extensions: vec![
                ".ts".to_string(),
                ".tsx".to_string(),
                ".js".to_string(),
                ".jsx".to_string(),
                ".mjs".to_string(),
                ".cjs".to_string(),
            ],
            resolve_index_files: false,
        }
    }
}

impl GraphRules {
    /// Check that the rules are usable.
    pub fn validate(&self) -> Result<(), RulesError> {
        if !self.test_command.contains(PATH_PLACEHOLDER) {
            return Err(RulesError::MissingPathPlaceholder(self.test_command.clone()));
        }
        if self.min_module_members == 0 {
            return Err(RulesError::ZeroModuleMembers);
        }
        if self.source_extensions.is_empty() {
            return Err(RulesError::NoSourceExtensions);
        }
        if let Some(ext) = self.source_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(RulesError::BadExtension(ext.clone()));
        }
        Ok(())
    }

    /// Render the test command for a test file.
    pub fn test_command_for(&self, path: &str) -> String {
        self.test_command.replace(PATH_PLACEHOLDER, path)
    }

    /// Check whether a directory segment names a tests directory.
    pub fn is_test_dir(&self, segment: &str) -> bool {
        self.test_dir_names.iter().any(|d| d == segment)
    }

    /// Strip a trailing test marker from an extension-less file name.
    ///
    /// Returns `None` when the name carries no marker. A name that is only a
    /// marker (`.test`) does not count.
    pub fn strip_test_marker<'a>(&self, stem: &'a str) -> Option<&'a str> {
        self.test_markers.iter().find_map(|marker| {
            stem.strip_suffix(marker.as_str())
                .filter(|rest| !rest.is_empty())
        })
    }
}

//! Per-file fact records consumed by the graph builder.
//!
//! These records are produced by the syntax extraction and history mining
//! stages. Field names follow the camelCase wire format those stages emit.
//! Every optional section deserializes to an empty or absent value, so a
//! record carrying only `path` and `lines` is valid.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while decoding fact documents.
#[derive(Debug, Error)]
pub enum FactsError {
    /// The document is not a bundle, a record list, or a single record
    #[error("invalid fact document '{origin}': {source}")]
    InvalidDocument {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FactsError {
    /// Create a new InvalidDocument error.
    pub fn invalid_document(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidDocument {
            origin: origin.into(),
            source,
        }
    }
}

// ============================================================================
// Syntax-level facts
// ============================================================================

/// One import statement of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFact {
    /// Module specifier as written (e.g. `./session`, `node:fs`, `react`)
    pub from: String,
    /// Imported bindings
    #[serde(default)]
    pub names: Vec<String>,
    /// `import type { .. }`
    #[serde(default)]
    pub is_type_only: bool,
}

/// One exported binding of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFact {
    pub name: String,
    /// Declaration kind: "function", "class", "const", "type", ...
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub is_re_export: bool,
}

/// A declared parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamFact {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// A top-level function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionFact {
    pub name: String,
    /// Full declared signature text
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub params: Vec<ParamFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_exported: bool,
    /// First line of the declaration (1-indexed)
    pub start_line: usize,
    /// Last line of the declaration (1-indexed, inclusive)
    pub end_line: usize,
}

impl FunctionFact {
    /// Inclusive line span of the declaration.
    pub fn line_count(&self) -> usize {
        (self.end_line + 1).saturating_sub(self.start_line)
    }
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFact {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default)]
    pub start_line: usize,
    #[serde(default)]
    pub end_line: usize,
}

/// An interface or type-alias declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceFact {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub is_exported: bool,
}

// ============================================================================
// History and documentation facts
// ============================================================================

/// One commit touching a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Version-control evidence for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitFacts {
    pub commit_count: u32,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Authors in the order supplied by the history miner
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_author: Option<String>,
    /// Most recent first
    #[serde(default)]
    pub recent_commits: Vec<CommitRecord>,
}

/// Documentation evidence for a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocFacts {
    /// Doc comments keyed by the identifier they document
    #[serde(default)]
    pub jsdoc: BTreeMap<String, String>,
    #[serde(default)]
    pub inline_comments: Vec<String>,
    #[serde(default)]
    pub todos: Vec<String>,
    #[serde(default)]
    pub deprecations: Vec<String>,
}

// ============================================================================
// File records
// ============================================================================

/// Everything known about one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacts {
    /// Repository-relative path using `/` separators
    pub path: String,
    pub lines: usize,
    #[serde(default)]
    pub imports: Vec<ImportFact>,
    #[serde(default)]
    pub exports: Vec<ExportFact>,
    #[serde(default)]
    pub functions: Vec<FunctionFact>,
    #[serde(default)]
    pub classes: Vec<ClassFact>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<DocFacts>,
}

impl FileFacts {
    /// Create a bare record with no syntax, history or documentation evidence.
    pub fn new(path: impl Into<String>, lines: usize) -> Self {
        Self {
            path: path.into(),
            lines,
            imports: Vec::new(),
            exports: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            interfaces: Vec::new(),
            git: None,
            docs: None,
        }
    }
}

/// The complete input of one graph build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactBundle {
    pub files: Vec<FileFacts>,
    /// README text keyed by directory path
    #[serde(default)]
    pub readmes: BTreeMap<String, String>,
}

impl FactBundle {
    /// Create a bundle from file records without any module readmes.
    pub fn from_files(files: Vec<FileFacts>) -> Self {
        Self {
            files,
            readmes: BTreeMap::new(),
        }
    }

    /// Append another bundle's records. Readmes from `other` win on conflict.
    pub fn merge(&mut self, other: FactBundle) {
        self.files.extend(other.files);
        self.readmes.extend(other.readmes);
    }
}

/// Accepted top-level shapes of a fact document.
#[derive(Deserialize)]
#[serde(untagged)]
enum FactDocument {
    Bundle(FactBundle),
    Many(Vec<FileFacts>),
    One(Box<FileFacts>),
}

/// Decode a fact document: a bundle, an array of records, or a single record.
///
/// `origin` names the document in error messages (usually its path).
pub fn parse_fact_document(origin: &str, content: &str) -> Result<FactBundle, FactsError> {
    let document: FactDocument = serde_json::from_str(content)
        .map_err(|e| FactsError::invalid_document(origin, e))?;

    Ok(match document {
        FactDocument::Bundle(bundle) => bundle,
        FactDocument::Many(files) => FactBundle::from_files(files),
        FactDocument::One(file) => FactBundle::from_files(vec![*file]),
    })
}

//! Knowledge Graph Schema Definitions
//!
//! This module defines the node and edge records that make up the knowledge
//! graph, plus `KnowledgeGraph`, the id-indexed node collection the builder
//! assembles.
//!
//! Node ids are deterministic from their origin:
//! - file: repository-relative path (`src/auth/login.ts`)
//! - function: `<filePath>:<functionName>` (`src/auth/login.ts:login`)
//! - module: directory path (`src/auth`)
//!
//! Edges live on the node that owns them. Builders that compute an edge for a
//! node other than the one they were handed return an [`OwnedEdge`] naming the
//! owner explicitly.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::facts::{CommitRecord, ExportFact, ImportFact};

/// Version of the node record layout, recorded by persistent node stores
pub const GRAPH_SCHEMA_VERSION: &str = "1.0";

// ============================================================================
// Edge Types
// ============================================================================

/// Types of relationships between knowledge-base nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeType {
    /// Hierarchical containment (Module→File, File→Function)
    Contains,
    /// Declared parent (File→Module)
    Parent,
    /// Resolved relative import (File→File)
    Imports,
    /// Reciprocal of `Imports`, stored on the imported file
    ImportedBy,
    /// Source file → test file covering it
    TestFile,
}

impl EdgeType {
    /// All edge types, in declaration order.
    pub const ALL: [EdgeType; 5] = [
        EdgeType::Contains,
        EdgeType::Parent,
        EdgeType::Imports,
        EdgeType::ImportedBy,
        EdgeType::TestFile,
    ];

    /// Get the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Contains => "contains",
            EdgeType::Parent => "parent",
            EdgeType::Imports => "imports",
            EdgeType::ImportedBy => "importedBy",
            EdgeType::TestFile => "testFile",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// High-level node type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Source file
    File,
    /// Exported function
    Function,
    /// Directory grouping files
    Module,
}

impl NodeType {
    /// Get the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Function => "function",
            NodeType::Module => "module",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(NodeType::File),
            "function" => Ok(NodeType::Function),
            "module" => Ok(NodeType::Module),
            _ => Err(format!(
                "Unknown node type: '{}'. Valid values: file, function, module",
                s
            )),
        }
    }
}

// ============================================================================
// Node Metadata
// ============================================================================

/// Size, history and graph-derived metrics of a node.
///
/// `fan_in`, `fan_out`, `age_in_days` and `recency_in_days` are only ever
/// written by [`crate::metrics::compute_metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub lines: usize,
    pub commits: u32,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Authors in supplied order
    #[serde(default)]
    pub authors: Vec<String>,
    /// Test-runner invocation, only on test files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_in: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_out: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_in_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency_in_days: Option<i64>,
}

impl NodeMetadata {
    /// Neutral baseline: no lines, no commits, no authors, modified `now`.
    pub fn baseline(now: DateTime<Utc>) -> Self {
        Self {
            lines: 0,
            commits: 0,
            last_modified: now,
            created_at: None,
            authors: Vec::new(),
            test_command: None,
            fan_in: None,
            fan_out: None,
            age_in_days: None,
            recency_in_days: None,
        }
    }
}

// ============================================================================
// Raw Evidence
// ============================================================================

/// Origin-specific evidence carried through for prose generation.
///
/// Files fill `signature`, `jsdoc`, `imports`, `exports` and `recent_commits`;
/// functions fill `signature` and `jsdoc`; modules fill `readme`. Anything the
/// origin did not supply stays empty and is omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvidence {
    /// Declared signatures in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsdoc: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportFact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<ExportFact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_commits: Vec<CommitRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

impl RawEvidence {
    /// Check if no evidence is present
    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
            && self.jsdoc.is_none()
            && self.imports.is_empty()
            && self.exports.is_empty()
            && self.recent_commits.is_empty()
            && self.readme.is_none()
    }
}

// ============================================================================
// Edge
// ============================================================================

/// A directed, typed relationship stored on its owning node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Target node ID
    pub target: String,
}

impl Edge {
    /// Create an edge of the given type
    pub fn new(edge_type: EdgeType, target: impl Into<String>) -> Self {
        Self {
            edge_type,
            target: target.into(),
        }
    }

    /// Create a CONTAINS edge
    pub fn contains(target: impl Into<String>) -> Self {
        Self::new(EdgeType::Contains, target)
    }

    /// Create a PARENT edge
    pub fn parent(target: impl Into<String>) -> Self {
        Self::new(EdgeType::Parent, target)
    }

    /// Create an IMPORTS edge
    pub fn imports(target: impl Into<String>) -> Self {
        Self::new(EdgeType::Imports, target)
    }
}

/// An edge together with the id of the node it must be stored on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedEdge {
    /// Owner node ID
    pub source_id: String,

    #[serde(flatten)]
    pub edge: Edge,
}

impl OwnedEdge {
    /// Create an owned edge
    pub fn new(source_id: impl Into<String>, edge_type: EdgeType, target: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            edge: Edge::new(edge_type, target),
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique, deterministic ID
    pub id: String,

    /// Node type: file, function or module
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Path the node is anchored to (directory path for modules)
    pub path: String,

    /// Display name
    pub name: String,

    pub metadata: NodeMetadata,

    /// Outgoing edges in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,

    #[serde(default, skip_serializing_if = "RawEvidence::is_empty")]
    pub raw: RawEvidence,
}

impl Node {
    /// Create a node with no edges and no raw evidence
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        path: impl Into<String>,
        name: impl Into<String>,
        metadata: NodeMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            path: path.into(),
            name: name.into(),
            metadata,
            edges: Vec::new(),
            raw: RawEvidence::default(),
        }
    }

    /// Check if this is a file node
    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    /// Check if this is a module node
    pub fn is_module(&self) -> bool {
        self.node_type == NodeType::Module
    }

    /// Iterate over edges of one type
    pub fn edges_of(&self, edge_type: EdgeType) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.edge_type == edge_type)
    }

    /// Append edges in order
    pub fn extend_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        self.edges.extend(edges);
    }
}

// ============================================================================
// Knowledge Graph
// ============================================================================

/// Id-indexed collection of nodes produced by one build.
///
/// Node order is insertion order and is stable across builds of the same
/// fact set.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` and leaves the graph unchanged when a node
    /// with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Check whether a node id is present
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Get a node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Get a mutable node by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// Append an owned edge to its owner node.
    ///
    /// Returns `false` when the owner is not in the graph; the edge is dropped.
    pub fn attach(&mut self, owned: OwnedEdge) -> bool {
        match self.get_mut(&owned.source_id) {
            Some(node) => {
                node.edges.push(owned.edge);
                true
            }
            None => {
                warn!(
                    "Dropping {} edge to {}: owner {} not in graph",
                    owned.edge.edge_type, owned.edge.target, owned.source_id
                );
                false
            }
        }
    }

    /// Attach a batch of owned edges, returning how many were attached
    pub fn attach_all(&mut self, owned: impl IntoIterator<Item = OwnedEdge>) -> usize {
        let mut attached = 0;
        for edge in owned {
            if self.attach(edge) {
                attached += 1;
            }
        }
        attached
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All nodes, mutable. Ids must not be changed through this slice.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// File nodes in insertion order
    pub fn file_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_file())
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges across all nodes
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Check whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node counts per type
    pub fn count_by_type(&self) -> BTreeMap<NodeType, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.node_type).or_insert(0) += 1;
        }
        counts
    }

    /// Edge counts per type
    pub fn edge_count_by_type(&self) -> BTreeMap<EdgeType, usize> {
        let mut counts = BTreeMap::new();
        for edge in self.nodes.iter().flat_map(|n| n.edges.iter()) {
            *counts.entry(edge.edge_type).or_insert(0) += 1;
        }
        counts
    }
}

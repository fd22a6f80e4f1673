//! CodeLore Core - Knowledge graph construction from per-file source facts
//!
//! This crate provides the core functionality for knowledge-graph generation:
//! - Fact records decoded from upstream extractors
//! - Node builders and selection predicates for files, functions and modules
//! - Edge builders for containment, imports, dependents and test pairing
//! - Structural metrics (fan-in, fan-out, age, recency)
//! - Bounded-concurrency admission for expensive async work
//! - Node persistence (SQLite and in-memory)

pub mod builder;
pub mod edges;
pub mod facts;
pub mod graph;
pub mod limiter;
pub mod metrics;
pub mod nodes;
pub mod paths;
pub mod rules;
pub mod selection;
pub mod store;

// Re-exports for convenience
pub use graph::{
    Edge, EdgeType, KnowledgeGraph, Node, NodeMetadata, NodeType, OwnedEdge, RawEvidence,
    GRAPH_SCHEMA_VERSION,
};
pub use facts::{parse_fact_document, FactBundle, FactsError, FileFacts};
pub use rules::{GraphRules, RulesError};

// Builder re-exports
pub use builder::{BuildStats, BuilderError, GraphBuilder};

// Limiter re-exports
pub use limiter::Limiter;

// Store re-exports
pub use store::{persist_graph, MemoryStore, NodeStore, SqliteStore, StoreError};

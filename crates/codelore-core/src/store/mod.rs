//! Node persistence through an insert-or-replace-by-id contract.
//!
//! A store handle is created once by the process entry point and passed by
//! reference to whatever needs persistence. Stores only ever write whole node
//! records; nodes missing from a new build are left as they were.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;
use tracing::info;

use crate::graph::{KnowledgeGraph, Node};

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A keyed node collection.
pub trait NodeStore: Send + Sync {
    /// Insert or replace one node by id.
    fn upsert(&self, node: &Node) -> Result<(), StoreError>;

    /// Insert or replace a batch of nodes by id.
    fn upsert_all(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        for node in nodes {
            self.upsert(node)?;
        }
        Ok(nodes.len())
    }

    /// Find one node by id.
    fn find_by_id(&self, id: &str) -> Result<Option<Node>, StoreError>;

    /// All stored nodes, ordered by id.
    fn find_all(&self) -> Result<Vec<Node>, StoreError>;

    /// Number of stored nodes.
    fn count(&self) -> Result<usize, StoreError>;
}

/// Upsert every node of a built graph, returning how many were written.
pub fn persist_graph(store: &dyn NodeStore, graph: &KnowledgeGraph) -> Result<usize, StoreError> {
    let written = store.upsert_all(graph.nodes())?;
    info!("Persisted {} nodes", written);
    Ok(written)
}

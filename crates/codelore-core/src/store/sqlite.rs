//! SQLite node store.
//!
//! Each node is one row keyed by id. Identification columns are kept for
//! ad-hoc queries; the whole node record lives in `body_json`.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use tracing::debug;

use super::{NodeStore, StoreError};
use crate::graph::{Node, GRAPH_SCHEMA_VERSION};

const SCHEMA_CREATE_NODES: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY NOT NULL,
    node_type TEXT NOT NULL,
    path TEXT NOT NULL,
    name TEXT NOT NULL,

    -- Full node record, edges and raw evidence included
    body_json TEXT NOT NULL
)
"#;

const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

const SCHEMA_CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(node_type);
CREATE INDEX IF NOT EXISTS idx_nodes_path ON nodes(path);
"#;

const UPSERT_NODE: &str = r#"
INSERT OR REPLACE INTO nodes (id, node_type, path, name, body_json)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

/// Node store backed by one SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open a store database, creating it with schema if it does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::open_existing(path)
        } else {
            Self::create(path)
        }
    }

    /// Open an existing store database, checking its schema version.
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };

        match store.get_metadata("schema_version")? {
            Some(version) if version == GRAPH_SCHEMA_VERSION => {}
            Some(version) => {
                return Err(StoreError::SchemaVersionMismatch {
                    expected: GRAPH_SCHEMA_VERSION.to_string(),
                    found: version,
                });
            }
            // Empty file: initialize in place
            None => store.init_schema()?,
        }

        debug!("Opened node store at {}", path.display());
        Ok(store)
    }

    /// Create a new store database with schema
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        debug!("Created node store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn configure_connection(conn: &Connection) -> SqliteResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock();
            conn.execute(SCHEMA_CREATE_NODES, [])?;
            conn.execute(SCHEMA_CREATE_METADATA, [])?;
            conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        }
        self.set_metadata("schema_version", GRAPH_SCHEMA_VERSION)
    }

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let has_table: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'store_metadata'",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM store_metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Set a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO store_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn decode(body: String) -> Result<Node, StoreError> {
        Ok(serde_json::from_str(&body)?)
    }
}

impl NodeStore for SqliteStore {
    fn upsert(&self, node: &Node) -> Result<(), StoreError> {
        let body = serde_json::to_string(node)?;
        self.conn.lock().execute(
            UPSERT_NODE,
            params![node.id, node.node_type.as_str(), node.path, node.name, body],
        )?;
        Ok(())
    }

    fn upsert_all(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_NODE)?;
            for node in nodes {
                let body = serde_json::to_string(node)?;
                stmt.execute(params![
                    node.id,
                    node.node_type.as_str(),
                    node.path,
                    node.name,
                    body
                ])?;
            }
        }
        tx.commit()?;
        Ok(nodes.len())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Node>, StoreError> {
        let body: Option<String> = self
            .conn
            .lock()
            .query_row("SELECT body_json FROM nodes WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        body.map(Self::decode).transpose()
    }

    fn find_all(&self) -> Result<Vec<Node>, StoreError> {
        let bodies: Vec<String> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare("SELECT body_json FROM nodes ORDER BY id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<SqliteResult<_>>()?
        };
        bodies.into_iter().map(Self::decode).collect()
    }

    fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

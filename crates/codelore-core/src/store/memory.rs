//! In-memory node store, mainly for tests and dry runs.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{NodeStore, StoreError};
use crate::graph::Node;

/// Node store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryStore {
    fn upsert(&self, node: &Node) -> Result<(), StoreError> {
        self.nodes.write().insert(node.id.clone(), node.clone());
        Ok(())
    }

    fn upsert_all(&self, nodes: &[Node]) -> Result<usize, StoreError> {
        let mut map = self.nodes.write();
        for node in nodes {
            map.insert(node.id.clone(), node.clone());
        }
        Ok(nodes.len())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.read().get(id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.read().values().cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.nodes.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeMetadata, NodeType};
    use chrono::{TimeZone, Utc};

    fn node(id: &str, lines: usize) -> Node {
        let mut metadata = NodeMetadata::baseline(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        metadata.lines = lines;
        Node::new(id, NodeType::File, id, id, metadata)
    }

    #[test]
    fn test_upsert_replaces_whole_record() {
        let store = MemoryStore::new();
        store.upsert(&node("b.ts", 1)).unwrap();
        store.upsert(&node("a.ts", 2)).unwrap();
        store.upsert(&node("b.ts", 3)).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.find_by_id("b.ts").unwrap().unwrap().metadata.lines, 3);
        assert!(store.find_by_id("c.ts").unwrap().is_none());

        let ids: Vec<String> = store.find_all().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["a.ts", "b.ts"]);
    }
}

//! Graph-derived metrics computed over a completed node set.
//!
//! Fan-in and fan-out count `imports` edges only. Age and recency are whole
//! days of absolute elapsed time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::graph::{EdgeType, Node};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Number of `imports` edges, across all nodes, targeting `node_id`.
pub fn calculate_fan_in(node_id: &str, all_nodes: &[Node]) -> usize {
    all_nodes
        .iter()
        .flat_map(|n| n.edges_of(EdgeType::Imports))
        .filter(|e| e.target == node_id)
        .count()
}

/// Number of `imports` edges on the node itself.
pub fn calculate_fan_out(node: &Node) -> usize {
    node.edges_of(EdgeType::Imports).count()
}

/// Whole days elapsed between two instants, never negative.
fn elapsed_days(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed_ms = (now - from).num_milliseconds();
    elapsed_ms.div_euclid(MS_PER_DAY).max(0)
}

/// Days since creation: `floor((now - created_at) / 1 day)`.
pub fn calculate_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    elapsed_days(created_at, now)
}

/// Days since last modification: `floor((now - last_modified) / 1 day)`.
pub fn calculate_recency(last_modified: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    elapsed_days(last_modified, now)
}

/// Annotate every node in place with fan-in, fan-out, age and recency.
///
/// Must run after all edge-building passes, since fan-in and fan-out read the
/// final edge set. A node without `created_at` gets no age.
pub fn compute_metadata(nodes: &mut [Node], now: DateTime<Utc>) {
    // One scan for fan-in instead of one per node
    let mut fan_in: HashMap<String, usize> = HashMap::new();
    for edge in nodes.iter().flat_map(|n| n.edges_of(EdgeType::Imports)) {
        *fan_in.entry(edge.target.clone()).or_insert(0) += 1;
    }

    for node in nodes.iter_mut() {
        let fan_out = calculate_fan_out(node);
        let metadata = &mut node.metadata;
        metadata.fan_in = Some(fan_in.get(&node.id).copied().unwrap_or(0));
        metadata.fan_out = Some(fan_out);
        metadata.age_in_days = metadata.created_at.map(|c| calculate_age(c, now));
        metadata.recency_in_days = Some(calculate_recency(metadata.last_modified, now));
    }

    debug!("Computed metrics for {} nodes", nodes.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NodeMetadata, NodeType};
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn node(id: &str, edges: Vec<Edge>) -> Node {
        let mut n = Node::new(id, NodeType::File, id, id, NodeMetadata::baseline(date(2024, 1, 10)));
        n.edges = edges;
        n
    }

    #[test]
    fn test_fan_in_counts_imports_only() {
        let nodes = vec![
            node("a", vec![Edge::imports("c")]),
            node("b", vec![Edge::imports("c")]),
            node(
                "c",
                vec![
                    Edge::new(EdgeType::ImportedBy, "a"),
                    Edge::new(EdgeType::ImportedBy, "b"),
                ],
            ),
            node(
                "m",
                vec![Edge::contains("c"), Edge::new(EdgeType::TestFile, "c")],
            ),
        ];
        assert_eq!(calculate_fan_in("c", &nodes), 2);
        assert_eq!(calculate_fan_in("a", &nodes), 0);
    }

    #[test]
    fn test_fan_out_counts_imports_only() {
        let n = node(
            "a",
            vec![Edge::imports("b"), Edge::imports("c"), Edge::imports("d")],
        );
        assert_eq!(calculate_fan_out(&n), 3);

        let mixed = node(
            "a",
            vec![
                Edge::imports("b"),
                Edge::parent("src"),
                Edge::contains("a:f"),
                Edge::new(EdgeType::ImportedBy, "z"),
                Edge::new(EdgeType::TestFile, "a.test"),
            ],
        );
        assert_eq!(calculate_fan_out(&mixed), 1);
    }

    #[test]
    fn test_age_and_recency() {
        let now = date(2024, 1, 15);
        assert_eq!(calculate_age(date(2023, 12, 1), now), 45);
        assert_eq!(calculate_recency(date(2024, 1, 10), now), 5);
        assert_eq!(calculate_age(now, now), 0);
        assert_eq!(calculate_recency(now, now), 0);
    }

    #[test]
    fn test_partial_days_floor() {
        let now = date(2024, 1, 15);
        assert_eq!(calculate_recency(now - Duration::hours(23), now), 0);
        assert_eq!(calculate_recency(now - Duration::hours(49), now), 2);
    }

    #[test]
    fn test_future_timestamps_clamp_to_zero() {
        let now = date(2024, 1, 15);
        assert_eq!(calculate_recency(now + Duration::days(3), now), 0);
    }

    #[test]
    fn test_compute_metadata_in_place() {
        let now = date(2024, 1, 15);
        let mut created = node("a", vec![Edge::imports("b")]);
        created.metadata.created_at = Some(date(2023, 12, 1));
        let mut nodes = vec![created, node("b", vec![])];

        compute_metadata(&mut nodes, now);

        let a = &nodes[0].metadata;
        assert_eq!(a.fan_in, Some(0));
        assert_eq!(a.fan_out, Some(1));
        assert_eq!(a.age_in_days, Some(45));
        assert_eq!(a.recency_in_days, Some(5));

        let b = &nodes[1].metadata;
        assert_eq!(b.fan_in, Some(1));
        assert_eq!(b.fan_out, Some(0));
        // Unknown creation stays unknown rather than "new"
        assert_eq!(b.age_in_days, None);
        assert_eq!(b.recency_in_days, Some(5));
    }
}

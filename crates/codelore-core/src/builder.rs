//! Graph assembly from a fact bundle.
//!
//! The builder runs every node and edge builder in a fixed order over one
//! [`FactBundle`] and returns the finished [`KnowledgeGraph`]. It performs no
//! I/O; persisting the result is the caller's job.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::edges::{
    build_contains_edges, build_dependent_edges, build_import_edges, build_parent_edge,
    build_test_file_edges,
};
use crate::facts::{FactBundle, FileFacts};
use crate::graph::{EdgeType, KnowledgeGraph, Node, NodeType, OwnedEdge};
use crate::metrics::compute_metadata;
use crate::nodes::{
    aggregate_module_metadata, build_file_node, build_function_node, build_module_node,
};
use crate::paths::parent_dir;
use crate::rules::{GraphRules, RulesError};
use crate::selection::{should_create_function_node, should_create_module_node};

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during graph building.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Rules failed validation
    #[error("Invalid graph rules: {0}")]
    InvalidRules(#[from] RulesError),
}

// ============================================================================
// Build Statistics
// ============================================================================

/// Counts describing one finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
    /// File records dropped because an earlier record had the same path
    pub duplicate_files: usize,
    /// Functions dropped because their id was already taken
    pub duplicate_functions: usize,
}

impl BuildStats {
    /// Total nodes across all types
    pub fn total_nodes(&self) -> usize {
        self.nodes_by_type.values().sum()
    }

    /// Total edges across all types
    pub fn total_edges(&self) -> usize {
        self.edges_by_type.values().sum()
    }
}

// ============================================================================
// Graph Builder
// ============================================================================

/// Builds knowledge graphs from fact bundles.
///
/// ## Example
///
/// ```ignore
/// use codelore_core::{GraphBuilder, GraphRules};
///
/// let builder = GraphBuilder::new(GraphRules::default())?;
/// let graph = builder.build(&bundle, chrono::Utc::now());
/// println!("Built graph with {} nodes", graph.node_count());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    rules: GraphRules,
}

impl GraphBuilder {
    /// Create a builder, validating the rules up front.
    pub fn new(rules: GraphRules) -> Result<Self, BuilderError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    /// The rules this builder applies
    pub fn rules(&self) -> &GraphRules {
        &self.rules
    }

    /// Build a graph from a fact bundle.
    pub fn build(&self, bundle: &FactBundle, now: DateTime<Utc>) -> KnowledgeGraph {
        self.build_with_stats(bundle, now).0
    }

    /// Build a graph from a fact bundle, also returning build statistics.
    ///
    /// `now` is used both as the fallback `lastModified` and as the reference
    /// instant for age and recency.
    pub fn build_with_stats(
        &self,
        bundle: &FactBundle,
        now: DateTime<Utc>,
    ) -> (KnowledgeGraph, BuildStats) {
        let mut graph = KnowledgeGraph::new();
        let mut stats = BuildStats::default();

        info!("Building graph from {} file records", bundle.files.len());

        let accepted = self.add_file_nodes(&mut graph, bundle, now, &mut stats);
        self.add_function_nodes(&mut graph, &accepted, now, &mut stats);
        self.add_module_nodes(&mut graph, bundle, now);
        self.add_import_edges(&mut graph);

        let dependents = build_dependent_edges(graph.file_nodes());
        let attached = graph.attach_all(dependents);
        debug!("Attached {} importedBy edges", attached);

        let test_edges = build_test_file_edges(graph.file_nodes(), &self.rules);
        let attached = graph.attach_all(test_edges);
        debug!("Attached {} testFile edges", attached);

        compute_metadata(graph.nodes_mut(), now);

        stats.nodes_by_type = graph.count_by_type();
        stats.edges_by_type = graph.edge_count_by_type();

        info!("Graph summary:");
        for (node_type, count) in &stats.nodes_by_type {
            info!("  - {} nodes: {}", node_type, count);
        }
        info!("  - Total edges: {}", stats.total_edges());

        (graph, stats)
    }

    /// Create one node per file record. The first record for a path wins.
    fn add_file_nodes<'a>(
        &self,
        graph: &mut KnowledgeGraph,
        bundle: &'a FactBundle,
        now: DateTime<Utc>,
        stats: &mut BuildStats,
    ) -> Vec<&'a FileFacts> {
        let mut accepted = Vec::with_capacity(bundle.files.len());
        for fact in &bundle.files {
            if graph.add_node(build_file_node(fact, &self.rules, now)) {
                accepted.push(fact);
            } else {
                warn!("Duplicate file record for {}, keeping the first", fact.path);
                stats.duplicate_files += 1;
            }
        }
        accepted
    }

    /// Create nodes for exported functions and link them from their file.
    fn add_function_nodes(
        &self,
        graph: &mut KnowledgeGraph,
        accepted: &[&FileFacts],
        now: DateTime<Utc>,
        stats: &mut BuildStats,
    ) {
        for fact in accepted {
            let mut created: Vec<Node> = Vec::new();
            for function in fact.functions.iter().filter(|f| should_create_function_node(f)) {
                let node = build_function_node(fact, function, now);
                if graph.contains(&node.id) || created.iter().any(|n| n.id == node.id) {
                    warn!("Duplicate function {}, skipping", node.id);
                    stats.duplicate_functions += 1;
                    continue;
                }
                created.push(node);
            }

            if created.is_empty() {
                continue;
            }

            let children: Vec<&Node> = created.iter().collect();
            if let Some(file_node) = graph.get_mut(&fact.path) {
                let edges = build_contains_edges(file_node, &children);
                file_node.extend_edges(edges);
            }
            for node in created {
                graph.add_node(node);
            }
        }
    }

    /// Create module nodes for qualifying directories, in path order.
    ///
    /// Members are the files directly inside a directory. Files at the
    /// repository root have no module.
    fn add_module_nodes(&self, graph: &mut KnowledgeGraph, bundle: &FactBundle, now: DateTime<Utc>) {
        let mut members_by_dir: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
        for node in graph.file_nodes() {
            let dir = parent_dir(&node.path);
            if !dir.is_empty() {
                members_by_dir.entry(dir).or_default().push(node);
            }
        }

        let mut modules = Vec::new();
        for (dir, members) in &members_by_dir {
            let member_paths: Vec<&str> = members.iter().map(|m| m.path.as_str()).collect();
            if !should_create_module_node(&member_paths, &self.rules) {
                continue;
            }

            let readme = bundle.readmes.get(*dir).map(String::as_str);
            let mut module = build_module_node(dir, &member_paths, readme, now);
            aggregate_module_metadata(&mut module, members);
            let contains = build_contains_edges(&module, members);
            module.extend_edges(contains);

            let parent_edges: Vec<OwnedEdge> = members
                .iter()
                .filter_map(|member| {
                    build_parent_edge(member, &module)
                        .map(|edge| OwnedEdge::new(member.id.clone(), edge.edge_type, edge.target))
                })
                .collect();
            modules.push((module, parent_edges));
        }

        for (module, parent_edges) in modules {
            let id = module.id.clone();
            if graph.add_node(module) {
                graph.attach_all(parent_edges);
            } else {
                warn!("Module id {} collides with an existing node, skipping", id);
            }
        }
    }

    /// Resolve every file's imports against the full file-path universe.
    fn add_import_edges(&self, graph: &mut KnowledgeGraph) {
        let known: HashSet<String> = graph.file_nodes().map(|n| n.path.clone()).collect();

        let mut resolved = 0;
        for node in graph.nodes_mut().iter_mut().filter(|n| n.is_file()) {
            let edges = build_import_edges(node, &known, &self.rules);
            resolved += edges.len();
            node.extend_edges(edges);
        }
        debug!("Resolved {} import edges", resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FunctionFact, ImportFact};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    fn file(path: &str, imports: &[&str]) -> FileFacts {
        let mut fact = FileFacts::new(path, 10);
        fact.imports = imports
            .iter()
            .map(|from| ImportFact {
                from: from.to_string(),
                names: vec![],
                is_type_only: false,
            })
            .collect();
        fact
    }

    fn function(name: &str, exported: bool) -> FunctionFact {
        FunctionFact {
            name: name.to_string(),
            signature: format!("function {}()", name),
            params: vec![],
            return_type: None,
            is_async: false,
            is_exported: exported,
            start_line: 1,
            end_line: 3,
        }
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let rules = GraphRules {
            test_command: "npm test".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            GraphBuilder::new(rules),
            Err(BuilderError::InvalidRules(RulesError::MissingPathPlaceholder(_)))
        ));
    }

    #[test]
    fn test_empty_bundle_yields_empty_graph() {
        let (graph, stats) = GraphBuilder::default().build_with_stats(&FactBundle::default(), now());
        assert!(graph.is_empty());
        assert_eq!(stats, BuildStats::default());
    }

    #[test]
    fn test_duplicate_file_keeps_first() {
        let mut second = file("src/a.ts", &[]);
        second.lines = 99;
        let bundle = FactBundle::from_files(vec![file("src/a.ts", &[]), second]);

        let (graph, stats) = GraphBuilder::default().build_with_stats(&bundle, now());
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get("src/a.ts").unwrap().metadata.lines, 10);
        assert_eq!(stats.duplicate_files, 1);
    }

    #[test]
    fn test_only_exported_functions_become_nodes() {
        let mut fact = file("src/a.ts", &[]);
        fact.functions = vec![
            function("run", true),
            function("helper", false),
            function("run", true),
        ];
        let (graph, stats) =
            GraphBuilder::default().build_with_stats(&FactBundle::from_files(vec![fact]), now());

        assert!(graph.contains("src/a.ts:run"));
        assert!(!graph.contains("src/a.ts:helper"));
        assert_eq!(stats.duplicate_functions, 1);

        let file_node = graph.get("src/a.ts").unwrap();
        let contains: Vec<&str> = file_node
            .edges_of(EdgeType::Contains)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(contains, vec!["src/a.ts:run"]);
    }

    #[test]
    fn test_modules_need_index_or_enough_members() {
        let bundle = FactBundle::from_files(vec![
            file("src/single/index.ts", &[]),
            file("src/pair/a.ts", &[]),
            file("src/pair/b.ts", &[]),
            file("src/trio/a.ts", &[]),
            file("src/trio/b.ts", &[]),
            file("src/trio/c.ts", &[]),
            file("root.ts", &[]),
        ]);
        let graph = GraphBuilder::default().build(&bundle, now());

        assert!(graph.get("src/single").unwrap().is_module());
        assert!(graph.get("src/trio").unwrap().is_module());
        assert!(!graph.contains("src/pair"));
        assert!(!graph.contains(""));

        let member = graph.get("src/trio/b.ts").unwrap();
        let parents: Vec<&str> = member
            .edges_of(EdgeType::Parent)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(parents, vec!["src/trio"]);
    }

    #[test]
    fn test_module_readme_is_attached() {
        let mut bundle = FactBundle::from_files(vec![file("src/lib/index.ts", &[])]);
        bundle
            .readmes
            .insert("src/lib".to_string(), "# Lib".to_string());
        let graph = GraphBuilder::default().build(&bundle, now());
        assert_eq!(graph.get("src/lib").unwrap().raw.readme.as_deref(), Some("# Lib"));
    }

    #[test]
    fn test_module_colliding_with_file_gets_no_parent_edges() {
        let bundle = FactBundle::from_files(vec![
            file("src/lib", &[]),
            file("src/lib/index.ts", &[]),
        ]);
        let graph = GraphBuilder::default().build(&bundle, now());

        assert!(graph.get("src/lib").unwrap().is_file());
        assert_eq!(graph.node_count(), 2);
        let member = graph.get("src/lib/index.ts").unwrap();
        assert_eq!(member.edges_of(EdgeType::Parent).count(), 0);
    }

    #[test]
    fn test_metrics_reflect_final_edges() {
        let bundle = FactBundle::from_files(vec![
            file("src/login.ts", &["./config"]),
            file("src/signup.ts", &["./config"]),
            file("src/config.ts", &[]),
        ]);
        let graph = GraphBuilder::default().build(&bundle, now());

        let config = graph.get("src/config.ts").unwrap();
        assert_eq!(config.metadata.fan_in, Some(2));
        assert_eq!(config.metadata.fan_out, Some(0));
        assert_eq!(config.edges_of(EdgeType::ImportedBy).count(), 2);

        let login = graph.get("src/login.ts").unwrap();
        assert_eq!(login.metadata.fan_out, Some(1));
        assert_eq!(login.metadata.recency_in_days, Some(0));
    }
}

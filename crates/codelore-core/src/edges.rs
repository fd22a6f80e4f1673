//! Edge builders discovering relationships between nodes.
//!
//! `build_contains_edges`, `build_parent_edge` and `build_import_edges` return
//! edges for the node they were given. `build_test_file_edges` and
//! `build_dependent_edges` compute edges owned by other nodes and return
//! [`OwnedEdge`]s for the caller to attach.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::graph::{Edge, EdgeType, Node, OwnedEdge};
use crate::paths::{is_relative_specifier, join_normalized, parent_dir};
use crate::rules::GraphRules;
use crate::selection::{is_test_file, logical_unit_name};

/// One `contains` edge per child, in child order. A child with the parent's
/// own id is skipped.
pub fn build_contains_edges(parent: &Node, children: &[&Node]) -> Vec<Edge> {
    children
        .iter()
        .filter(|child| child.id != parent.id)
        .map(|child| Edge::contains(child.id.clone()))
        .collect()
}

/// The `parent` edge to store on `child`, or `None` for a self-reference.
pub fn build_parent_edge(child: &Node, parent: &Node) -> Option<Edge> {
    (child.id != parent.id).then(|| Edge::parent(parent.id.clone()))
}

/// Resolve a relative import specifier against the known file-path universe.
///
/// Candidates are tried in order: the joined path as given, then with each
/// source extension appended. With `resolve_index_files` set,
/// `<path>/index<ext>` is tried last.
/// Non-relative specifiers (packages, `node:` built-ins) are never resolved.
pub fn resolve_import(
    from_path: &str,
    specifier: &str,
    known_file_paths: &HashSet<String>,
    rules: &GraphRules,
) -> Option<String> {
    if !is_relative_specifier(specifier) {
        return None;
    }

    let resolved = join_normalized(parent_dir(from_path), specifier)?;

    let mut candidates = Vec::with_capacity(1 + rules.source_extensions.len() * 2);
    if !resolved.is_empty() {
        candidates.push(resolved.clone());
        candidates.extend(
            rules
                .source_extensions
                .iter()
                .map(|ext| format!("{}{}", resolved, ext)),
        );
    }
    if rules.resolve_index_files {
        let prefix = if resolved.is_empty() {
            String::new()
        } else {
            format!("{}/", resolved)
        };
        candidates.extend(
            rules
                .source_extensions
                .iter()
                .map(|ext| format!("{}{}{}", prefix, rules.index_stem, ext)),
        );
    }

    candidates.into_iter().find(|c| known_file_paths.contains(c))
}

/// `imports` edges for every resolvable relative import of a file.
///
/// Order follows the file's import list; duplicates are kept. Unresolvable
/// specifiers produce no edge.
pub fn build_import_edges(
    file_node: &Node,
    known_file_paths: &HashSet<String>,
    rules: &GraphRules,
) -> Vec<Edge> {
    file_node
        .raw
        .imports
        .iter()
        .filter_map(|import| {
            let target = resolve_import(&file_node.path, &import.from, known_file_paths, rules);
            if target.is_none() {
                trace!("Unresolved import '{}' in {}", import.from, file_node.path);
            }
            target
        })
        .map(Edge::imports)
        .collect()
}

/// Pair every non-test file with the test files sharing its logical unit name.
///
/// Each pairing yields one `testFile` edge owned by the source file. A source
/// may pair with several tests (`a.test.ts` and `a.spec.ts`).
pub fn build_test_file_edges<'a>(
    file_nodes: impl IntoIterator<Item = &'a Node>,
    rules: &GraphRules,
) -> Vec<OwnedEdge> {
    let mut sources: Vec<(&Node, String)> = Vec::new();
    let mut tests_by_unit: HashMap<String, Vec<&Node>> = HashMap::new();

    for node in file_nodes.into_iter().filter(|n| n.is_file()) {
        let unit = logical_unit_name(&node.path, rules);
        if is_test_file(&node.path, rules) {
            tests_by_unit.entry(unit).or_default().push(node);
        } else {
            sources.push((node, unit));
        }
    }

    let mut edges = Vec::new();
    for (source, unit) in sources {
        let Some(tests) = tests_by_unit.get(&unit) else {
            continue;
        };
        for test in tests.iter().filter(|t| t.id != source.id) {
            edges.push(OwnedEdge::new(
                source.id.clone(),
                EdgeType::TestFile,
                test.id.clone(),
            ));
        }
    }
    edges
}

/// Transpose already-attached `imports` edges into `importedBy` edges owned by
/// the imported file.
///
/// Must run after every file's import edges are in place; no resolution is
/// done here.
pub fn build_dependent_edges<'a>(file_nodes: impl IntoIterator<Item = &'a Node>) -> Vec<OwnedEdge> {
    file_nodes
        .into_iter()
        .flat_map(|importer| {
            importer.edges_of(EdgeType::Imports).map(move |edge| {
                OwnedEdge::new(edge.target.clone(), EdgeType::ImportedBy, importer.id.clone())
            })
        })
        .collect()
}

//! Node builders mapping fact records to knowledge-graph nodes.
//!
//! All builders are pure apart from the `now` timestamp they are handed,
//! which stands in for `lastModified` when no history evidence exists.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::facts::{FileFacts, FunctionFact};
use crate::graph::{Node, NodeMetadata, NodeType};
use crate::paths::file_name;
use crate::rules::GraphRules;
use crate::selection::is_test_file;

/// Generate a function node ID from the owning file path and function name.
pub fn function_node_id(file_path: &str, function_name: &str) -> String {
    format!("{}:{}", file_path, function_name)
}

/// Metadata seeded from a file's version-control evidence, or the neutral
/// baseline when there is none.
fn history_metadata(fact: &FileFacts, lines: usize, now: DateTime<Utc>) -> NodeMetadata {
    let mut metadata = NodeMetadata::baseline(now);
    metadata.lines = lines;

    if let Some(git) = &fact.git {
        metadata.commits = git.commit_count;
        metadata.last_modified = git.last_modified;
        metadata.created_at = git.created_at;
        metadata.authors = git.authors.clone();
    }

    metadata
}

/// Build the node for one source file.
///
/// The id is the file path and the name its final segment. Test files get a
/// `test_command` rendered from the rules' template. Signatures, doc comments,
/// imports, exports and recent commits are carried into `raw` untouched.
pub fn build_file_node(fact: &FileFacts, rules: &GraphRules, now: DateTime<Utc>) -> Node {
    let mut metadata = history_metadata(fact, fact.lines, now);
    if is_test_file(&fact.path, rules) {
        metadata.test_command = Some(rules.test_command_for(&fact.path));
    }

    let mut node = Node::new(
        fact.path.clone(),
        NodeType::File,
        fact.path.clone(),
        file_name(&fact.path),
        metadata,
    );

    node.raw.signature = fact.functions.iter().map(|f| f.signature.clone()).collect();
    node.raw.jsdoc = fact.docs.as_ref().map(|d| d.jsdoc.clone());
    node.raw.imports = fact.imports.clone();
    node.raw.exports = fact.exports.clone();
    if let Some(git) = &fact.git {
        node.raw.recent_commits = git.recent_commits.clone();
    }

    node
}

/// Build the node for one function of a file.
///
/// History is inherited from the owning file; a function has no history of
/// its own. `raw.jsdoc` is the file's whole documentation map.
pub fn build_function_node(fact: &FileFacts, function: &FunctionFact, now: DateTime<Utc>) -> Node {
    let metadata = history_metadata(fact, function.line_count(), now);

    let mut node = Node::new(
        function_node_id(&fact.path, &function.name),
        NodeType::Function,
        fact.path.clone(),
        function.name.clone(),
        metadata,
    );

    node.raw.signature = vec![function.signature.clone()];
    node.raw.jsdoc = fact.docs.as_ref().map(|d| d.jsdoc.clone());

    node
}

/// Build the node for a directory module.
///
/// Metadata starts from the neutral baseline; see
/// [`aggregate_module_metadata`] for folding member metadata in. `readme` is
/// kept only when supplied.
pub fn build_module_node<S: AsRef<str>>(
    dir_path: &str,
    member_paths: &[S],
    readme: Option<&str>,
    now: DateTime<Utc>,
) -> Node {
    trace!(
        "Building module node {} with {} members",
        dir_path,
        member_paths.len()
    );

    let mut node = Node::new(
        dir_path,
        NodeType::Module,
        dir_path,
        file_name(dir_path),
        NodeMetadata::baseline(now),
    );
    node.raw.readme = readme.map(str::to_string);
    node
}

/// Fold member nodes' metadata into a module node.
///
/// - `lines`: sum
/// - `commits`: max (commits touching several members are not double counted)
/// - `last_modified`: latest
/// - `created_at`: earliest known
/// - `authors`: union in first-seen order
///
/// With no members the baseline is left as is.
pub fn aggregate_module_metadata(module: &mut Node, members: &[&Node]) {
    if members.is_empty() {
        return;
    }

    let metadata = &mut module.metadata;
    metadata.lines = members.iter().map(|m| m.metadata.lines).sum();
    metadata.commits = members
        .iter()
        .map(|m| m.metadata.commits)
        .max()
        .unwrap_or(0);
    if let Some(latest) = members.iter().map(|m| m.metadata.last_modified).max() {
        metadata.last_modified = latest;
    }
    metadata.created_at = members.iter().filter_map(|m| m.metadata.created_at).min();

    let mut authors: Vec<String> = Vec::new();
    for author in members.iter().flat_map(|m| m.metadata.authors.iter()) {
        if !authors.contains(author) {
            authors.push(author.clone());
        }
    }
    metadata.authors = authors;
}

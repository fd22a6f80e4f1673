//! End-to-end graph assembly tests
//!
//! Builds a small TypeScript repository from a JSON fact document and checks
//! nodes, edges and metrics of the finished graph.

use chrono::{DateTime, TimeZone, Utc};
use codelore_core::{parse_fact_document, EdgeType, GraphBuilder, KnowledgeGraph, NodeType};
use pretty_assertions::assert_eq;

const FACTS: &str = r#"{
  "files": [
    {
      "path": "src/auth/login.ts",
      "lines": 40,
      "imports": [
        { "from": "./session", "names": ["Session"] },
        { "from": "../utils/hash", "names": ["hash"] },
        { "from": "node:crypto", "names": ["randomUUID"] }
      ],
      "exports": [{ "name": "login", "kind": "function" }],
      "functions": [
        { "name": "login", "signature": "export async function login(user: string): Promise<Session>",
          "isExported": true, "isAsync": true, "startLine": 10, "endLine": 15 },
        { "name": "check", "signature": "function check(): boolean", "startLine": 20, "endLine": 22 }
      ],
      "git": {
        "commitCount": 7,
        "lastModified": "2024-01-10T00:00:00Z",
        "createdAt": "2023-12-01T00:00:00Z",
        "authors": ["ada", "grace"],
        "recentCommits": [
          { "hash": "abc123", "message": "Harden login", "author": "ada", "date": "2024-01-10T00:00:00Z" }
        ]
      },
      "docs": { "jsdoc": { "login": "Log a user in." } }
    },
    {
      "path": "src/auth/session.ts",
      "lines": 25,
      "git": {
        "commitCount": 3,
        "lastModified": "2024-01-05T00:00:00Z",
        "createdAt": "2023-11-20T00:00:00Z",
        "authors": ["grace", "linus"]
      }
    },
    { "path": "src/auth/login.test.ts", "lines": 30, "imports": [{ "from": "./login" }] },
    { "path": "src/utils/hash.ts", "lines": 12 },
    { "path": "src/utils/index.ts", "lines": 3, "imports": [{ "from": "./hash" }] },
    { "path": "src/main.ts", "lines": 8, "imports": [{ "from": "./auth/login" }, { "from": "./utils/index" }, { "from": "./utils" }] }
  ],
  "readmes": { "src/utils": "Shared helpers." }
}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
}

fn build() -> KnowledgeGraph {
    let bundle = parse_fact_document("facts.json", FACTS).expect("Failed to parse facts");
    GraphBuilder::default().build(&bundle, now())
}

fn targets(graph: &KnowledgeGraph, id: &str, edge_type: EdgeType) -> Vec<String> {
    graph
        .get(id)
        .unwrap_or_else(|| panic!("missing node {}", id))
        .edges_of(edge_type)
        .map(|e| e.target.clone())
        .collect()
}

#[test]
fn test_node_inventory() {
    let graph = build();
    let counts = graph.count_by_type();

    assert_eq!(counts.get(&NodeType::File), Some(&6));
    assert_eq!(counts.get(&NodeType::Function), Some(&1));
    // src/auth has three members, src/utils has an index file
    assert_eq!(counts.get(&NodeType::Module), Some(&2));

    for file in graph.file_nodes() {
        assert_eq!(file.id, file.path);
        assert!(file.path.ends_with(&file.name));
    }
}

#[test]
fn test_function_node() {
    let graph = build();
    let function = graph.get("src/auth/login.ts:login").unwrap();

    assert_eq!(function.node_type, NodeType::Function);
    assert_eq!(function.name, "login");
    assert_eq!(function.path, "src/auth/login.ts");
    assert_eq!(function.metadata.lines, 6);
    assert_eq!(function.metadata.commits, 7);
    assert!(!graph.contains("src/auth/login.ts:check"));

    assert_eq!(
        targets(&graph, "src/auth/login.ts", EdgeType::Contains),
        vec!["src/auth/login.ts:login"]
    );
}

#[test]
fn test_import_edges_and_dependents() {
    let graph = build();

    assert_eq!(
        targets(&graph, "src/auth/login.ts", EdgeType::Imports),
        vec!["src/auth/session.ts", "src/utils/hash.ts"]
    );
    // The bare "./utils" directory import does not resolve
    assert_eq!(
        targets(&graph, "src/main.ts", EdgeType::Imports),
        vec!["src/auth/login.ts", "src/utils/index.ts"]
    );
    assert_eq!(
        targets(&graph, "src/utils/hash.ts", EdgeType::ImportedBy),
        vec!["src/auth/login.ts", "src/utils/index.ts"]
    );
}

#[test]
fn test_imports_and_imported_by_mirror_each_other() {
    let graph = build();
    let mut forward: Vec<(String, String)> = Vec::new();
    let mut backward: Vec<(String, String)> = Vec::new();

    for node in graph.nodes() {
        for edge in node.edges_of(EdgeType::Imports) {
            forward.push((node.id.clone(), edge.target.clone()));
        }
        for edge in node.edges_of(EdgeType::ImportedBy) {
            backward.push((edge.target.clone(), node.id.clone()));
        }
    }
    forward.sort();
    backward.sort();
    assert_eq!(forward, backward);
}

#[test]
fn test_test_file_pairing() {
    let graph = build();
    assert_eq!(
        targets(&graph, "src/auth/login.ts", EdgeType::TestFile),
        vec!["src/auth/login.test.ts"]
    );
    assert!(targets(&graph, "src/auth/session.ts", EdgeType::TestFile).is_empty());

    let test_file = graph.get("src/auth/login.test.ts").unwrap();
    assert_eq!(
        test_file.metadata.test_command.as_deref(),
        Some("npm test -- src/auth/login.test.ts")
    );
    assert!(graph.get("src/auth/login.ts").unwrap().metadata.test_command.is_none());
}

#[test]
fn test_modules_and_parents() {
    let graph = build();

    let auth = graph.get("src/auth").unwrap();
    assert_eq!(auth.name, "auth");
    assert_eq!(
        targets(&graph, "src/auth", EdgeType::Contains),
        vec!["src/auth/login.ts", "src/auth/session.ts", "src/auth/login.test.ts"]
    );
    assert_eq!(targets(&graph, "src/auth/session.ts", EdgeType::Parent), vec!["src/auth"]);

    // Aggregated: summed lines, max commits, latest change, earliest creation
    assert_eq!(auth.metadata.lines, 95);
    assert_eq!(auth.metadata.commits, 7);
    assert_eq!(auth.metadata.last_modified, now());
    assert_eq!(
        auth.metadata.created_at,
        Some(Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap())
    );
    assert_eq!(auth.metadata.authors, vec!["ada", "grace", "linus"]);
    assert!(auth.raw.readme.is_none());

    let utils = graph.get("src/utils").unwrap();
    assert_eq!(utils.raw.readme.as_deref(), Some("Shared helpers."));

    // Root-level files have no module
    assert!(targets(&graph, "src/main.ts", EdgeType::Parent).is_empty());
}

#[test]
fn test_metrics() {
    let graph = build();

    let login = &graph.get("src/auth/login.ts").unwrap().metadata;
    assert_eq!(login.fan_out, Some(2));
    assert_eq!(login.fan_in, Some(2));
    assert_eq!(login.age_in_days, Some(45));
    assert_eq!(login.recency_in_days, Some(5));

    let hash = &graph.get("src/utils/hash.ts").unwrap().metadata;
    assert_eq!(hash.fan_in, Some(2));
    assert_eq!(hash.fan_out, Some(0));
    // No history: modified "now", age unknown
    assert_eq!(hash.recency_in_days, Some(0));
    assert_eq!(hash.age_in_days, None);

    for node in graph.nodes() {
        assert!(node.metadata.fan_in.is_some(), "{} has no fan-in", node.id);
        assert!(node.metadata.recency_in_days.is_some());
    }
}

#[test]
fn test_raw_evidence_carried_through() {
    let graph = build();
    let login = graph.get("src/auth/login.ts").unwrap();

    assert_eq!(login.raw.imports.len(), 3);
    assert_eq!(login.raw.exports.len(), 1);
    assert_eq!(login.raw.recent_commits[0].hash, "abc123");
    assert_eq!(
        login.raw.jsdoc.as_ref().and_then(|d| d.get("login")).map(String::as_str),
        Some("Log a user in.")
    );

    let session = graph.get("src/auth/session.ts").unwrap();
    assert!(session.raw.jsdoc.is_none());
    assert!(session.raw.recent_commits.is_empty());
}

#[test]
fn test_build_is_deterministic() {
    let first = serde_json::to_string(build().nodes()).unwrap();
    let second = serde_json::to_string(build().nodes()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_every_edge_target_exists() {
    let graph = build();
    for node in graph.nodes() {
        for edge in &node.edges {
            assert!(
                graph.contains(&edge.target),
                "{} has dangling {} edge to {}",
                node.id,
                edge.edge_type,
                edge.target
            );
        }
    }
}

//! Show command - Print one persisted node

use anyhow::{Context, Result};
use clap::Args;
use codelore_core::{EdgeType, Node, NodeStore};

use super::{load_config, open_existing_store, resolve_workspace};
use crate::GlobalOptions;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Node ID (file path, `<file>:<function>`, or module directory)
    id: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the show command
pub async fn execute(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(&global)?;
    let config = load_config(&global, &workspace)?;
    let store = open_existing_store(&config, &workspace)?;

    let node = store
        .find_by_id(&args.id)
        .context("Failed to read node store")?
        .ok_or_else(|| anyhow::anyhow!("Node not found: {}", args.id))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&node)?);
    } else {
        print_node(&node);
    }

    Ok(())
}

fn print_node(node: &Node) {
    let m = &node.metadata;

    println!("Node: {}", node.id);
    println!("  Name: {}", node.name);
    println!("  Type: {}", node.node_type);
    println!("  Path: {}", node.path);
    println!("  Lines: {}", m.lines);
    println!("  Commits: {}", m.commits);
    println!("  Last modified: {}", m.last_modified.to_rfc3339());
    if let Some(created) = m.created_at {
        println!("  Created: {}", created.to_rfc3339());
    }
    if !m.authors.is_empty() {
        println!("  Authors: {}", m.authors.join(", "));
    }
    if let Some(ref command) = m.test_command {
        println!("  Test command: {}", command);
    }

    println!("  Metrics:");
    println!("    Fan-in: {}", display_opt(m.fan_in));
    println!("    Fan-out: {}", display_opt(m.fan_out));
    println!("    Age (days): {}", display_opt(m.age_in_days));
    println!("    Recency (days): {}", display_opt(m.recency_in_days));

    if !node.edges.is_empty() {
        println!("  Edges:");
        for edge_type in EdgeType::ALL {
            let targets: Vec<&str> = node.edges_of(edge_type).map(|e| e.target.as_str()).collect();
            if !targets.is_empty() {
                println!("    {}: {}", edge_type, targets.join(", "));
            }
        }
    }

    if let Some(ref readme) = node.raw.readme {
        println!("  Readme:");
        for line in readme.lines() {
            println!("    {}", line);
        }
    }
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

//! Stats command - Node and edge counts of the persisted graph

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use codelore_core::{EdgeType, NodeStore, NodeType};
use serde::Serialize;

use super::{load_config, open_existing_store, resolve_workspace};
use crate::GlobalOptions;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Counts over every stored node
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
}

/// Execute the stats command
pub async fn execute(args: StatsArgs, global: GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(&global)?;
    let config = load_config(&global, &workspace)?;
    let store = open_existing_store(&config, &workspace)?;

    let nodes = store.find_all().context("Failed to read node store")?;

    let mut stats = StoreStats {
        total_nodes: nodes.len(),
        ..Default::default()
    };
    for node in &nodes {
        *stats.nodes_by_type.entry(node.node_type).or_insert(0) += 1;
        for edge in &node.edges {
            *stats.edges_by_type.entry(edge.edge_type).or_insert(0) += 1;
            stats.total_edges += 1;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Graph Statistics");
    println!("================");
    println!("Total nodes: {}", stats.total_nodes);
    println!("Total edges: {}", stats.total_edges);

    println!("\nNodes by type:");
    for (node_type, count) in &stats.nodes_by_type {
        println!("  {}: {}", node_type, count);
    }

    println!("\nEdges by type:");
    for (edge_type, count) in &stats.edges_by_type {
        println!("  {}: {}", edge_type, count);
    }

    Ok(())
}

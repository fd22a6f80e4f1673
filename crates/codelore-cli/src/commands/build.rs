//! Build command - Build the knowledge graph from fact files
//!
//! Fact files are read concurrently through a [`Limiter`], merged in path
//! order, assembled into a graph and upserted into the node store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use codelore_core::{
    parse_fact_document, persist_graph, BuildStats, FactBundle, GraphBuilder, Limiter,
    MemoryStore, NodeStore, SqliteStore,
};
use codelore_config::ConfigOverrides;
use futures::future::join_all;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{load_config_with, print_info, resolve_workspace};
use crate::GlobalOptions;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Fact bundle files, or directories of per-file fact records (*.json)
    #[arg(long = "facts", required = true, num_args = 1..)]
    facts: Vec<PathBuf>,

    /// Reference time for recency and age (RFC 3339, defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    now: Option<DateTime<Utc>>,

    /// Maximum fact files read concurrently (overrides limits.max_concurrent)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Test-runner template for test files (overrides graph.test_command)
    #[arg(long)]
    test_command: Option<String>,

    /// Build and report without writing the node store
    #[arg(long)]
    dry_run: bool,

    /// Output build statistics as JSON
    #[arg(long)]
    json: bool,
}

impl BuildArgs {
    /// Global overrides plus the build-specific ones
    fn config_overrides(&self, global: &GlobalOptions) -> ConfigOverrides {
        ConfigOverrides {
            max_concurrent: self.max_concurrent,
            test_command: self.test_command.clone(),
            ..global.to_config_overrides()
        }
    }
}

/// Parse an RFC 3339 timestamp into UTC
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
}

/// Execute the build command
pub async fn execute(args: BuildArgs, global: GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(&global)?;
    let config = load_config_with(&global, &workspace, args.config_overrides(&global))?;
    let now = args.now.unwrap_or_else(Utc::now);

    let files = collect_fact_files(&args.facts)?;
    if files.is_empty() {
        anyhow::bail!("No fact files found in the given paths");
    }
    print_info(&format!("Reading {} fact files...", files.len()), global.quiet);

    let limiter = Limiter::new(config.limits.max_concurrent);
    let bundle = load_facts(files, &limiter).await?;

    let builder =
        GraphBuilder::new(config.graph.clone()).context("Invalid graph configuration")?;
    let (graph, stats) = builder.build_with_stats(&bundle, now);

    let store: Box<dyn NodeStore> = if args.dry_run {
        info!("Dry run, nodes are not persisted");
        Box::new(MemoryStore::new())
    } else {
        let db_path = config.database_path(&workspace);
        Box::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open node store {}", db_path.display()))?,
        )
    };
    let written = persist_graph(store.as_ref(), &graph).context("Failed to persist graph")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if !global.quiet {
        print_summary(&stats, written, args.dry_run);
    }

    Ok(())
}

/// Expand the given paths into a sorted, de-duplicated list of fact files.
///
/// Files are taken as given; directories are walked for `*.json`.
fn collect_fact_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false) {
                let entry =
                    entry.with_context(|| format!("Failed to walk {}", path.display()))?;
                if entry.file_type().is_file() && is_json(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            anyhow::bail!("Fact path not found: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Read and decode every fact file, at most `limiter.max_concurrent()` at a
/// time, merging the results in file order.
async fn load_facts(files: Vec<PathBuf>, limiter: &Limiter) -> Result<FactBundle> {
    let reads = files.into_iter().map(|path| {
        limiter.run(move || async move {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read fact file {}", path.display()))?;
            let bundle = parse_fact_document(&path.display().to_string(), &content)?;
            debug!("Read {} records from {}", bundle.files.len(), path.display());
            anyhow::Ok(bundle)
        })
    });

    let mut merged = FactBundle::default();
    for result in join_all(reads).await {
        merged.merge(result?);
    }
    Ok(merged)
}

fn print_summary(stats: &BuildStats, written: usize, dry_run: bool) {
    println!("Graph built");
    println!("===========");
    println!("Total nodes: {}", stats.total_nodes());
    println!("Total edges: {}", stats.total_edges());

    println!("\nNodes by type:");
    for (node_type, count) in &stats.nodes_by_type {
        println!("  {}: {}", node_type, count);
    }

    println!("\nEdges by type:");
    for (edge_type, count) in &stats.edges_by_type {
        println!("  {}: {}", edge_type, count);
    }

    if stats.duplicate_files > 0 || stats.duplicate_functions > 0 {
        println!(
            "\nSkipped duplicates: {} files, {} functions",
            stats.duplicate_files, stats.duplicate_functions
        );
    }

    if dry_run {
        println!("\nDry run: {} nodes not persisted", written);
    } else {
        println!("\nPersisted {} nodes", written);
    }
}

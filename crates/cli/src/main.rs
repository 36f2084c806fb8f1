//! Evidence Nexus command line
//!
//! Loads an evidence snapshot and answers one request against it:
//! - `query`: run a query and print the result
//! - `traverse`: print the causal sub-graph around a node
//! - `contradictions` / `supporting`: print related nodes

mod args;
mod snapshot;

use crate::args::{Cli, Command};
use crate::snapshot::Snapshot;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use nexus_common::{metrics, telemetry, NexusConfig, VERSION};
use nexus_engine::QueryEngine;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => NexusConfig::from_file(path),
        None => NexusConfig::load(),
    }
    .context("failed to load configuration")?;

    telemetry::init(&config.observability)?;
    info!(
        service = %config.observability.service_name,
        "Starting Evidence Nexus v{}", VERSION
    );

    let prometheus = if config.observability.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };

    let snapshot_path = cli
        .snapshot
        .clone()
        .or_else(|| config.snapshot.path.clone())
        .ok_or_else(|| anyhow!("no snapshot given; pass --snapshot <path> or set snapshot.path"))?;

    let store = Snapshot::from_path(&snapshot_path)
        .and_then(Snapshot::into_store)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path))?;

    let engine = QueryEngine::with_config(Arc::new(store), &config.engine)?;

    match cli.command {
        Command::Query {
            text,
            strict,
            project,
        } => {
            let result = if strict || config.engine.strict_parsing {
                engine.query_strict(&text)?
            } else {
                engine.query(&text)
            };

            if project {
                print_json(&serde_json::json!({
                    "query": result.query,
                    "total_count": result.total_count,
                    "rows": result.project(),
                    "diagnostics": result.diagnostics,
                    "execution_time_ms": result.execution_time_ms,
                }))?;
            } else {
                print_json(&result)?;
            }
        }
        Command::Traverse {
            root,
            depth,
            direction,
        } => {
            let direction = direction.unwrap_or_else(|| engine.default_direction());
            let depth = depth.unwrap_or_else(|| engine.default_max_depth());

            let graph = engine.traverse_causal_chain(&root, depth, direction);
            if graph.root_node.is_none() {
                tracing::warn!(root = %root, "Root node not in snapshot");
            }
            print_json(&graph)?;
        }
        Command::Contradictions { node_id } => print_json(&engine.find_contradictions(&node_id))?,
        Command::Supporting { node_id } => print_json(&engine.find_supporting(&node_id))?,
    }

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

/// Install the Prometheus recorder with latency buckets
fn install_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    metrics::register_metrics();
    Ok(handle)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

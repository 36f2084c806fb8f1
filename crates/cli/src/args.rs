//! Command line arguments

use clap::{Parser, Subcommand};
use nexus_engine::TraversalDirection;

/// Evidence Nexus - query and traverse an evidence snapshot
#[derive(Debug, Parser)]
#[command(name = "nexus")]
#[command(author = "Evidence Nexus Team")]
#[command(version)]
#[command(about = "Query and traverse an evidence snapshot")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to the layered `config/` directory)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Evidence snapshot (overrides `snapshot.path`)
    #[arg(long, global = true)]
    pub snapshot: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Run a query against the snapshot
    Query {
        /// Query text, e.g. "SELECT * FROM evidence WHERE confidence > 0.8"
        text: String,

        /// Reject queries with unparseable fragments instead of dropping them
        #[arg(long)]
        strict: bool,

        /// Print only the selected fields of each node
        #[arg(long)]
        project: bool,
    },
    /// Walk causal links from a node
    Traverse {
        /// Root node id
        root: String,

        /// Maximum depth (defaults to `engine.default_max_depth`)
        #[arg(long)]
        depth: Option<usize>,

        /// downstream, upstream or both
        #[arg(long)]
        direction: Option<TraversalDirection>,
    },
    /// Nodes contradicting the given node
    Contradictions { node_id: String },
    /// Nodes supporting the given node
    Supporting { node_id: String },
}

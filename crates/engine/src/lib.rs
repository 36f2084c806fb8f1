//! Evidence Nexus query engine
//!
//! Read-only query layer over a store of evidence nodes:
//! - `evidence`: node model and store
//! - `query`: SQL-like query language (parse, evaluate, execute)
//! - `causal`: depth-bounded traversal of parent/child links
//! - `QueryEngine`: facade tying them together
//!
//! ```no_run
//! use std::sync::Arc;
//! use nexus_engine::{EvidenceNode, InMemoryEvidenceStore, QueryEngine};
//!
//! let mut store = InMemoryEvidenceStore::new();
//! store.add_node(EvidenceNode::builder("budget_claim", "report.pdf").build()?);
//!
//! let engine = QueryEngine::new(Arc::new(store));
//! let result = engine.query("SELECT * FROM evidence WHERE confidence > 0.8 LIMIT 10");
//! println!("{} of {} nodes", result.nodes.len(), result.total_count);
//! # Ok::<(), nexus_common::NexusError>(())
//! ```

pub mod causal;
pub mod evidence;
pub mod query;

mod engine;

pub use causal::{CausalEdge, CausalGraph, CausalTraverser, RelationshipType, TraversalDirection};
pub use engine::QueryEngine;
pub use evidence::{EvidenceNode, EvidenceNodeBuilder, EvidenceStore, FieldRef, InMemoryEvidenceStore};
pub use query::{
    Operator, OrderDirection, ParseDiagnostic, ParseMode, QueryAst, QueryCondition, QueryParser,
    QueryResult, Value,
};

//! Query engine facade
//!
//! Single entry point for callers: query text in, results out; root id in,
//! causal sub-graph out.

use crate::causal::{CausalGraph, CausalTraverser, TraversalDirection};
use crate::evidence::{EvidenceNode, EvidenceStore, InMemoryEvidenceStore};
use crate::query::{ParseMode, ParsedQuery, QueryCondition, QueryExecutor, QueryParser, QueryResult};
use nexus_common::config::EngineConfig;
use nexus_common::errors::Result;
use nexus_common::{metrics, DEFAULT_MAX_DEPTH};
use std::sync::Arc;

/// Facade over an evidence store snapshot
#[derive(Debug)]
pub struct QueryEngine<S: EvidenceStore = InMemoryEvidenceStore> {
    store: Arc<S>,
    default_max_depth: usize,
    default_direction: TraversalDirection,
}

impl<S: EvidenceStore> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_max_depth: self.default_max_depth,
            default_direction: self.default_direction,
        }
    }
}

impl<S: EvidenceStore> QueryEngine<S> {
    /// Create an engine with built-in traversal defaults
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            default_max_depth: DEFAULT_MAX_DEPTH,
            default_direction: TraversalDirection::Downstream,
        }
    }

    /// Create an engine taking traversal defaults from configuration
    pub fn with_config(store: Arc<S>, config: &EngineConfig) -> Result<Self> {
        let default_direction = config.default_direction.parse()?;
        Ok(Self {
            store,
            default_max_depth: config.default_max_depth,
            default_direction,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_max_depth(&self) -> usize {
        self.default_max_depth
    }

    pub fn default_direction(&self) -> TraversalDirection {
        self.default_direction
    }

    /// Run a query, dropping any fragment that does not parse
    pub fn query(&self, query: &str) -> QueryResult {
        let parsed = QueryParser::new(ParseMode::Lenient).parse(query);
        self.run(query, parsed)
    }

    /// Run a query, failing on the first fragment that does not parse
    pub fn query_strict(&self, query: &str) -> Result<QueryResult> {
        let parsed = QueryParser::new(ParseMode::Strict).parse_with_mode(query)?;
        Ok(self.run(query, parsed))
    }

    fn run(&self, query: &str, parsed: ParsedQuery) -> QueryResult {
        metrics::record_dropped_fragments(parsed.diagnostics.len());

        let mut result = QueryExecutor::new(self.store.as_ref()).execute(&parsed.ast);
        result.query = query.to_string();
        result.diagnostics = parsed.diagnostics;
        result
    }

    /// Walk causal links from `root_id`
    pub fn traverse_causal_chain(
        &self,
        root_id: &str,
        max_depth: usize,
        direction: TraversalDirection,
    ) -> CausalGraph {
        CausalTraverser::new(self.store.as_ref()).traverse(root_id, max_depth, direction)
    }

    /// Walk causal links from `root_id` with the configured depth and direction
    pub fn traverse_with_defaults(&self, root_id: &str) -> CausalGraph {
        self.traverse_causal_chain(root_id, self.default_max_depth, self.default_direction)
    }

    /// Nodes registered as contradicting `node_id`
    pub fn find_contradictions(&self, node_id: &str) -> Vec<EvidenceNode> {
        self.query(&relation_query(QueryCondition::contradicts(node_id))).nodes
    }

    /// Nodes registered as supporting `node_id`
    pub fn find_supporting(&self, node_id: &str) -> Vec<EvidenceNode> {
        self.query(&relation_query(QueryCondition::supports(node_id))).nodes
    }
}

fn relation_query(condition: QueryCondition) -> String {
    format!("SELECT * FROM evidence WHERE {}", condition)
}

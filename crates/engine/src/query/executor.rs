//! Query execution: filter, sort, paginate

use super::{selects_all, ConditionEvaluator, OrderDirection, ParseDiagnostic, QueryAst};
use crate::evidence::{EvidenceNode, EvidenceStore, FieldRef};
use nexus_common::metrics;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::time::Instant;

/// Query execution result
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Matching nodes after sort and pagination (always full nodes)
    pub nodes: Vec<EvidenceNode>,

    /// Number of matches before offset/limit
    pub total_count: usize,

    /// Query text as submitted
    pub query: String,

    /// Fields named in the SELECT list
    pub select_fields: Vec<String>,

    /// Fragments dropped while parsing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ParseDiagnostic>,

    pub execution_time_ms: f64,
}

impl QueryResult {
    /// Per-node JSON objects restricted to the selected fields.
    ///
    /// `*` yields the whole node; a selected field the node lacks maps to null.
    pub fn project(&self) -> Vec<Map<String, Value>> {
        let all = selects_all(&self.select_fields);

        self.nodes
            .iter()
            .map(|node| {
                if all {
                    return match serde_json::to_value(node) {
                        Ok(Value::Object(map)) => map,
                        _ => Map::new(),
                    };
                }
                self.select_fields
                    .iter()
                    .map(|field| {
                        let value = node
                            .resolve(field)
                            .map(|resolved| resolved.to_json())
                            .unwrap_or(Value::Null);
                        (field.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Sort key for `ORDER BY`; kinds order as bool < number < string
#[derive(Debug, Clone)]
enum SortKey {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(node: &EvidenceNode, field: &str) -> Self {
        match node.resolve(field) {
            Some(FieldRef::Bool(b)) => SortKey::Bool(b),
            Some(FieldRef::Int(i)) => SortKey::Number(i as f64),
            Some(FieldRef::Float(f)) => SortKey::Number(f),
            Some(FieldRef::Text(s)) => SortKey::Text(s.to_string()),
            Some(other) => SortKey::Text(other.render()),
            None => SortKey::Text(String::new()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Runs a parsed query against a store
pub struct QueryExecutor<'s, S: EvidenceStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EvidenceStore + ?Sized> QueryExecutor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Execute `ast`.
    ///
    /// `query` on the result is the canonical form of `ast`; callers that
    /// hold the submitted text overwrite it.
    pub fn execute(&self, ast: &QueryAst) -> QueryResult {
        let start = Instant::now();
        let evaluator = ConditionEvaluator::new(self.store);

        let mut matched: Vec<&EvidenceNode> = self
            .store
            .all_nodes()
            .filter(|node| evaluator.matches_all(node, &ast.conditions))
            .collect();
        let total_count = matched.len();

        if let Some(field) = &ast.order_by {
            let mut keyed: Vec<(SortKey, &EvidenceNode)> = matched
                .into_iter()
                .map(|node| (SortKey::of(node, field), node))
                .collect();
            // sort_by is stable, so equal keys keep scan order in both directions
            match ast.order_direction {
                OrderDirection::Asc => keyed.sort_by(|a, b| a.0.compare(&b.0)),
                OrderDirection::Desc => keyed.sort_by(|a, b| b.0.compare(&a.0)),
            }
            matched = keyed.into_iter().map(|(_, node)| node).collect();
        }

        let nodes: Vec<EvidenceNode> = matched
            .into_iter()
            .skip(ast.offset)
            .take(ast.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let elapsed = start.elapsed();
        metrics::record_query(elapsed.as_secs_f64(), total_count, nodes.len());

        tracing::debug!(
            conditions = ast.conditions.len(),
            total_count,
            returned = nodes.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Query executed"
        );

        QueryResult {
            nodes,
            total_count,
            query: ast.to_string(),
            select_fields: ast.select_fields.clone(),
            diagnostics: Vec::new(),
            execution_time_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

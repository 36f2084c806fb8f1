//! End-to-end behaviour through the `QueryEngine` facade

use nexus_engine::{EvidenceNode, InMemoryEvidenceStore, QueryEngine, TraversalDirection};
use std::sync::Arc;

fn confidence_store() -> InMemoryEvidenceStore {
    let confidences = [0.9, 0.5, 0.95, 0.3, 0.99];
    InMemoryEvidenceStore::with_nodes(confidences.iter().enumerate().map(|(i, &c)| {
        EvidenceNode::builder("claim", "report.pdf")
            .id(format!("n{}", i + 1))
            .confidence(c)
            .build()
            .unwrap()
    }))
}

fn ids(nodes: &[EvidenceNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.node_id.as_str()).collect()
}

#[test]
fn test_confidence_filter_with_limit() {
    let engine = QueryEngine::new(Arc::new(confidence_store()));
    let result = engine.query("SELECT * FROM evidence WHERE confidence > 0.8 LIMIT 2");

    assert_eq!(ids(&result.nodes), vec!["n1", "n3"]);
    assert_eq!(result.total_count, 3);
    assert!(result.execution_time_ms >= 0.0);
}

#[test]
fn test_contradictions_are_symmetric() {
    let mut store = confidence_store();
    store.add_contradiction("n1", "n2");
    let engine = QueryEngine::new(Arc::new(store));

    assert_eq!(ids(&engine.find_contradictions("n2")), vec!["n1"]);
    assert_eq!(ids(&engine.find_contradictions("n1")), vec!["n2"]);
    assert!(engine.find_contradictions("n3").is_empty());
}

#[test]
fn test_contains_on_content_field() {
    let store = InMemoryEvidenceStore::with_nodes(vec![
        EvidenceNode::builder("budget_claim", "report.pdf")
            .id("tagged")
            .field("tag", "annual_budget_2024")
            .build()
            .unwrap(),
        EvidenceNode::builder("budget_claim", "report.pdf")
            .id("untagged")
            .field("other", "budget")
            .build()
            .unwrap(),
    ]);
    let engine = QueryEngine::new(Arc::new(store));

    let result = engine.query("SELECT * FROM evidence WHERE tag CONTAINS 'budget'");
    assert_eq!(ids(&result.nodes), vec!["tagged"]);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_malformed_query_degrades_to_results() {
    let engine = QueryEngine::new(Arc::new(confidence_store()));

    let result = engine.query("SELECT * FROM evidence WHERE confidence ~ 0.5 ORDER BY confidence DESC");
    assert_eq!(ids(&result.nodes), vec!["n5", "n3", "n1", "n2", "n4"]);
    assert_eq!(result.diagnostics.len(), 1);

    assert!(engine
        .query_strict("SELECT * FROM evidence WHERE confidence ~ 0.5")
        .is_err());
}

#[test]
fn test_cycle_visits_each_node_once() {
    let store = InMemoryEvidenceStore::with_nodes(vec![
        EvidenceNode::builder("c", "s").id("A").child("B").parent("B").build().unwrap(),
        EvidenceNode::builder("c", "s").id("B").child("A").parent("A").build().unwrap(),
    ]);
    let engine = QueryEngine::new(Arc::new(store));

    for direction in [TraversalDirection::Downstream, TraversalDirection::Upstream, TraversalDirection::Both] {
        let graph = engine.traverse_causal_chain("A", 3, direction);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains("A") && graph.contains("B"));
    }
}

#[test]
fn test_depth_bound_on_chain() {
    let store = InMemoryEvidenceStore::with_nodes(vec![
        EvidenceNode::builder("c", "s").id("A").child("B").build().unwrap(),
        EvidenceNode::builder("c", "s").id("B").parent("A").child("C").build().unwrap(),
        EvidenceNode::builder("c", "s").id("C").parent("B").child("D").build().unwrap(),
        EvidenceNode::builder("c", "s").id("D").parent("C").build().unwrap(),
    ]);
    let engine = QueryEngine::new(Arc::new(store));

    let graph = engine.traverse_causal_chain("A", 1, TraversalDirection::Downstream);
    let visited: Vec<&str> = graph.nodes.keys().map(|k| k.as_str()).collect();
    assert_eq!(visited, vec!["A", "B"]);

    let from_leaf = engine.traverse_causal_chain("D", 5, "upstream".parse().unwrap());
    assert_eq!(from_leaf.node_count(), 4);
}

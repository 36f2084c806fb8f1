//! Evidence store abstraction and the in-memory implementation

use super::EvidenceNode;
use std::collections::{HashMap, HashSet};

/// Read side of an evidence store.
///
/// The query engine only ever reads through this trait, so a store must
/// not change underneath an in-flight call.
pub trait EvidenceStore: Send + Sync {
    /// Look up a node by id
    fn get_node(&self, node_id: &str) -> Option<&EvidenceNode>;

    /// All nodes in a stable order (insertion order for the in-memory store)
    fn all_nodes(&self) -> Box<dyn Iterator<Item = &EvidenceNode> + '_>;

    /// Whether `a` and `b` are registered as contradicting (symmetric)
    fn has_contradiction(&self, a: &str, b: &str) -> bool;

    /// Whether `a` is registered as supporting `b`
    fn has_support(&self, a: &str, b: &str) -> bool;

    /// Number of nodes
    fn node_count(&self) -> usize {
        self.all_nodes().count()
    }
}

/// In-memory evidence store
#[derive(Debug, Clone, Default)]
pub struct InMemoryEvidenceStore {
    /// Nodes in insertion order
    nodes: Vec<EvidenceNode>,

    /// node_id -> position in `nodes`
    index: HashMap<String, usize>,

    /// node_id -> ids it contradicts (stored both ways)
    contradictions: HashMap<String, HashSet<String>>,

    /// supporter id -> ids it supports
    supports: HashMap<String, HashSet<String>>,
}

impl InMemoryEvidenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from nodes, keeping the first node seen per id
    pub fn with_nodes(nodes: impl IntoIterator<Item = EvidenceNode>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.add_node(node);
        }
        store
    }

    /// Add a node. Returns false (and keeps the existing node) if the id is taken.
    pub fn add_node(&mut self, node: EvidenceNode) -> bool {
        if self.index.contains_key(&node.node_id) {
            tracing::debug!(node_id = %node.node_id, "Node already present, keeping first");
            return false;
        }
        self.index.insert(node.node_id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Register a symmetric contradiction. Returns false if already known.
    pub fn add_contradiction(&mut self, a: impl Into<String>, b: impl Into<String>) -> bool {
        let (a, b) = (a.into(), b.into());
        let added = self
            .contradictions
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
        self.contradictions.entry(b).or_default().insert(a);
        added
    }

    /// Register that `supporter` supports `supported`. Returns false if already known.
    pub fn add_support(&mut self, supporter: impl Into<String>, supported: impl Into<String>) -> bool {
        self.supports
            .entry(supporter.into())
            .or_default()
            .insert(supported.into())
    }

    /// Check whether a node id is present
    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn get_node(&self, node_id: &str) -> Option<&EvidenceNode> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    fn all_nodes(&self) -> Box<dyn Iterator<Item = &EvidenceNode> + '_> {
        Box::new(self.nodes.iter())
    }

    fn has_contradiction(&self, a: &str, b: &str) -> bool {
        self.contradictions
            .get(a)
            .map(|ids| ids.contains(b))
            .unwrap_or(false)
    }

    fn has_support(&self, a: &str, b: &str) -> bool {
        self.supports.get(a).map(|ids| ids.contains(b)).unwrap_or(false)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> EvidenceNode {
        EvidenceNode::builder("claim", "test")
            .id(id)
            .timestamp("2024-01-01T00:00:00Z")
            .build()
            .unwrap()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let store = InMemoryEvidenceStore::with_nodes(["c", "a", "b"].map(node));
        let ids: Vec<&str> = store.all_nodes().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(store.node_count(), 3);
        assert!(store.contains("a"));
        assert!(!store.contains("z"));
        assert!(!store.is_empty());
        assert!(InMemoryEvidenceStore::new().is_empty());
    }

    #[test]
    fn test_add_node_idempotent_per_id() {
        let mut store = InMemoryEvidenceStore::new();
        assert!(store.add_node(node("n1")));

        let mut replacement = node("n1");
        replacement.claim_type = "other".into();
        assert!(!store.add_node(replacement));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_node("n1").unwrap().claim_type, "claim");
    }

    #[test]
    fn test_contradiction_symmetric() {
        let mut store = InMemoryEvidenceStore::new();
        assert!(store.add_contradiction("n1", "n2"));
        assert!(!store.add_contradiction("n2", "n1"));

        assert!(store.has_contradiction("n1", "n2"));
        assert!(store.has_contradiction("n2", "n1"));
        assert!(!store.has_contradiction("n1", "n3"));
    }

    #[test]
    fn test_support_directional() {
        let mut store = InMemoryEvidenceStore::new();
        assert!(store.add_support("n1", "n2"));
        assert!(!store.add_support("n1", "n2"));

        assert!(store.has_support("n1", "n2"));
        assert!(!store.has_support("n2", "n1"));
    }
}

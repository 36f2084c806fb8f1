//! Depth-first causal traversal
//!
//! Walks with an explicit frame stack instead of native recursion so an
//! adversarial graph cannot exhaust the host stack. The visit order and edge
//! order are exactly those of the recursive pre-order walk: a link's edge is
//! recorded, then the link is entered before the next sibling is looked at.

use super::{CausalEdge, CausalGraph, TraversalDirection};
use crate::evidence::{EvidenceNode, EvidenceStore};
use nexus_common::metrics;
use std::collections::HashSet;
use std::time::Instant;

/// One expanded node waiting on its remaining neighbours
struct Frame {
    node_id: String,
    depth: usize,
    neighbours: Vec<String>,
    cursor: usize,
}

/// Depth-bounded walker over a store's parent/child links
pub struct CausalTraverser<'s, S: EvidenceStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EvidenceStore + ?Sized> CausalTraverser<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Collect everything reachable from `root_id` within `max_depth` links.
    ///
    /// An unknown root yields an empty graph.
    pub fn traverse(&self, root_id: &str, max_depth: usize, direction: TraversalDirection) -> CausalGraph {
        let start = Instant::now();
        let mut graph = CausalGraph::default();

        let root = match self.store.get_node(root_id) {
            Some(node) => node,
            None => {
                tracing::debug!(root_id, "Traversal root not found");
                return graph;
            }
        };
        graph.root_node = Some(root.clone());

        let relationship = direction.relationship();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<Frame> = Vec::new();

        if let Some(frame) = self.enter(root_id, 0, max_depth, direction, &mut visited, &mut graph) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.cursor >= frame.neighbours.len() {
                stack.pop();
                continue;
            }

            let to_id = frame.neighbours[frame.cursor].clone();
            frame.cursor += 1;
            let depth = frame.depth + 1;

            graph.edges.push(CausalEdge {
                from_id: frame.node_id.clone(),
                to_id: to_id.clone(),
                relationship_type: relationship,
                weight: 1.0,
            });

            if let Some(next) = self.enter(&to_id, depth, max_depth, direction, &mut visited, &mut graph) {
                stack.push(next);
            }
        }

        let elapsed = start.elapsed();
        metrics::record_traversal(
            elapsed.as_secs_f64(),
            direction.as_str(),
            graph.node_count(),
            graph.edge_count(),
        );

        tracing::debug!(
            root_id,
            max_depth,
            direction = %direction,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Causal traversal finished"
        );

        graph
    }

    /// Visit a node; returns its frame if it should be expanded
    fn enter(
        &self,
        node_id: &str,
        depth: usize,
        max_depth: usize,
        direction: TraversalDirection,
        visited: &mut HashSet<String>,
        graph: &mut CausalGraph,
    ) -> Option<Frame> {
        if depth > max_depth || visited.contains(node_id) {
            return None;
        }
        visited.insert(node_id.to_string());

        let node: &EvidenceNode = self.store.get_node(node_id)?;
        graph.nodes.insert(node_id.to_string(), node.clone());

        Some(Frame {
            node_id: node_id.to_string(),
            depth,
            neighbours: direction.neighbours(node),
            cursor: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::causal::RelationshipType;
    use crate::evidence::InMemoryEvidenceStore;

    fn node(id: &str, parents: &[&str], children: &[&str]) -> EvidenceNode {
        let mut builder = EvidenceNode::builder("claim", "src").id(id);
        for parent in parents {
            builder = builder.parent(*parent);
        }
        for child in children {
            builder = builder.child(*child);
        }
        builder.build().unwrap()
    }

    fn edge_pairs(graph: &CausalGraph) -> Vec<(&str, &str)> {
        graph
            .edges
            .iter()
            .map(|e| (e.from_id.as_str(), e.to_id.as_str()))
            .collect()
    }

    fn node_ids(graph: &CausalGraph) -> Vec<&str> {
        graph.nodes.keys().map(|k| k.as_str()).collect()
    }

    #[test]
    fn test_cycle_terminates() {
        let store = InMemoryEvidenceStore::with_nodes(vec![
            node("A", &["B"], &["B"]),
            node("B", &["A"], &["A"]),
        ]);
        let graph = CausalTraverser::new(&store).traverse("A", 3, TraversalDirection::Downstream);

        assert_eq!(node_ids(&graph), vec!["A", "B"]);
        // B's link back to A is still recorded, A is just not re-entered
        assert_eq!(edge_pairs(&graph), vec![("A", "B"), ("B", "A")]);
    }

    #[test]
    fn test_depth_bound() {
        let store = InMemoryEvidenceStore::with_nodes(vec![
            node("A", &[], &["B"]),
            node("B", &["A"], &["C"]),
            node("C", &["B"], &["D"]),
            node("D", &["C"], &[]),
        ]);
        let traverser = CausalTraverser::new(&store);

        let graph = traverser.traverse("A", 1, TraversalDirection::Downstream);
        assert_eq!(node_ids(&graph), vec!["A", "B"]);
        assert_eq!(edge_pairs(&graph), vec![("A", "B"), ("B", "C")]);
        assert_eq!(graph.dangling_edges().count(), 1);

        let zero = traverser.traverse("A", 0, TraversalDirection::Downstream);
        assert_eq!(node_ids(&zero), vec!["A"]);
        assert_eq!(edge_pairs(&zero), vec![("A", "B")]);

        let full = traverser.traverse("A", 5, TraversalDirection::Downstream);
        assert_eq!(full.node_count(), 4);
        assert_eq!(full.dangling_edges().count(), 0);
    }

    #[test]
    fn test_unknown_root_is_empty() {
        let store = InMemoryEvidenceStore::with_nodes(vec![node("A", &[], &[])]);
        let graph = CausalTraverser::new(&store).traverse("zzz", 5, TraversalDirection::Both);
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_missing_target_keeps_edge() {
        let store = InMemoryEvidenceStore::with_nodes(vec![node("A", &[], &["ghost", "B"]), node("B", &[], &[])]);
        let graph = CausalTraverser::new(&store).traverse("A", 5, TraversalDirection::Downstream);
        assert_eq!(node_ids(&graph), vec!["A", "B"]);
        assert_eq!(edge_pairs(&graph), vec![("A", "ghost"), ("A", "B")]);
        let dangling: Vec<&str> = graph.dangling_edges().map(|e| e.to_id.as_str()).collect();
        assert_eq!(dangling, vec!["ghost"]);
    }

    #[test]
    fn test_asymmetric_link_tolerated() {
        // A lists B as a child, B lists no parent
        let store = InMemoryEvidenceStore::with_nodes(vec![node("A", &[], &["B"]), node("B", &[], &[])]);
        let traverser = CausalTraverser::new(&store);

        let down = traverser.traverse("A", 5, TraversalDirection::Downstream);
        assert_eq!(node_ids(&down), vec!["A", "B"]);

        let up = traverser.traverse("B", 5, TraversalDirection::Upstream);
        assert_eq!(node_ids(&up), vec!["B"]);
        assert_eq!(up.edge_count(), 0);

        let both = traverser.traverse("B", 5, TraversalDirection::Both);
        assert_eq!(node_ids(&both), vec!["B"]);
    }

    #[test]
    fn test_preorder_edge_order() {
        //     R
        //    / \
        //   X   Y
        //   |
        //   Z
        let store = InMemoryEvidenceStore::with_nodes(vec![
            node("R", &[], &["X", "Y"]),
            node("X", &["R"], &["Z"]),
            node("Y", &["R"], &[]),
            node("Z", &["X"], &[]),
        ]);
        let graph = CausalTraverser::new(&store).traverse("R", 5, TraversalDirection::Downstream);
        assert_eq!(edge_pairs(&graph), vec![("R", "X"), ("X", "Z"), ("R", "Y")]);
        assert!(graph.edges.iter().all(|e| e.relationship_type == RelationshipType::Causes));
        assert!(graph.edges.iter().all(|e| e.weight == 1.0));
    }

    #[test]
    fn test_upstream_and_both() {
        let store = InMemoryEvidenceStore::with_nodes(vec![
            node("P", &[], &["M"]),
            node("M", &["P"], &["C"]),
            node("C", &["M"], &[]),
        ]);
        let traverser = CausalTraverser::new(&store);

        let up = traverser.traverse("C", 5, TraversalDirection::Upstream);
        assert_eq!(edge_pairs(&up), vec![("C", "M"), ("M", "P")]);
        assert!(up.edges.iter().all(|e| e.relationship_type == RelationshipType::CausedBy));

        let both = traverser.traverse("M", 5, TraversalDirection::Both);
        assert_eq!(node_ids(&both), vec!["C", "M", "P"]);
        assert_eq!(edge_pairs(&both), vec![("M", "C"), ("C", "M"), ("M", "P"), ("P", "M")]);
        assert!(both.edges.iter().all(|e| e.relationship_type == RelationshipType::RelatedTo));
        assert_eq!(both.root_node.as_ref().map(|n| n.node_id.as_str()), Some("M"));
    }
}

//! Causal graph module
//!
//! Provides:
//! - Depth-bounded, cycle-safe walks over parent/child links
//! - The sub-graph value object traversals return

mod traversal;

pub use traversal::CausalTraverser;

use crate::evidence::EvidenceNode;
use nexus_common::errors::{NexusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label on an edge produced during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Followed a `child_ids` link
    Causes,
    /// Followed a `parent_ids` link
    CausedBy,
    /// Followed either kind while walking both ways
    RelatedTo,
}

/// Edge discovered during traversal; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    pub from_id: String,
    pub to_id: String,
    pub relationship_type: RelationshipType,
    pub weight: f64,
}

/// Which links a traversal follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    /// Follow `child_ids`
    #[default]
    Downstream,
    /// Follow `parent_ids`
    Upstream,
    /// Children first, then parents
    Both,
}

impl TraversalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalDirection::Downstream => "downstream",
            TraversalDirection::Upstream => "upstream",
            TraversalDirection::Both => "both",
        }
    }

    /// Edge label this direction produces
    pub fn relationship(&self) -> RelationshipType {
        match self {
            TraversalDirection::Downstream => RelationshipType::Causes,
            TraversalDirection::Upstream => RelationshipType::CausedBy,
            TraversalDirection::Both => RelationshipType::RelatedTo,
        }
    }

    /// Neighbour ids of `node` in the order they are followed
    pub(crate) fn neighbours(&self, node: &EvidenceNode) -> Vec<String> {
        match self {
            TraversalDirection::Downstream => node.child_ids.clone(),
            TraversalDirection::Upstream => node.parent_ids.clone(),
            TraversalDirection::Both => node
                .child_ids
                .iter()
                .chain(node.parent_ids.iter())
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for TraversalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraversalDirection {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "downstream" => Ok(TraversalDirection::Downstream),
            "upstream" => Ok(TraversalDirection::Upstream),
            "both" => Ok(TraversalDirection::Both),
            _ => Err(NexusError::InvalidDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// Connected sub-graph reached from a root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CausalGraph {
    /// `None` when the root id is unknown
    pub root_node: Option<EvidenceNode>,

    /// Every node visited, by id
    pub nodes: BTreeMap<String, EvidenceNode>,

    /// Edges in discovery order; targets may be absent from `nodes`
    pub edges: Vec<CausalEdge>,
}

impl CausalGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.root_node.is_none()
    }

    /// Edges whose target was never recorded (missing from the store or
    /// beyond the depth bound)
    pub fn dangling_edges(&self) -> impl Iterator<Item = &CausalEdge> + '_ {
        self.edges.iter().filter(move |edge| !self.contains(&edge.to_id))
    }
}

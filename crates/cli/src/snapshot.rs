//! Evidence snapshot files
//!
//! A snapshot is a JSON document with the nodes and relation pairs needed to
//! rebuild an in-memory store:
//!
//! ```json
//! { "nodes": [...], "contradictions": [["a", "b"]], "supports": [["a", "b"]] }
//! ```

use nexus_common::errors::{NexusError, Result};
use nexus_engine::{EvidenceNode, InMemoryEvidenceStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<EvidenceNode>,

    /// Symmetric pairs
    #[serde(default)]
    pub contradictions: Vec<(String, String)>,

    /// `(supporter, supported)` pairs
    #[serde(default)]
    pub supports: Vec<(String, String)>,
}

impl Snapshot {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| NexusError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate every node and build the store.
    ///
    /// Relation pairs must name nodes present in the snapshot.
    pub fn into_store(self) -> Result<InMemoryEvidenceStore> {
        let mut store = InMemoryEvidenceStore::new();
        for node in self.nodes {
            node.ensure_valid()?;
            let node_id = node.node_id.clone();
            if !store.add_node(node) {
                tracing::warn!(node_id = %node_id, "Duplicate node in snapshot, keeping first");
            }
        }

        for (a, b) in self.contradictions {
            require(&store, &a)?;
            require(&store, &b)?;
            store.add_contradiction(a, b);
        }
        for (supporter, supported) in self.supports {
            require(&store, &supporter)?;
            require(&store, &supported)?;
            store.add_support(supporter, supported);
        }

        tracing::info!(nodes = store.len(), "Snapshot loaded");
        Ok(store)
    }
}

fn require(store: &InMemoryEvidenceStore, node_id: &str) -> Result<()> {
    if store.contains(node_id) {
        Ok(())
    } else {
        Err(NexusError::NodeNotFound {
            id: node_id.to_string(),
        })
    }
}

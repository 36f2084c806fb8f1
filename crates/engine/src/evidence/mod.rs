//! Evidence store and node model
//!
//! Nodes live in an id-indexed arena; causal edges are id lists on the
//! nodes themselves, relations are id-pair sets on the store.

mod node;
mod store;

pub use node::{EvidenceNode, EvidenceNodeBuilder, FieldRef};
pub use store::{EvidenceStore, InMemoryEvidenceStore};

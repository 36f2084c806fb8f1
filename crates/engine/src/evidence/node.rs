//! Evidence node representation
//!
//! Nodes are immutable once built. Identity (`node_id`, `merkle_hash`) is
//! derived from content by the builder but treated as opaque everywhere else.

use chrono::{SecondsFormat, Utc};
use nexus_common::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use validator::Validate;

/// Length of a derived node id in hex characters
const DERIVED_ID_LEN: usize = 16;

/// Immutable claim in the evidence DAG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EvidenceNode {
    /// Content-derived primary key
    #[validate(length(min = 1))]
    pub node_id: String,

    /// Classification tag
    #[validate(length(min = 1))]
    pub claim_type: String,

    /// Claim payload; conditions fall back into this map
    #[serde(default)]
    pub content: Map<String, Value>,

    #[serde(default)]
    pub source: String,

    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    /// ISO-8601 timestamp
    #[serde(default)]
    pub timestamp: String,

    /// Causes of this claim ("caused_by")
    #[serde(default)]
    pub parent_ids: Vec<String>,

    /// Effects of this claim ("causes")
    #[serde(default)]
    pub child_ids: Vec<String>,

    #[serde(default)]
    pub merkle_hash: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Borrowed view of a resolved field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
    /// Ordered id lists (`parent_ids`, `child_ids`)
    List(&'a [String]),
    Tags(&'a BTreeSet<String>),
    /// Arrays and objects stored in `content`
    Json(&'a Value),
}

impl<'a> FieldRef<'a> {
    fn from_json(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldRef::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldRef::Int(i)),
                None => n.as_f64().map(FieldRef::Float),
            },
            Value::String(s) => Some(FieldRef::Text(s)),
            Value::Array(_) | Value::Object(_) => Some(FieldRef::Json(value)),
        }
    }

    /// String form used by `CONTAINS` and for sorting non-scalar values.
    ///
    /// Strings render verbatim, integers and bools via display, floats with
    /// their fractional part (`1.0`, not `1`), collections as JSON text.
    pub fn render(&self) -> String {
        match self {
            FieldRef::Bool(b) => b.to_string(),
            FieldRef::Int(i) => i.to_string(),
            FieldRef::Float(f) => format!("{:?}", f),
            FieldRef::Text(s) => (*s).to_string(),
            FieldRef::List(items) => Value::from(items.to_vec()).to_string(),
            FieldRef::Tags(tags) => {
                Value::from(tags.iter().cloned().collect::<Vec<_>>()).to_string()
            }
            FieldRef::Json(value) => value.to_string(),
        }
    }

    /// Owned JSON copy, used for projections
    pub fn to_json(&self) -> Value {
        match self {
            FieldRef::Bool(b) => Value::Bool(*b),
            FieldRef::Int(i) => Value::from(*i),
            FieldRef::Float(f) => Value::from(*f),
            FieldRef::Text(s) => Value::from(*s),
            FieldRef::List(items) => Value::from(items.to_vec()),
            FieldRef::Tags(tags) => Value::from(tags.iter().cloned().collect::<Vec<_>>()),
            FieldRef::Json(value) => (*value).clone(),
        }
    }
}

impl EvidenceNode {
    /// Start building a node
    pub fn builder(claim_type: impl Into<String>, source: impl Into<String>) -> EvidenceNodeBuilder {
        EvidenceNodeBuilder::new(claim_type, source)
    }

    /// Resolve a field by name: struct attributes first, then `content`.
    ///
    /// Returns `None` when neither has it (or the content value is null).
    pub fn resolve(&self, field: &str) -> Option<FieldRef<'_>> {
        match field {
            "node_id" => Some(FieldRef::Text(&self.node_id)),
            "claim_type" => Some(FieldRef::Text(&self.claim_type)),
            "source" => Some(FieldRef::Text(&self.source)),
            "confidence" => Some(FieldRef::Float(self.confidence)),
            "timestamp" => Some(FieldRef::Text(&self.timestamp)),
            "merkle_hash" => Some(FieldRef::Text(&self.merkle_hash)),
            "parent_ids" => Some(FieldRef::List(&self.parent_ids)),
            "child_ids" => Some(FieldRef::List(&self.child_ids)),
            "tags" => Some(FieldRef::Tags(&self.tags)),
            _ => self.content.get(field).and_then(FieldRef::from_json),
        }
    }

    /// Check a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Re-check field constraints on a node that did not come from the builder
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}

/// Builder for `EvidenceNode`
#[derive(Debug, Clone)]
pub struct EvidenceNodeBuilder {
    node_id: Option<String>,
    claim_type: String,
    source: String,
    content: Map<String, Value>,
    confidence: f64,
    timestamp: Option<String>,
    parent_ids: Vec<String>,
    child_ids: Vec<String>,
    merkle_hash: Option<String>,
    tags: BTreeSet<String>,
}

impl EvidenceNodeBuilder {
    fn new(claim_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            node_id: None,
            claim_type: claim_type.into(),
            source: source.into(),
            content: Map::new(),
            confidence: 1.0,
            timestamp: None,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
            merkle_hash: None,
            tags: BTreeSet::new(),
        }
    }

    /// Use an explicit id instead of the content-derived one
    pub fn id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    pub fn content(mut self, content: Map<String, Value>) -> Self {
        self.content = content;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_ids.push(parent_id.into());
        self
    }

    pub fn child(mut self, child_id: impl Into<String>) -> Self {
        self.child_ids.push(child_id.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn merkle_hash(mut self, hash: impl Into<String>) -> Self {
        self.merkle_hash = Some(hash.into());
        self
    }

    /// Derive missing identity fields and validate
    pub fn build(self) -> Result<EvidenceNode> {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let mut hasher = Sha256::new();
        hasher.update(self.claim_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(&self.content)?);
        hasher.update([0u8]);
        hasher.update(self.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(timestamp.as_bytes());
        let content_digest = hasher.finalize();

        let node_id = match self.node_id {
            Some(id) => id,
            None => hex::encode(&content_digest)[..DERIVED_ID_LEN].to_string(),
        };

        let merkle_hash = match self.merkle_hash {
            Some(hash) => hash,
            None => {
                let mut parents: Vec<&String> = self.parent_ids.iter().collect();
                parents.sort();
                let mut chain = Sha256::new();
                chain.update(&content_digest);
                for parent in parents {
                    chain.update(parent.as_bytes());
                    chain.update([0u8]);
                }
                hex::encode(chain.finalize())
            }
        };

        let node = EvidenceNode {
            node_id,
            claim_type: self.claim_type,
            content: self.content,
            source: self.source,
            confidence: self.confidence,
            timestamp,
            parent_ids: self.parent_ids,
            child_ids: self.child_ids,
            merkle_hash,
            tags: self.tags,
        };
        node.validate()?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_common::ErrorCode;

    fn sample() -> EvidenceNode {
        EvidenceNode::builder("budget_claim", "annual_report.pdf")
            .id("n1")
            .confidence(0.9)
            .timestamp("2024-03-01T00:00:00Z")
            .field("tag", "annual_budget_2024")
            .field("amount", 1200)
            .field("ratio", 0.25)
            .field("audited", true)
            .field("missing", Value::Null)
            .tag("finance")
            .child("n2")
            .build()
            .unwrap()
    }

    #[test]
    fn test_direct_attributes_win_over_content() {
        let mut node = sample();
        node.content.insert("source".into(), Value::from("shadowed"));

        assert_eq!(node.resolve("source"), Some(FieldRef::Text("annual_report.pdf")));
        assert_eq!(node.resolve("confidence"), Some(FieldRef::Float(0.9)));
        assert_eq!(node.resolve("child_ids"), Some(FieldRef::List(&["n2".to_string()])));
    }

    #[test]
    fn test_content_fallback() {
        let node = sample();
        assert_eq!(node.resolve("tag"), Some(FieldRef::Text("annual_budget_2024")));
        assert_eq!(node.resolve("amount"), Some(FieldRef::Int(1200)));
        assert_eq!(node.resolve("ratio"), Some(FieldRef::Float(0.25)));
        assert_eq!(node.resolve("audited"), Some(FieldRef::Bool(true)));
        assert_eq!(node.resolve("missing"), None);
        assert_eq!(node.resolve("nope"), None);
        assert!(node.has_tag("finance"));
        assert!(!node.has_tag("budget"));
    }

    #[test]
    fn test_render_collections_as_json() {
        let node = sample();
        assert_eq!(node.resolve("tags").unwrap().render(), r#"["finance"]"#);
        assert_eq!(node.resolve("amount").unwrap().render(), "1200");
        assert_eq!(FieldRef::Float(1.0).render(), "1.0");
        assert_eq!(node.resolve("confidence").unwrap().render(), format!("{:?}", node.confidence));
    }

    #[test]
    fn test_derived_identity_is_stable() {
        let build = || {
            EvidenceNode::builder("claim", "src")
                .timestamp("2024-01-01T00:00:00Z")
                .field("k", "v")
                .parent("p2")
                .parent("p1")
                .build()
                .unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a.node_id, b.node_id);
        assert_eq!(a.node_id.len(), DERIVED_ID_LEN);
        assert_eq!(a.merkle_hash.len(), 64);
        assert_eq!(a.merkle_hash, b.merkle_hash);

        let c = EvidenceNode::builder("claim", "src")
            .timestamp("2024-01-01T00:00:00Z")
            .field("k", "other")
            .build()
            .unwrap();
        assert_ne!(a.node_id, c.node_id);
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let err = EvidenceNode::builder("claim", "src")
            .confidence(1.5)
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_deserialized_node_rechecked() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["confidence"] = Value::from(-0.1);
        let node: EvidenceNode = serde_json::from_value(json).unwrap();
        assert!(node.ensure_valid().is_err());
        assert!(sample().ensure_valid().is_ok());
    }

    #[test]
    fn test_empty_claim_type_rejected() {
        assert!(EvidenceNode::builder("", "src").build().is_err());
    }

    #[test]
    fn test_serde_field_names() {
        let node = sample();
        let json = serde_json::to_value(&node).unwrap();
        for key in [
            "node_id", "claim_type", "content", "source", "confidence", "timestamp",
            "parent_ids", "child_ids", "merkle_hash", "tags",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        let back: EvidenceNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}

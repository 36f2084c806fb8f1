//! Condition evaluation against a single node
//!
//! Every outcome is a plain bool: absent fields and type mismatches are
//! non-matches, never errors.

use super::{Operator, QueryCondition, Value};
use crate::evidence::{EvidenceNode, EvidenceStore, FieldRef};
use std::cmp::Ordering;

/// Numeric view shared by resolved fields and literals
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of_field(field: &FieldRef<'_>) -> Option<Self> {
        match field {
            FieldRef::Int(i) => Some(Number::Int(*i)),
            FieldRef::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Ordering between a resolved field and a literal.
///
/// Defined only for number/number and string/string pairs.
fn compare(field: &FieldRef<'_>, value: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (Number::of_field(field), Number::of_value(value)) {
        return a.compare(b);
    }
    match (field, value) {
        (FieldRef::Text(a), Value::Text(b)) => Some((*a).cmp(b.as_str())),
        _ => None,
    }
}

fn equals(field: &FieldRef<'_>, value: &Value) -> bool {
    match (field, value) {
        (FieldRef::Bool(a), Value::Bool(b)) => a == b,
        _ => compare(field, value) == Some(Ordering::Equal),
    }
}

fn member_of(field: &FieldRef<'_>, items: &[String]) -> bool {
    match field {
        FieldRef::Text(text) => items.iter().any(|item| item == text),
        _ => false,
    }
}

/// Decides whether nodes satisfy parsed conditions
pub struct ConditionEvaluator<'s, S: EvidenceStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EvidenceStore + ?Sized> ConditionEvaluator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Whether `node` satisfies a single condition
    pub fn matches(&self, node: &EvidenceNode, condition: &QueryCondition) -> bool {
        match condition.operator {
            Operator::Contradicts => match &condition.value {
                Value::Text(other) => self.store.has_contradiction(&node.node_id, other),
                _ => false,
            },
            Operator::Supports => match &condition.value {
                Value::Text(other) => self.store.has_support(&node.node_id, other),
                _ => false,
            },
            operator => {
                let resolved = node.resolve(&condition.field);
                Self::compare_field(resolved.as_ref(), operator, &condition.value)
            }
        }
    }

    /// Whether `node` satisfies every condition (empty list matches all)
    pub fn matches_all(&self, node: &EvidenceNode, conditions: &[QueryCondition]) -> bool {
        conditions.iter().all(|condition| self.matches(node, condition))
    }

    fn compare_field(field: Option<&FieldRef<'_>>, operator: Operator, value: &Value) -> bool {
        let field = match field {
            Some(field) => field,
            // Absent fields only satisfy `!=`
            None => return operator == Operator::Ne,
        };

        match operator {
            Operator::Eq => equals(field, value),
            Operator::Ne => !equals(field, value),
            Operator::Gt => compare(field, value) == Some(Ordering::Greater),
            Operator::Lt => compare(field, value) == Some(Ordering::Less),
            Operator::Ge => matches!(compare(field, value), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Le => matches!(compare(field, value), Some(Ordering::Less | Ordering::Equal)),
            Operator::In => match value {
                Value::List(items) => member_of(field, items),
                single => equals(field, single),
            },
            Operator::Contains => field.render().contains(value.as_needle().as_str()),
            Operator::Contradicts | Operator::Supports => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::InMemoryEvidenceStore;

    fn node() -> EvidenceNode {
        EvidenceNode::builder("budget_claim", "report.pdf")
            .id("n1")
            .confidence(0.9)
            .timestamp("2024-03-01T00:00:00Z")
            .field("tag", "annual_budget_2024")
            .field("amount", 1200)
            .field("audited", true)
            .tag("finance")
            .tag("q1")
            .build()
            .unwrap()
    }

    fn check(condition: QueryCondition) -> bool {
        let store = InMemoryEvidenceStore::new();
        ConditionEvaluator::new(&store).matches(&node(), &condition)
    }

    fn cond(field: &str, operator: Operator, value: Value) -> QueryCondition {
        QueryCondition::new(field, operator, value)
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(check(cond("confidence", Operator::Gt, Value::Float(0.8))));
        assert!(!check(cond("confidence", Operator::Lt, Value::Float(0.8))));
        assert!(check(cond("confidence", Operator::Ge, Value::Float(0.9))));
        assert!(check(cond("amount", Operator::Eq, Value::Float(1200.0))));
        assert!(check(cond("amount", Operator::Le, Value::Int(1200))));
        assert!(check(cond("amount", Operator::Ne, Value::Int(5))));
    }

    #[test]
    fn test_string_comparisons_are_lexical() {
        assert!(check(cond("source", Operator::Eq, Value::Text("report.pdf".into()))));
        assert!(check(cond("timestamp", Operator::Gt, Value::Text("2024-01-01".into()))));
        assert!(check(cond("claim_type", Operator::Lt, Value::Text("c".into()))));
    }

    #[test]
    fn test_type_mismatch_is_non_match() {
        assert!(!check(cond("source", Operator::Gt, Value::Int(3))));
        assert!(!check(cond("confidence", Operator::Eq, Value::Text("0.9".into()))));
        assert!(!check(cond("audited", Operator::Eq, Value::Int(1))));
        assert!(check(cond("audited", Operator::Eq, Value::Bool(true))));
        // `!=` is the exact complement of `=`
        assert!(check(cond("confidence", Operator::Ne, Value::Text("0.9".into()))));
    }

    #[test]
    fn test_absent_field() {
        assert!(!check(cond("missing", Operator::Eq, Value::Int(1))));
        assert!(!check(cond("missing", Operator::Gt, Value::Int(1))));
        assert!(!check(cond("missing", Operator::Contains, Value::Text("".into()))));
        assert!(!check(cond("missing", Operator::In, Value::List(vec!["a".into()]))));
        assert!(check(cond("missing", Operator::Ne, Value::Int(1))));
    }

    #[test]
    fn test_in_list_membership() {
        let list = Value::List(vec!["other".into(), "budget_claim".into()]);
        assert!(check(cond("claim_type", Operator::In, list)));
        assert!(!check(cond("amount", Operator::In, Value::List(vec!["1200".into()]))));
    }

    #[test]
    fn test_contains() {
        assert!(check(cond("tag", Operator::Contains, Value::Text("budget".into()))));
        assert!(check(cond("tags", Operator::Contains, Value::Text("finance".into()))));
        assert!(check(cond("amount", Operator::Contains, Value::Text("20".into()))));
        assert!(!check(cond("tag", Operator::Contains, Value::Text("Budget".into()))));
    }

    #[test]
    fn test_contains_on_whole_float() {
        let certain = EvidenceNode::builder("budget_claim", "report.pdf")
            .id("n9")
            .confidence(1.0)
            .field("ratio", 2.0)
            .build()
            .unwrap();
        let store = InMemoryEvidenceStore::new();
        let evaluator = ConditionEvaluator::new(&store);

        assert!(evaluator.matches(&certain, &cond("confidence", Operator::Contains, Value::Text("1.0".into()))));
        assert!(evaluator.matches(&certain, &cond("ratio", Operator::Contains, Value::Float(2.0))));
        assert!(!evaluator.matches(&certain, &cond("confidence", Operator::Contains, Value::Text("1.5".into()))));
    }

    #[test]
    fn test_relations_use_store() {
        let mut store = InMemoryEvidenceStore::new();
        store.add_contradiction("n1", "n2");
        store.add_support("n1", "n3");
        let evaluator = ConditionEvaluator::new(&store);
        let node = node();

        assert!(evaluator.matches(&node, &QueryCondition::contradicts("n2")));
        assert!(!evaluator.matches(&node, &QueryCondition::contradicts("n3")));
        assert!(evaluator.matches(&node, &QueryCondition::supports("n3")));
        assert!(!evaluator.matches(&node, &QueryCondition::supports("n2")));
    }

    #[test]
    fn test_matches_all_is_conjunction() {
        let store = InMemoryEvidenceStore::new();
        let evaluator = ConditionEvaluator::new(&store);
        let node = node();

        assert!(evaluator.matches_all(&node, &[]));
        assert!(evaluator.matches_all(
            &node,
            &[
                cond("confidence", Operator::Gt, Value::Float(0.5)),
                cond("source", Operator::Eq, Value::Text("report.pdf".into())),
            ]
        ));
        assert!(!evaluator.matches_all(
            &node,
            &[
                cond("confidence", Operator::Gt, Value::Float(0.5)),
                cond("source", Operator::Eq, Value::Text("other".into())),
            ]
        ));
    }
}

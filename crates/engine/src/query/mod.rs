//! Evidence query language
//!
//! `SELECT <fields> FROM evidence [WHERE <cond> AND ...] [ORDER BY <field> [ASC|DESC]]
//! [LIMIT <n>] [OFFSET <n>]`
//!
//! Provides:
//! - Tokenizer and recursive-descent parser (lenient or strict)
//! - Condition evaluation against a single node
//! - Filter / sort / paginate execution over a store

mod evaluator;
mod executor;
mod lexer;
mod parser;

pub use evaluator::ConditionEvaluator;
pub use executor::{QueryExecutor, QueryResult};
pub use parser::{ParseDiagnostic, ParseMode, ParsedQuery, QueryParser};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-field that relation conditions bind to
pub const NODE_ID_FIELD: &str = "node_id";

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "contradicts")]
    Contradicts,
    #[serde(rename = "supports")]
    Supports,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
            Operator::Contradicts => "contradicts",
            Operator::Supports => "supports",
        }
    }

    /// Comparison operators written between a field and a value
    pub(crate) fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            ">=" => Some(Operator::Ge),
            "<=" => Some(Operator::Le),
            _ => None,
        }
    }

    /// Relation predicates written as `name(node_id='X')`
    pub(crate) fn relation(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("contradicts") {
            Some(Operator::Contradicts)
        } else if name.eq_ignore_ascii_case("supports") {
            Some(Operator::Supports)
        } else {
            None
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Operator::Contradicts | Operator::Supports)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed literal on the right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// `IN` list items, always kept as strings
    List(Vec<String>),
}

impl Value {
    /// Interpret an unquoted literal.
    ///
    /// `true`/`false` (any case) become bools, tokens containing `.` floats,
    /// other tokens integers; anything that fails to parse stays a string.
    pub fn parse_bare(token: &str) -> Self {
        if token.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if token.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if token.contains('.') {
            return token
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Text(token.to_string()));
        }
        token
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(token.to_string()))
    }

    /// Needle used by `CONTAINS`
    pub(crate) fn as_needle(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{:?}", f),
            Value::List(items) => items.join(", "),
        }
    }
}

/// Quote `text` so the lexer reads it back unchanged.
///
/// Single quotes unless only `'` occurs in the text; the chosen quote is
/// doubled wherever it appears inside.
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let doubled: String = [quote, quote].iter().collect();
    write!(f, "{q}{}{q}", text.replace(quote, &doubled), q = quote)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write_quoted(f, s),
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Single `field OP value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl QueryCondition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// `contradicts(node_id='X')`
    pub fn contradicts(node_id: impl Into<String>) -> Self {
        Self::new(NODE_ID_FIELD, Operator::Contradicts, Value::Text(node_id.into()))
    }

    /// `supports(node_id='X')`
    pub fn supports(node_id: impl Into<String>) -> Self {
        Self::new(NODE_ID_FIELD, Operator::Supports, Value::Text(node_id.into()))
    }
}

impl fmt::Display for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_relation() {
            write!(f, "{}({}={})", self.operator, NODE_ID_FIELD, self.value)
        } else {
            write!(f, "{} {} {}", self.field, self.operator, self.value)
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// Parsed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAst {
    /// Requested fields; `*` means all
    pub select_fields: Vec<String>,

    /// Implicitly AND-ed
    pub conditions: Vec<QueryCondition>,

    pub order_by: Option<String>,

    pub order_direction: OrderDirection,

    pub limit: Option<usize>,

    pub offset: usize,
}

impl Default for QueryAst {
    fn default() -> Self {
        Self {
            select_fields: vec!["*".to_string()],
            conditions: Vec::new(),
            order_by: None,
            order_direction: OrderDirection::Asc,
            limit: None,
            offset: 0,
        }
    }
}

impl QueryAst {
    /// Whether every field was requested
    pub fn selects_all(&self) -> bool {
        selects_all(&self.select_fields)
    }
}

pub(crate) fn selects_all(fields: &[String]) -> bool {
    fields.is_empty() || fields.iter().any(|f| f == "*")
}

impl fmt::Display for QueryAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM evidence", self.select_fields.join(", "))?;
        for (i, condition) in self.conditions.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {} {}", keyword, condition)?;
        }
        if let Some(field) = &self.order_by {
            let direction = match self.order_direction {
                OrderDirection::Asc => "ASC",
                OrderDirection::Desc => "DESC",
            };
            write!(f, " ORDER BY {} {}", field, direction)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        Ok(())
    }
}

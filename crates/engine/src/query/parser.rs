//! Query parser - turns query text into a `QueryAst`
//!
//! Provides:
//! - Lenient parsing (default): fragments that match no grammar rule are
//!   dropped and reported as diagnostics, never as errors
//! - Strict parsing: the first problem becomes `NexusError::Parse`
//!
//! Conditions are a flat `AND` chain; there is no `OR` and no grouping.

use super::lexer::{tokenize, Spanned, Token};
use super::{Operator, OrderDirection, QueryAst, QueryCondition, Value, NODE_ID_FIELD};
use nexus_common::errors::{NexusError, Result};
use serde::{Deserialize, Serialize};

/// Table name accepted after `FROM`
const SOURCE_TABLE: &str = "evidence";

/// How unparseable input is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Drop what cannot be parsed and keep going
    #[default]
    Lenient,
    /// Fail on the first problem
    Strict,
}

/// A fragment the lenient parser dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// Source text that was skipped
    pub fragment: String,

    /// Why it was skipped
    pub reason: String,
}

/// Lenient parse output
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub ast: QueryAst,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parser for the evidence query language
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParser {
    mode: ParseMode,
}

impl QueryParser {
    /// Create a parser with the given mode
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Parse in this parser's mode.
    ///
    /// Only ever errors in strict mode.
    pub fn parse_with_mode(&self, query: &str) -> Result<ParsedQuery> {
        Parser::new(query, self.mode).run()
    }

    /// Parse leniently; unparseable fragments end up in `diagnostics`
    pub fn parse(&self, query: &str) -> ParsedQuery {
        match Parser::new(query, ParseMode::Lenient).run() {
            Ok(parsed) => parsed,
            // Lenient runs never fail; keep the default contract if that changes.
            Err(e) => ParsedQuery {
                ast: QueryAst::default(),
                diagnostics: vec![ParseDiagnostic {
                    fragment: query.to_string(),
                    reason: e.to_string(),
                }],
            },
        }
    }

    /// Parse strictly, surfacing the first problem
    pub fn parse_strict(&self, query: &str) -> Result<QueryAst> {
        Parser::new(query, ParseMode::Strict).run().map(|parsed| parsed.ast)
    }
}

/// Points where recovery may stop skipping tokens
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stop {
    From,
    Where,
    And,
    Tail,
}

const AFTER_SELECT: &[Stop] = &[Stop::From, Stop::Where, Stop::Tail];
const AFTER_FROM: &[Stop] = &[Stop::Where, Stop::Tail];
const AFTER_CONDITION: &[Stop] = &[Stop::And, Stop::Tail];
const AFTER_TAIL: &[Stop] = &[Stop::Tail];

struct Failure {
    message: String,
}

impl Failure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type Step<T> = std::result::Result<T, Failure>;

struct Parser<'q> {
    input: &'q str,
    tokens: Vec<Spanned>,
    pos: usize,
    mode: ParseMode,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'q> Parser<'q> {
    fn new(query: &'q str, mode: ParseMode) -> Self {
        let input = query.trim().trim_end_matches(';').trim_end();
        let (tokens, unterminated) = tokenize(input);
        let mut parser = Self {
            input,
            tokens,
            pos: 0,
            mode,
            diagnostics: Vec::new(),
        };
        if let Some(issue) = unterminated {
            parser.diagnostics.push(ParseDiagnostic {
                fragment: input[issue.span].to_string(),
                reason: "unterminated quoted string".to_string(),
            });
        }
        parser
    }

    fn run(mut self) -> Result<ParsedQuery> {
        if self.mode == ParseMode::Strict {
            if let Some(first) = self.diagnostics.first() {
                return Err(NexusError::parse(first.reason.clone(), first.fragment.clone()));
            }
        }

        let mut ast = QueryAst::default();

        if self.tokens.is_empty() {
            self.fail_here("empty query")?;
            return Ok(self.finish(ast));
        }

        let start = self.pos;
        let select = self.select_clause();
        if let Some(fields) = self.settle(start, select, AFTER_SELECT)? {
            ast.select_fields = fields;
        }

        let start = self.pos;
        let from = self.from_clause();
        self.settle(start, from, AFTER_FROM)?;

        if self.at_keyword("WHERE") {
            self.pos += 1;
            ast.conditions = self.conditions()?;
        }

        self.tail_clauses(&mut ast)?;

        Ok(self.finish(ast))
    }

    fn finish(self, ast: QueryAst) -> ParsedQuery {
        for diagnostic in &self.diagnostics {
            tracing::warn!(
                fragment = %diagnostic.fragment,
                reason = %diagnostic.reason,
                "Dropped unparseable query fragment"
            );
        }
        ParsedQuery {
            ast,
            diagnostics: self.diagnostics,
        }
    }

    // ---------------------------------------------------------------
    // Clauses
    // ---------------------------------------------------------------

    fn select_clause(&mut self) -> Step<Vec<String>> {
        self.expect_keyword("SELECT")?;
        let mut fields = vec![self.select_field()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            fields.push(self.select_field()?);
        }
        Ok(fields)
    }

    fn select_field(&mut self) -> Step<String> {
        match self.peek() {
            Some(Token::Word(w)) if !w.eq_ignore_ascii_case("FROM") => {
                let field = w.clone();
                self.pos += 1;
                Ok(field)
            }
            _ => Err(Failure::new("expected a field name or `*`")),
        }
    }

    fn from_clause(&mut self) -> Step<()> {
        self.expect_keyword("FROM")?;
        match self.peek() {
            Some(Token::Word(table)) => {
                let known = table.eq_ignore_ascii_case(SOURCE_TABLE);
                self.pos += 1;
                if !known && self.mode == ParseMode::Strict {
                    return Err(Failure::new(format!("unknown source, expected `{}`", SOURCE_TABLE)));
                }
                Ok(())
            }
            _ => Err(Failure::new("expected a source after FROM")),
        }
    }

    fn conditions(&mut self) -> Result<Vec<QueryCondition>> {
        let mut conditions = Vec::new();
        loop {
            if self.at_end() || self.at_tail_start() {
                self.fail_here("expected a condition")?;
                break;
            }

            let start = self.pos;
            let parsed = match self.condition() {
                Ok(condition) if self.at_condition_boundary() => Ok(condition),
                Ok(_) => Err(Failure::new("unexpected text after condition")),
                Err(failure) => Err(failure),
            };
            if let Some(condition) = self.settle(start, parsed, AFTER_CONDITION)? {
                conditions.push(condition);
            }

            if self.at_keyword("AND") {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(conditions)
    }

    fn condition(&mut self) -> Step<QueryCondition> {
        let first = match self.peek() {
            Some(Token::Word(w)) if !w.eq_ignore_ascii_case("AND") => w.clone(),
            _ => return Err(Failure::new("expected a field name")),
        };
        self.pos += 1;

        if let Some(operator) = Operator::relation(&first) {
            if self.peek() == Some(&Token::LParen) {
                return self.relation(operator);
            }
        }

        match self.peek() {
            Some(Token::Op(symbol)) => {
                let operator = Operator::from_symbol(symbol)
                    .ok_or_else(|| Failure::new("unknown operator"))?;
                self.pos += 1;
                let value = self.literal()?;
                Ok(QueryCondition::new(first, operator, value))
            }
            Some(token) if token.is_keyword("IN") => {
                self.pos += 1;
                let items = if self.peek() == Some(&Token::LParen) {
                    self.in_list()?
                } else {
                    vec![self.text()?]
                };
                Ok(QueryCondition::new(first, Operator::In, Value::List(items)))
            }
            Some(token) if token.is_keyword("CONTAINS") => {
                self.pos += 1;
                let needle = self.text()?;
                Ok(QueryCondition::new(first, Operator::Contains, Value::Text(needle)))
            }
            _ => Err(Failure::new("expected an operator, IN or CONTAINS")),
        }
    }

    /// `contradicts(node_id='X')` / `supports(node_id='X')`, name already consumed
    fn relation(&mut self, operator: Operator) -> Step<QueryCondition> {
        self.expect(&Token::LParen, "expected `(`")?;
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(NODE_ID_FIELD) => self.pos += 1,
            _ => return Err(Failure::new("expected `node_id` inside relation")),
        }
        self.expect(&Token::Op("="), "expected `=` after node_id")?;
        let node_id = self.text()?;
        self.expect(&Token::RParen, "expected `)`")?;
        Ok(QueryCondition::new(NODE_ID_FIELD, operator, Value::Text(node_id)))
    }

    fn in_list(&mut self) -> Step<Vec<String>> {
        self.expect(&Token::LParen, "expected `(` after IN")?;
        let mut items = vec![self.text()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            items.push(self.text()?);
        }
        self.expect(&Token::RParen, "expected `)` to close IN list")?;
        Ok(items)
    }

    fn tail_clauses(&mut self, ast: &mut QueryAst) -> Result<()> {
        let mut last_rank = 0;
        while !self.at_end() {
            let start = self.pos;
            let rank = if self.at_keyword("ORDER") {
                1
            } else if self.at_keyword("LIMIT") {
                2
            } else if self.at_keyword("OFFSET") {
                3
            } else {
                0
            };

            let step = match rank {
                0 => Err(Failure::new("unexpected text")),
                r if r <= last_rank && self.mode == ParseMode::Strict => {
                    Err(Failure::new("clause repeated or out of order"))
                }
                1 => self.order_clause().map(|(field, direction)| {
                    ast.order_by = Some(field);
                    ast.order_direction = direction;
                }),
                2 => self.count_clause("LIMIT").map(|n| ast.limit = Some(n)),
                _ => self.count_clause("OFFSET").map(|n| ast.offset = n),
            };
            last_rank = last_rank.max(rank);

            self.settle(start, step, AFTER_TAIL)?;
            if self.pos == start {
                self.pos += 1;
            }
        }
        Ok(())
    }

    fn order_clause(&mut self) -> Step<(String, OrderDirection)> {
        self.expect_keyword("ORDER")?;
        self.expect_keyword("BY")?;
        let field = match self.peek() {
            Some(Token::Word(w)) if !is_clause_keyword(w) => w.clone(),
            _ => return Err(Failure::new("expected a field after ORDER BY")),
        };
        self.pos += 1;

        let direction = if self.at_keyword("DESC") {
            self.pos += 1;
            OrderDirection::Desc
        } else {
            if self.at_keyword("ASC") {
                self.pos += 1;
            }
            OrderDirection::Asc
        };
        Ok((field, direction))
    }

    fn count_clause(&mut self, keyword: &str) -> Step<usize> {
        self.expect_keyword(keyword)?;
        let count = match self.peek() {
            Some(Token::Word(w)) => w.parse::<usize>().ok(),
            _ => None,
        };
        match count {
            Some(n) => {
                self.pos += 1;
                Ok(n)
            }
            None => Err(Failure::new(format!("{} expects a non-negative integer", keyword))),
        }
    }

    // ---------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------

    /// Right-hand side of a comparison
    fn literal(&mut self) -> Step<Value> {
        let value = match self.peek() {
            Some(Token::Quoted(s)) => Value::Text(s.clone()),
            Some(Token::Word(w)) if !w.eq_ignore_ascii_case("AND") => Value::parse_bare(w),
            _ => return Err(Failure::new("expected a value")),
        };
        self.pos += 1;
        Ok(value)
    }

    /// Quoted string or bare word, taken verbatim
    fn text(&mut self) -> Step<String> {
        let text = match self.peek() {
            Some(Token::Quoted(s)) => s.clone(),
            Some(Token::Word(w)) if !w.eq_ignore_ascii_case("AND") => w.clone(),
            _ => return Err(Failure::new("expected a string")),
        };
        self.pos += 1;
        Ok(text)
    }

    // ---------------------------------------------------------------
    // Token helpers
    // ---------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().map(|t| t.is_keyword(keyword)).unwrap_or(false)
    }

    /// `ORDER BY`, `LIMIT n` or `OFFSET n` starts here.
    ///
    /// `limit = 3` is a condition on a field called `limit`, not a clause.
    fn at_tail_start(&self) -> bool {
        if self.at_keyword("ORDER") {
            return self.peek_at(1).map(|t| t.is_keyword("BY")).unwrap_or(false);
        }
        if self.at_keyword("LIMIT") || self.at_keyword("OFFSET") {
            return match self.peek_at(1) {
                Some(Token::Op(_)) => false,
                Some(next) => !(next.is_keyword("IN") || next.is_keyword("CONTAINS")),
                None => true,
            };
        }
        false
    }

    fn at_condition_boundary(&self) -> bool {
        self.at_end() || self.at_keyword("AND") || self.at_tail_start()
    }

    fn at_stop(&self, stops: &[Stop]) -> bool {
        stops.iter().any(|stop| match stop {
            Stop::From => self.at_keyword("FROM"),
            Stop::Where => self.at_keyword("WHERE"),
            Stop::And => self.at_keyword("AND"),
            Stop::Tail => self.at_tail_start(),
        })
    }

    fn expect(&mut self, token: &Token, message: &str) -> Step<()> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Failure::new(message))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Step<()> {
        if self.at_keyword(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Failure::new(format!("expected {}", keyword)))
        }
    }

    // ---------------------------------------------------------------
    // Failure handling
    // ---------------------------------------------------------------

    /// Source text covered by tokens `start..end`
    fn fragment(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start < end {
            let from = self.tokens[start].span.start;
            let to = self.tokens[end - 1].span.end;
            self.input[from..to].to_string()
        } else if start < self.tokens.len() {
            self.input[self.tokens[start].span.clone()].to_string()
        } else {
            "<end of query>".to_string()
        }
    }

    /// Resolve a clause outcome.
    ///
    /// Strict mode turns a failure into an error. Lenient mode skips ahead to
    /// the next stop point, records what was skipped and yields `None`.
    fn settle<T>(&mut self, start: usize, step: Step<T>, stops: &[Stop]) -> Result<Option<T>> {
        let failure = match step {
            Ok(value) => return Ok(Some(value)),
            Err(failure) => failure,
        };

        if self.mode == ParseMode::Strict {
            return Err(NexusError::parse(failure.message, self.fragment(start, self.pos + 1)));
        }

        let mut depth = 0usize;
        while !self.at_end() {
            if depth == 0 && self.at_stop(stops) {
                break;
            }
            match self.peek() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }

        self.diagnostics.push(ParseDiagnostic {
            fragment: self.fragment(start, self.pos),
            reason: failure.message,
        });
        Ok(None)
    }

    /// Report a problem at the current token without skipping anything
    fn fail_here(&mut self, message: &str) -> Result<()> {
        let fragment = self.fragment(self.pos, self.pos + 1);
        if self.mode == ParseMode::Strict {
            return Err(NexusError::parse(message, fragment));
        }
        self.diagnostics.push(ParseDiagnostic {
            fragment,
            reason: message.to_string(),
        });
        Ok(())
    }
}

fn is_clause_keyword(word: &str) -> bool {
    ["SELECT", "FROM", "WHERE", "AND", "ORDER", "BY", "ASC", "DESC", "LIMIT", "OFFSET"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}

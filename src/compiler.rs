use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::{
    ast::{CardState, DateFilter, DateKind, Node},
    schema::{self, Join, card, status},
};

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

/// Output of [`compile`]: a boolean SQL expression over `cards c`, the
/// values for its `$n` placeholders and the joins it needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    /// Logical expression without a leading `WHERE`/`AND`
    pub predicate: String,
    /// `params[i]` binds placeholder `$(offset + i + 1)`
    pub params: Vec<SqlParam>,
    /// De-duplicated, in order of first use
    pub joins: Vec<Join>,
}

impl SqlQuery {
    /// Number of distinct `$n` placeholders in the predicate.
    pub fn placeholder_count(&self) -> usize {
        placeholder_numbers(&self.predicate).len()
    }

    pub fn join_clauses(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.joins.iter().map(|join| join.sql())
    }
}

/// Distinct placeholder numbers used in an SQL fragment.
pub fn placeholder_numbers(sql: &str) -> BTreeSet<usize> {
    // The pattern is a literal, so building it cannot fail.
    let Ok(placeholder) = Regex::new(r"\$(\d+)") else {
        return BTreeSet::new();
    };
    placeholder
        .captures_iter(sql)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Lowers a tree into a parameterized predicate.
///
/// `param_offset` is the number of parameters the caller has already bound;
/// the first placeholder emitted is `$(param_offset + 1)`. Placeholders are
/// numbered in left-to-right tree order. Never fails for a parsed tree.
pub fn compile(node: &Node, param_offset: usize) -> SqlQuery {
    let mut compiler = Compiler::new(param_offset);
    let predicate = compiler.lower(node);
    SqlQuery {
        predicate,
        params: compiler.params,
        joins: compiler.joins,
    }
}

struct Compiler {
    offset: usize,
    params: Vec<SqlParam>,
    joins: Vec<Join>,
}

impl Compiler {
    fn new(offset: usize) -> Self {
        Compiler {
            offset,
            params: vec![],
            joins: vec![],
        }
    }

    /// Binds a value and returns its placeholder.
    fn bind(&mut self, param: impl Into<SqlParam>) -> String {
        self.params.push(param.into());
        format!("${}", self.offset + self.params.len())
    }

    fn require(&mut self, join: Join) {
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
    }

    /// `EXISTS` over the note's field values, optionally restricted to one
    /// field. A missing field simply has no row, so the predicate is false.
    fn field_exists(&mut self, field: Option<&str>, condition: &str, param: SqlParam) -> String {
        self.require(Join::Note);
        let key_filter = match field {
            Some(name) => format!("lower(f.key) = lower({}) AND ", self.bind(name)),
            None => String::new(),
        };
        let placeholder = self.bind(param);
        format!(
            "EXISTS (SELECT 1 FROM jsonb_each_text(n.fields) AS f(key, value) WHERE {}{})",
            key_filter,
            condition.replace("{}", &placeholder)
        )
    }

    fn lower(&mut self, node: &Node) -> String {
        match node {
            Node::MatchAll => "TRUE".to_string(),

            Node::And { left, right } => {
                let left = self.lower(left);
                let right = self.lower(right);
                format!("({}) AND ({})", left, right)
            }
            Node::Or { left, right } => {
                let left = self.lower(left);
                let right = self.lower(right);
                format!("({}) OR ({})", left, right)
            }
            // A NULL operand counts as false, so `-x` keeps every card `x` rejects.
            Node::Not(operand) => format!("NOT COALESCE(({}), FALSE)", self.lower(operand)),

            Node::Text { value, field } => self.field_exists(
                field.as_deref(),
                "f.value ILIKE {}",
                contains_pattern(value).into(),
            ),
            Node::QuotedText(value) => {
                self.field_exists(None, "f.value ILIKE {}", contains_pattern(value).into())
            }
            Node::Regex { pattern, field } => {
                self.field_exists(field.as_deref(), "f.value ~* {}", pattern.as_str().into())
            }
            Node::WordBoundary(word) => {
                self.field_exists(None, "f.value ~* {}", word_pattern(word).into())
            }
            Node::AccentInsensitive(value) => self.field_exists(
                None,
                "unaccent(f.value) ILIKE unaccent({})",
                contains_pattern(value).into(),
            ),

            Node::Tag(pattern) => {
                self.require(Join::NoteTags);
                let condition = self.hierarchy_match("s.slug", pattern, false);
                format!(
                    "EXISTS (SELECT 1 FROM unnest(nt.slugs) AS s(slug) WHERE {})",
                    condition
                )
            }
            Node::Deck(path) => {
                self.require(Join::Deck);
                self.hierarchy_match("d.path", path, true)
            }

            Node::State(state) => self.state(*state),

            Node::Flag(flag) => format!("{} = {}", card::FLAG, self.bind(i64::from(*flag))),

            Node::Property { name, op, value } => format!(
                "{} {} {}",
                schema::property_column(*name),
                op.symbol(),
                self.bind(*value)
            ),

            Node::Date(filter) => self.date(filter),
        }
    }

    /// Matches a `::` separated path column against a user pattern.
    ///
    /// A trailing `::*` (or `*` alone as the last segment) matches the parent
    /// and everything below it; any other trailing `*` is a prefix match. With
    /// `descendants` set, a plain path also matches everything below it.
    fn hierarchy_match(&mut self, column: &str, pattern: &str, descendants: bool) -> String {
        let (base, with_children) = match pattern.strip_suffix('*') {
            Some(base) => match base.strip_suffix("::") {
                Some(parent) => (parent, true),
                None => {
                    let placeholder = self.bind(format!("{}%", escape_like(base)));
                    return format!("{} ILIKE {}", column, placeholder);
                }
            },
            None => (pattern, descendants),
        };

        let placeholder = self.bind(escape_like(base));
        if with_children {
            format!(
                "({column} ILIKE {p} OR {column} ILIKE ({p} || '::%'))",
                column = column,
                p = placeholder
            )
        } else {
            format!("{} ILIKE {}", column, placeholder)
        }
    }

    fn state(&mut self, state: CardState) -> String {
        match state {
            CardState::Due => format!(
                "({} <= now() AND {} = {})",
                card::DUE,
                card::STATUS,
                self.bind(status::ACTIVE)
            ),
            CardState::New | CardState::Learning | CardState::Review | CardState::Relearning => {
                let card_type = self.bind(state.as_str());
                let active = self.bind(status::ACTIVE);
                format!(
                    "({} = {} AND {} = {})",
                    card::CARD_TYPE,
                    card_type,
                    card::STATUS,
                    active
                )
            }
            CardState::Paused => format!("{} = {}", card::STATUS, self.bind(status::PAUSED)),
            CardState::Skipped => format!("{} = {}", card::STATUS, self.bind(status::SKIPPED)),
        }
    }

    fn date(&mut self, filter: &DateFilter) -> String {
        let days = self.bind(i64::from(filter.days));
        match filter.kind {
            DateKind::Added => format!(
                "{} >= now() - ({} * INTERVAL '1 day')",
                card::CREATED_AT,
                days
            ),
            DateKind::Rated => {
                let rating = match filter.rating {
                    Some(rating) => {
                        format!(" AND rl.rating = {}", self.bind(i64::from(rating.number())))
                    }
                    None => String::new(),
                };
                format!(
                    "EXISTS (SELECT 1 FROM review_logs rl WHERE rl.card_id = {} AND rl.reviewed_at >= now() - ({} * INTERVAL '1 day'){})",
                    card::ID,
                    days,
                    rating
                )
            }
        }
    }
}

/// Escapes `%`, `_` and the escape character itself for `LIKE`/`ILIKE`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

/// Word-anchored regex; `*` stands for any run of word characters.
fn word_pattern(word: &str) -> String {
    let escaped = regex::escape(word).replace(r"\*", r"\w*");
    format!(r"\m{}\M", escaped)
}

#[test]
fn test_escape_like() {
    assert_eq!(escape_like("100%"), r"100\%");
    assert_eq!(escape_like("snake_case"), r"snake\_case");
    assert_eq!(escape_like(r"a\b"), r"a\\b");
}

#[test]
fn test_word_pattern() {
    assert_eq!(word_pattern("dog"), r"\mdog\M");
    assert_eq!(word_pattern("d.g"), r"\md\.g\M");
    assert_eq!(word_pattern("dog*"), r"\mdog\w*\M");
}

#[test]
fn test_placeholder_numbers_are_distinct() {
    let numbers = placeholder_numbers("(d.path ILIKE $3 OR d.path ILIKE ($3 || '::%')) AND c.flag = $4");
    assert_eq!(numbers.into_iter().collect::<Vec<_>>(), vec![3, 4]);
}

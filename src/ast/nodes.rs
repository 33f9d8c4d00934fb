use serde::Serialize;

use crate::ast::{CardState, CompareOp, DateKind, PropertyName, Rating};

/// Date window produced by `added:` and `rated:`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateFilter {
    pub kind: DateKind,
    pub days: u32,
    /// Only meaningful for `rated:`
    pub rating: Option<Rating>,
}

/// Abstract Syntax Tree node representing a parsed search query.
///
/// Leaves are predicates over a single card; `And`, `Or` and `Not` combine
/// them. The tree is built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", content = "value", rename_all = "snake_case")]
pub enum Node {
    /// Empty query, matches every card
    MatchAll,

    // Leaves
    /// Substring match over note fields, or one field when `field` is set
    ///
    /// # Example
    /// ```text
    /// dog
    /// front:cat
    /// ```
    Text {
        value: String,
        field: Option<String>,
    },

    /// Quoted phrase over all note fields
    ///
    /// # Example
    /// ```text
    /// "big dog"
    /// ```
    QuotedText(String),

    /// Tag pattern, `::` separated
    Tag(String),

    /// Deck path, `::` separated
    Deck(String),

    State(CardState),

    Flag(u8),

    Property {
        name: PropertyName,
        op: CompareOp,
        value: f64,
    },

    Date(DateFilter),

    Regex {
        pattern: String,
        field: Option<String>,
    },

    WordBoundary(String),

    AccentInsensitive(String),

    // Combinators
    And {
        left: Box<Node>,
        right: Box<Node>,
    },

    Or {
        left: Box<Node>,
        right: Box<Node>,
    },

    Not(Box<Node>),
}

impl Node {
    pub fn and(left: Node, right: Node) -> Node {
        Node::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Node, right: Node) -> Node {
        Node::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Node) -> Node {
        Node::Not(Box::new(operand))
    }

    /// Unscoped text leaf.
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text {
            value: value.into(),
            field: None,
        }
    }
}

use serde::Serialize;

use crate::ast::{CardState, CompareOp, DateKind, PropertyName, Rating};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "token", rename_all = "snake_case")]
pub enum Token {
    // Text
    /// Bare word with no recognised prefix
    ///
    /// # Examples
    /// ```text
    /// dog
    /// well-known
    /// ```
    Text { value: String },

    /// Phrase enclosed in double quotes, `\"` escapes a quote
    ///
    /// # Examples
    /// ```text
    /// "big dog"
    /// "say \"hi\""
    /// ```
    QuotedText { value: String },

    /// Text restricted to one note field
    ///
    /// # Examples
    /// ```text
    /// front:cat
    /// front:"big dog"
    /// ```
    Field { field: String, value: String },

    // Prefixed predicates
    /// Hierarchical tag, a trailing `*` also matches descendants
    ///
    /// # Examples
    /// ```text
    /// tag:vocab
    /// tag:language::arabic::*
    /// ```
    Tag { pattern: String },

    /// Deck path, matches the deck and its subdecks
    ///
    /// # Examples
    /// ```text
    /// deck:Languages::Arabic
    /// deck:"My Deck"
    /// ```
    Deck { path: String },

    /// Card state or status
    ///
    /// # Examples
    /// ```text
    /// is:due
    /// is:buried     // normalised to skipped
    /// ```
    State { state: CardState },

    /// Flag colour, `0` means unflagged
    ///
    /// # Examples
    /// ```text
    /// flag:0
    /// flag:7
    /// ```
    Flag { flag: u8 },

    /// Numeric comparison on a scheduling property
    ///
    /// # Examples
    /// ```text
    /// prop:ivl>=10
    /// prop:ease!=2.5
    /// ```
    Property {
        name: PropertyName,
        op: CompareOp,
        value: f64,
    },

    /// Added or reviewed within the last N days
    ///
    /// # Examples
    /// ```text
    /// added:7
    /// rated:3
    /// rated:3:1     // pressed Again
    /// ```
    Date {
        kind: DateKind,
        days: u32,
        rating: Option<Rating>,
    },

    /// Regular expression, optionally scoped to a field
    ///
    /// # Examples
    /// ```text
    /// re:^dog
    /// front:re:(cat|dog)
    /// ```
    Regex {
        field: Option<String>,
        pattern: String,
    },

    /// Whole-word match
    ///
    /// # Examples
    /// ```text
    /// w:dog
    /// ```
    WordBoundary { word: String },

    /// Accent-insensitive match
    ///
    /// # Examples
    /// ```text
    /// nc:uber      // matches über
    /// ```
    AccentInsensitive { value: String },

    // Operators
    /// Conjunction, written `AND` or inserted between adjacent terms
    And,

    /// Disjunction (`OR`)
    Or,

    /// Negation, written `NOT` or as a `-` prefix
    ///
    /// # Examples
    /// ```text
    /// -is:paused
    /// NOT tag:leech
    /// ```
    Not,

    // Delimiters
    /// Left parenthesis for grouping
    LParen,

    /// Right parenthesis
    RParen,

    /// End of query
    Eof,
}

impl Token {
    /// True for tokens that complete a term: leaf predicates and `)`.
    pub fn is_value_like(&self) -> bool {
        self.is_leaf() || matches!(self, Token::RParen)
    }

    /// True for tokens that may begin an expression.
    pub fn can_start_expression(&self) -> bool {
        self.is_leaf() || matches!(self, Token::LParen | Token::Not)
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            Token::And | Token::Or | Token::Not | Token::LParen | Token::RParen | Token::Eof
        )
    }
}

/// A token together with where it came from in the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned {
    pub token: Token,
    /// Character offset of the first character of the lexeme
    pub position: usize,
    /// The raw source text, empty for synthesised tokens
    pub lexeme: String,
}

impl Spanned {
    pub fn new(token: Token, position: usize, lexeme: impl Into<String>) -> Self {
        Spanned {
            token,
            position,
            lexeme: lexeme.into(),
        }
    }
}

use std::fmt;

use serde::Serialize;

/// Card state or status accepted by `is:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Due now and neither paused nor skipped
    Due,
    /// Never studied
    New,
    /// In the initial learning steps
    Learning,
    /// Graduated to review
    Review,
    /// Lapsed and back in learning steps
    Relearning,
    /// Suspended by the user
    Paused,
    /// Hidden until tomorrow (`buried` is accepted as an alias)
    Skipped,
}

impl CardState {
    /// Every spelling `is:` accepts, in the order error messages list them.
    pub const VOCABULARY: &'static [&'static str] = &[
        "due",
        "new",
        "learning",
        "review",
        "relearning",
        "paused",
        "buried",
        "skipped",
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "due" => Some(Self::Due),
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "review" => Some(Self::Review),
            "relearning" => Some(Self::Relearning),
            "paused" => Some(Self::Paused),
            "buried" | "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
            Self::Paused => "paused",
            Self::Skipped => "skipped",
        }
    }
}

/// Numeric scheduling property accepted by `prop:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyName {
    Interval,
    Lapses,
    Ease,
    Reps,
    Stability,
    Retrievability,
    Difficulty,
}

impl PropertyName {
    pub const VOCABULARY: &'static [&'static str] = &[
        "ivl",
        "lapses",
        "ease",
        "reps",
        "stability",
        "retrievability",
        "difficulty",
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "ivl" => Some(Self::Interval),
            "lapses" => Some(Self::Lapses),
            "ease" => Some(Self::Ease),
            "reps" => Some(Self::Reps),
            "stability" => Some(Self::Stability),
            "retrievability" => Some(Self::Retrievability),
            "difficulty" => Some(Self::Difficulty),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "ivl",
            Self::Lapses => "lapses",
            Self::Ease => "ease",
            Self::Reps => "reps",
            Self::Stability => "stability",
            Self::Retrievability => "retrievability",
            Self::Difficulty => "difficulty",
        }
    }
}

/// Comparison operators used in `prop:` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    /// Greater than or equal (`>=`)
    #[serde(rename = ">=")]
    GreaterEqual,
    /// Less than or equal (`<=`)
    #[serde(rename = "<=")]
    LessEqual,
    /// Not equal (`!=`)
    #[serde(rename = "!=")]
    NotEqual,
    /// Greater than (`>`)
    #[serde(rename = ">")]
    GreaterThan,
    /// Less than (`<`)
    #[serde(rename = "<")]
    LessThan,
    /// Equal (`=`)
    #[serde(rename = "=")]
    Equal,
}

impl CompareOp {
    /// Two-character operators come first so `>=` is never split into `>` and `=`.
    pub const ALL: [CompareOp; 6] = [
        CompareOp::GreaterEqual,
        CompareOp::LessEqual,
        CompareOp::NotEqual,
        CompareOp::GreaterThan,
        CompareOp::LessThan,
        CompareOp::Equal,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::GreaterEqual => ">=",
            CompareOp::LessEqual => "<=",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::Equal => "=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which timestamp a date filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    /// `added:N`, card creation time
    Added,
    /// `rated:N[:R]`, review-log timestamps
    Rated,
}

/// Answer button pressed during a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

#[test]
fn test_buried_is_alias_for_skipped() {
    assert_eq!(CardState::from_keyword("buried"), Some(CardState::Skipped));
    assert_eq!(CardState::from_keyword("Skipped"), Some(CardState::Skipped));
    assert_eq!(CardState::from_keyword("frozen"), None);
}

#[test]
fn test_rating_numbers() {
    assert_eq!(Rating::from_number(2), Some(Rating::Hard));
    assert_eq!(Rating::Easy.number(), 4);
    assert_eq!(Rating::from_number(0), None);
    assert_eq!(Rating::from_number(5), None);
}

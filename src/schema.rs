//! Names from the relational schema the compiler targets.
//!
//! The schema itself is owned elsewhere; this module only records the
//! tables, aliases and columns compiled predicates may reference.
//!
//! | Table         | Alias | Columns used                                              |
//! |---------------|-------|-----------------------------------------------------------|
//! | `cards`       | `c`   | id, user_id, note_id, deck_id, card_type, status, due,    |
//! |               |       | interval, stability, difficulty, ease, reps, lapses,      |
//! |               |       | flag, created_at                                          |
//! | `notes`       | `n`   | id, fields (JSONB object of field name to value)          |
//! | `decks`       | `d`   | id, path (`::` separated)                                 |
//! | `tags`        | `t`   | id, slug (`::` separated)                                 |
//! | `note_tags`   | `nt0` | note_id, tag_id                                           |
//! | `review_logs` | `rl`  | card_id, rating, reviewed_at                              |
//!
//! Tag predicates read `nt.slugs`, the per-card aggregate produced by the
//! lateral join in [`Join::NoteTags`], not the `note_tags` table itself.

use serde::Serialize;

use crate::ast::PropertyName;

pub const CARDS: &str = "cards c";

pub mod card {
    pub const ID: &str = "c.id";
    pub const USER_ID: &str = "c.user_id";
    pub const CARD_TYPE: &str = "c.card_type";
    pub const STATUS: &str = "c.status";
    pub const DUE: &str = "c.due";
    pub const INTERVAL: &str = "c.interval";
    pub const STABILITY: &str = "c.stability";
    pub const DIFFICULTY: &str = "c.difficulty";
    pub const EASE: &str = "c.ease";
    pub const REPS: &str = "c.reps";
    pub const LAPSES: &str = "c.lapses";
    pub const FLAG: &str = "c.flag";
    pub const CREATED_AT: &str = "c.created_at";
}

/// Values stored in `cards.status`.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const PAUSED: &str = "paused";
    pub const SKIPPED: &str = "skipped";
}

/// FSRS power forgetting curve: `R = (1 + FACTOR * t / S) ^ DECAY` with
/// `t` in days since the latest review. NULL for cards never reviewed.
pub const RETRIEVABILITY: &str = "power(1.0 + (19.0 / 81.0) * (EXTRACT(EPOCH FROM (now() - (SELECT max(rl.reviewed_at) FROM review_logs rl WHERE rl.card_id = c.id))) / 86400.0) / NULLIF(c.stability, 0), -0.5)";

/// Column or expression a `prop:` comparison reads.
pub fn property_column(name: PropertyName) -> &'static str {
    match name {
        PropertyName::Interval => card::INTERVAL,
        PropertyName::Lapses => card::LAPSES,
        PropertyName::Ease => card::EASE,
        PropertyName::Reps => card::REPS,
        PropertyName::Stability => card::STABILITY,
        PropertyName::Retrievability => RETRIEVABILITY,
        PropertyName::Difficulty => card::DIFFICULTY,
    }
}

/// Join clauses a compiled predicate can require on top of `cards c`.
///
/// Every join yields at most one row per card, so predicates compose under
/// `AND`, `OR` and `NOT` without duplicating or dropping cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Join {
    /// `notes n`, for field text
    Note,
    /// `decks d`, for deck paths
    Deck,
    /// `nt.slugs`, every tag slug on the card's note
    NoteTags,
}

impl Join {
    pub fn sql(self) -> &'static str {
        match self {
            Join::Note => "JOIN notes n ON n.id = c.note_id",
            Join::Deck => "JOIN decks d ON d.id = c.deck_id",
            Join::NoteTags => {
                "LEFT JOIN LATERAL (SELECT array_agg(t.slug) AS slugs FROM note_tags nt0 JOIN tags t ON t.id = nt0.tag_id WHERE nt0.note_id = c.note_id) nt ON TRUE"
            }
        }
    }
}

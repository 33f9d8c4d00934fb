//! # CardQL - Abstract Syntax Tree
//!
//! This module defines the token and tree types shared by the three stages of
//! the CardQL search language: the lexer, the parser and the SQL compiler.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer, with their source spans
//! - **[nodes]** - Tree nodes produced by the parser (leaf predicates and combinators)
//! - **[operators]** - Closed vocabularies: card states, properties, comparisons, ratings
//!
//! ## Quick Start
//!
//! ```text
//! tag:language::arabic::* deck:Languages::Arabic -is:paused prop:ivl>=10
//! ```
//!
//! This query finds cards tagged anywhere below `language::arabic`, living in
//! the `Languages::Arabic` deck (or one of its subdecks), that are not paused
//! and whose interval is at least ten days.
//!
//! ## Core Concepts
//!
//! ### Implicit Conjunction
//!
//! Terms separated only by whitespace are ANDed together:
//!
//! ```text
//! dog cat          // same as: dog AND cat
//! ```
//!
//! ### Precedence
//!
//! `OR` binds loosest, then `AND` (explicit or implicit), then negation
//! (`-` or `NOT`). Parentheses override everything:
//!
//! ```text
//! a OR b c         // Or(a, And(b, c))
//! (a OR b) c       // And(Or(a, b), c)
//! ```
//!
//! ### Prefixed Terms
//!
//! | Prefix        | Meaning                                        |
//! |---------------|------------------------------------------------|
//! | `tag:`        | hierarchical tag, trailing `*` for descendants |
//! | `deck:`       | deck and its subdecks                          |
//! | `is:`         | card state or status                           |
//! | `flag:`       | flag colour, 0 to 7                            |
//! | `prop:`       | numeric scheduling property comparison         |
//! | `added:`      | created within N days                          |
//! | `rated:`      | reviewed within N days, optionally with rating |
//! | `re:`         | regular expression over note fields            |
//! | `w:`          | whole-word match                               |
//! | `nc:`         | accent-insensitive match                       |
//! | `<field>:`    | text restricted to one note field              |
pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{DateFilter, Node};
pub use operators::{CardState, CompareOp, DateKind, PropertyName, Rating};
pub use tokens::{Spanned, Token};

//! CLI support for cardql
//!
//! Provides programmatic access to the cardql CLI so other tools can embed
//! the same token, tree and SQL reports.

mod check;
mod docs;

pub use check::{CheckOptions, CheckResult, Stage, execute_check};
pub use docs::{GrammarTopic, get_grammar_overview, get_grammar_topic};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] crate::SearchSyntaxError),

    #[error("Search failed: {0}")]
    Search(#[from] crate::SearchError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No query provided. Pass it as an argument or pipe it to stdin.")]
    NoQuery,

    #[error("Unknown grammar topic: '{0}'\nRun 'cardql grammar' to see available topics.")]
    UnknownTopic(String),
}

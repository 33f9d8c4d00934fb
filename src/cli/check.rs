//! Run a query through one or more compilation stages

use serde_json::json;

use super::CliError;
use crate::{Node, Parser, Spanned, SqlQuery, compile, tokenize};

/// How far to take the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Stop after tokenizing
    Tokens,
    /// Stop after parsing
    Ast,
    /// Compile to SQL
    #[default]
    Sql,
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The CardQL query
    pub query: String,
    pub stage: Stage,
    /// Parameters already bound before the compiled fragment
    pub param_offset: usize,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    Tokens(Vec<Spanned>),
    Ast(Node),
    Sql(SqlQuery),
}

impl CheckResult {
    pub fn to_json(&self) -> Result<serde_json::Value, CliError> {
        let value = match self {
            CheckResult::Tokens(tokens) => serde_json::to_value(tokens)?,
            CheckResult::Ast(node) => serde_json::to_value(node)?,
            CheckResult::Sql(query) => json!({
                "predicate": query.predicate,
                "params": query.params,
                "joins": query.join_clauses().collect::<Vec<_>>(),
            }),
        };
        Ok(value)
    }
}

/// Execute a cardql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let tokens = tokenize(&options.query)?;
    if options.stage == Stage::Tokens {
        return Ok(CheckResult::Tokens(tokens));
    }

    let node = Parser::new(tokens).parse()?;
    if options.stage == Stage::Ast {
        return Ok(CheckResult::Ast(node));
    }

    Ok(CheckResult::Sql(compile(&node, options.param_offset)))
}

#[test]
fn test_execute_check_stops_at_stage() {
    let mut options = CheckOptions {
        query: "flag:1 -tag:x".to_string(),
        stage: Stage::Tokens,
        param_offset: 0,
    };
    assert!(matches!(execute_check(&options), Ok(CheckResult::Tokens(t)) if t.len() == 5));

    options.stage = Stage::Sql;
    options.param_offset = 2;
    let json = execute_check(&options).unwrap().to_json().unwrap();
    assert_eq!(
        json["predicate"],
        "(c.flag = $3) AND (NOT COALESCE((EXISTS (SELECT 1 FROM unnest(nt.slugs) AS s(slug) WHERE s.slug ILIKE $4)), FALSE))"
    );
    assert_eq!(json["params"], json!([1, "x"]));
    assert!(json["joins"][0].as_str().unwrap().starts_with("LEFT JOIN LATERAL"));
}

#[test]
fn test_tokens_report_as_json() {
    let options = CheckOptions {
        query: "rated:3:2".to_string(),
        stage: Stage::Tokens,
        param_offset: 0,
    };
    let json = execute_check(&options).unwrap().to_json().unwrap();
    assert_eq!(
        json[0]["token"],
        json!({
            "token": "date",
            "kind": "rated",
            "days": 3,
            "rating": "hard"
        })
    );
    assert_eq!(json[0]["position"], 0);
    assert_eq!(json[0]["lexeme"], "rated:3:2");
    assert_eq!(json[1]["token"], json!({"token": "eof"}));
}

#[test]
fn test_tree_reports_as_json() {
    let options = CheckOptions {
        query: r#""big dog" -is:new"#.to_string(),
        stage: Stage::Ast,
        param_offset: 0,
    };
    let json = execute_check(&options).unwrap().to_json().unwrap();
    assert_eq!(
        json,
        json!({
            "node": "and",
            "value": {
                "left": {"node": "quoted_text", "value": "big dog"},
                "right": {
                    "node": "not",
                    "value": {"node": "state", "value": "new"}
                }
            }
        })
    );
}

#[test]
fn test_execute_check_reports_syntax_errors() {
    let options = CheckOptions {
        query: "is:sleeping".to_string(),
        ..CheckOptions::default()
    };
    assert!(matches!(execute_check(&options), Err(CliError::Syntax(_))));
}

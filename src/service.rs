//! Search orchestration: query text in, a page of cards out.
//!
//! The service runs tokenize, parse and compile, scopes the compiled
//! predicate to one user, and hands the resulting statements to a
//! [`CardStore`]. Syntax errors are returned unchanged.

#[cfg(feature = "postgres")]
pub mod postgres;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    ast::Node,
    compiler::{SqlParam, compile},
    error::SearchSyntaxError,
    parser::parse_query,
    schema::{CARDS, Join, card},
};

/// Errors that can occur while serving a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query text is not valid CardQL
    #[error(transparent)]
    Syntax(#[from] SearchSyntaxError),

    /// The store failed to run the statement
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Pagination or sort options out of range
    #[error("invalid search options: {0}")]
    InvalidOptions(String),
}

/// Errors reported by a [`CardStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("unexpected row shape: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn query(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Query(Box::new(err))
    }
}

/// Pagination limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_per_page: 50,
            max_per_page: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Due,
    Added,
    Interval,
    Ease,
    Lapses,
    Reps,
    Stability,
    Difficulty,
    Deck,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Due => card::DUE,
            SortField::Added => card::CREATED_AT,
            SortField::Interval => card::INTERVAL,
            SortField::Ease => card::EASE,
            SortField::Lapses => card::LAPSES,
            SortField::Reps => card::REPS,
            SortField::Stability => card::STABILITY,
            SortField::Difficulty => card::DIFFICULTY,
            SortField::Deck => "d.path",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "due" => Ok(SortField::Due),
            "added" => Ok(SortField::Added),
            "ivl" | "interval" => Ok(SortField::Interval),
            "ease" => Ok(SortField::Ease),
            "lapses" => Ok(SortField::Lapses),
            "reps" => Ok(SortField::Reps),
            "stability" => Ok(SortField::Stability),
            "difficulty" => Ok(SortField::Difficulty),
            "deck" => Ok(SortField::Deck),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        })
    }
}

/// Per-request pagination and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// 1-based page number
    pub page: u32,
    /// Falls back to [`SearchConfig::default_per_page`]
    pub per_page: Option<u32>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            page: 1,
            per_page: None,
            sort: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

/// SQL text with the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// The pair of statements one search page needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStatements {
    pub count: BoundStatement,
    pub page: BoundStatement,
    pub page_number: u32,
    pub per_page: u32,
    pub offset: u64,
}

/// One result row as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub deck_path: String,
    pub card_type: String,
    pub status: String,
    pub due: Option<DateTime<Utc>>,
    pub interval: i32,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub ease: Option<f64>,
    pub reps: i32,
    pub lapses: i32,
    pub flag: i16,
    pub fields: serde_json::Value,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: i64,
    pub card_type: String,
    pub status: String,
    pub due: Option<DateTime<Utc>>,
    pub interval: i32,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub ease: Option<f64>,
    pub reps: i32,
    pub lapses: i32,
    pub flag: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: i64,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub id: i64,
    pub path: String,
    /// Last `::` segment of the path
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

/// A matching card with the note, deck and tags it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardHit {
    pub card: Card,
    pub note: Note,
    pub deck: Deck,
    pub tags: Vec<Tag>,
}

fn last_segment(path: &str) -> String {
    path.rsplit("::").next().unwrap_or(path).to_string()
}

impl From<CardRow> for CardHit {
    fn from(row: CardRow) -> Self {
        let fields = match row.fields {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        CardHit {
            card: Card {
                id: row.id,
                card_type: row.card_type,
                status: row.status,
                due: row.due,
                interval: row.interval,
                stability: row.stability,
                difficulty: row.difficulty,
                ease: row.ease,
                reps: row.reps,
                lapses: row.lapses,
                flag: row.flag,
            },
            note: Note {
                id: row.note_id,
                fields,
            },
            deck: Deck {
                id: row.deck_id,
                name: last_segment(&row.deck_path),
                path: row.deck_path,
            },
            tags: row
                .tags
                .into_iter()
                .map(|slug| Tag {
                    name: last_segment(&slug),
                    slug,
                })
                .collect(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> SearchPage<T> {
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }
}

/// Storage the service runs statements against, typically a pooled
/// database connection.
#[allow(async_fn_in_trait)]
pub trait CardStore {
    async fn count_cards(&self, statement: &BoundStatement) -> Result<u64, StoreError>;

    async fn fetch_cards(&self, statement: &BoundStatement) -> Result<Vec<CardRow>, StoreError>;
}

const CARD_COLUMNS: &str = "c.id, c.note_id, c.deck_id, d.path AS deck_path, c.card_type, c.status, c.due, c.interval, c.stability, c.difficulty, c.ease, c.reps, c.lapses, c.flag, n.fields, COALESCE(nt.slugs, ARRAY[]::text[]) AS tags";

/// Joins the page statement always carries so it can select deck, note and tags.
const PAGE_JOINS: [Join; 3] = [Join::Note, Join::Deck, Join::NoteTags];

pub struct SearchService<S> {
    store: S,
    config: SearchConfig,
}

impl<S: CardStore> SearchService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    pub fn with_config(store: S, config: SearchConfig) -> Self {
        SearchService { store, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a search for one user.
    #[instrument(skip(self, options))]
    pub async fn search(
        &self,
        user_id: i64,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchPage<CardHit>, SearchError> {
        let node = parse_query(query)?;
        let statements = self.build_statements(user_id, &node, options)?;

        debug!(
            sql = %statements.page.sql,
            params = statements.page.params.len(),
            "compiled search"
        );

        let total = self.store.count_cards(&statements.count).await?;
        let rows = if statements.offset < total {
            self.store.fetch_cards(&statements.page).await?
        } else {
            vec![]
        };

        Ok(SearchPage {
            items: rows.into_iter().map(CardHit::from).collect(),
            total,
            page: statements.page_number,
            per_page: statements.per_page,
        })
    }

    /// Builds the count and page statements for a parsed query. Pure.
    pub fn build_statements(
        &self,
        user_id: i64,
        node: &Node,
        options: &SearchOptions,
    ) -> Result<SearchStatements, SearchError> {
        if options.page == 0 {
            return Err(SearchError::InvalidOptions(
                "page numbers start at 1".to_string(),
            ));
        }
        let per_page = match options.per_page {
            Some(0) => {
                return Err(SearchError::InvalidOptions(
                    "per_page must be at least 1".to_string(),
                ));
            }
            Some(n) => n.min(self.config.max_per_page),
            None => self.config.default_per_page,
        };
        let offset = u64::from(options.page - 1) * u64::from(per_page);

        // $1 is the user id, so the filter starts numbering after it.
        let filter = compile(node, 1);
        let where_clause = format!("{} = $1 AND ({})", card::USER_ID, filter.predicate);

        let mut params = Vec::with_capacity(filter.params.len() + 3);
        params.push(SqlParam::Integer(user_id));
        params.extend(filter.params.iter().cloned());

        let count = BoundStatement {
            sql: select_statement("count(*)", &filter.joins, &where_clause),
            params: params.clone(),
        };

        let mut page_joins = PAGE_JOINS.to_vec();
        for join in &filter.joins {
            if !page_joins.contains(join) {
                page_joins.push(*join);
            }
        }
        let limit = params.len() + 1;
        let mut page_sql = select_statement(CARD_COLUMNS, &page_joins, &where_clause);
        page_sql.push_str(&format!(
            " ORDER BY {column} {dir} NULLS LAST, {id} {dir} LIMIT ${limit} OFFSET ${offset}",
            column = options.sort.column(),
            dir = options.direction,
            id = card::ID,
            limit = limit,
            offset = limit + 1,
        ));
        params.push(SqlParam::Integer(i64::from(per_page)));
        params.push(SqlParam::Integer(
            i64::try_from(offset).unwrap_or(i64::MAX),
        ));

        Ok(SearchStatements {
            count,
            page: BoundStatement {
                sql: page_sql,
                params,
            },
            page_number: options.page,
            per_page,
            offset,
        })
    }
}

fn select_statement(columns: &str, joins: &[Join], where_clause: &str) -> String {
    let mut parts = vec![format!("SELECT {} FROM {}", columns, CARDS)];
    parts.extend(joins.iter().map(|join| join.sql().to_string()));
    parts.push(format!("WHERE {}", where_clause));
    parts.join(" ")
}

#[test]
fn test_last_segment() {
    assert_eq!(last_segment("Languages::Arabic"), "Arabic");
    assert_eq!(last_segment("vocab"), "vocab");
}

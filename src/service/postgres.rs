//! PostgreSQL-backed [`CardStore`] using a sqlx connection pool.

use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
};

use super::{BoundStatement, CardRow, CardStore, StoreError};
use crate::compiler::SqlParam;

pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    pub fn new(pool: PgPool) -> Self {
        PgCardStore { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(StoreError::query)?;
        Ok(PgCardStore { pool })
    }
}

/// Binds every parameter in placeholder order.
fn bind_all<'q>(sql: &'q str, params: &'q [SqlParam]) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, param| match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Integer(value) => query.bind(*value),
            SqlParam::Float(value) => query.bind(*value),
        })
}

fn card_row(row: &PgRow) -> Result<CardRow, sqlx::Error> {
    Ok(CardRow {
        id: row.try_get("id")?,
        note_id: row.try_get("note_id")?,
        deck_id: row.try_get("deck_id")?,
        deck_path: row.try_get("deck_path")?,
        card_type: row.try_get("card_type")?,
        status: row.try_get("status")?,
        due: row.try_get("due")?,
        interval: row.try_get("interval")?,
        stability: row.try_get("stability")?,
        difficulty: row.try_get("difficulty")?,
        ease: row.try_get("ease")?,
        reps: row.try_get("reps")?,
        lapses: row.try_get("lapses")?,
        flag: row.try_get("flag")?,
        fields: row.try_get("fields")?,
        tags: row.try_get("tags")?,
    })
}

impl CardStore for PgCardStore {
    async fn count_cards(&self, statement: &BoundStatement) -> Result<u64, StoreError> {
        let row = bind_all(&statement.sql, &statement.params)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::query)?;
        let count: i64 = row.try_get(0).map_err(StoreError::query)?;
        u64::try_from(count).map_err(|_| StoreError::Decode(format!("negative count {}", count)))
    }

    async fn fetch_cards(&self, statement: &BoundStatement) -> Result<Vec<CardRow>, StoreError> {
        let rows = bind_all(&statement.sql, &statement.params)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::query)?;
        rows.iter()
            .map(|row| card_row(row).map_err(|e| StoreError::Decode(e.to_string())))
            .collect()
    }
}

use crate::DbError;
use async_trait::async_trait;
use core_types::{CellValue, RawRow};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// The table every trial reading lives in.
pub const TRIAL_TABLE: &str = "data";

/// A SQL statement plus the values bound to its `?` placeholders.
///
/// Identifiers supplied by callers always travel as bound values, never as
/// part of the statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    sql: String,
    binds: Vec<String>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Selects every row of one trial. `trial_column` is the configured name
    /// of the trial identifier column.
    pub fn trial_rows(trial_id: &str, trial_column: &str) -> Self {
        Self::new(format!(
            "SELECT * FROM {} WHERE {} = ?",
            TRIAL_TABLE,
            quote_identifier(trial_column)
        ))
        .bind(trial_id)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[String] {
        &self.binds
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A live handle to the relational store.
///
/// A connection is good for exactly one execute-and-fetch cycle through
/// [`query_database`], which consumes it and closes it afterwards.
#[async_trait]
pub trait QueryConnection: Send + Sized {
    /// Executes `query` and fetches every resulting row.
    async fn fetch_all(&mut self, query: &SqlQuery) -> Result<Vec<RawRow>, DbError>;

    /// Releases the underlying connection.
    async fn close(self) -> Result<(), DbError>;
}

/// Runs `query` on `conn` and returns all rows.
///
/// The connection is closed on every path once it has been handed over,
/// including when the fetch fails or returns nothing. A fetch error takes
/// precedence over a close error.
pub async fn query_database<C: QueryConnection>(
    conn: Option<C>,
    query: &SqlQuery,
) -> Result<Vec<RawRow>, DbError> {
    let Some(mut conn) = conn else {
        return Err(DbError::NoConnection);
    };

    tracing::debug!(sql = query.sql(), binds = ?query.binds(), "Executing query");
    let fetched = conn.fetch_all(query).await;
    let closed = conn.close().await;

    let rows = fetched?;
    closed?;

    tracing::debug!(rows = rows.len(), "Query complete, connection closed");
    Ok(rows)
}

#[async_trait]
impl QueryConnection for SqliteConnection {
    async fn fetch_all(&mut self, query: &SqlQuery) -> Result<Vec<RawRow>, DbError> {
        let mut statement = sqlx::query(query.sql());
        for value in query.binds() {
            statement = statement.bind(value.clone());
        }

        let rows = statement.fetch_all(&mut *self).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn close(self) -> Result<(), DbError> {
        sqlx::Connection::close(self).await?;
        Ok(())
    }
}

/// Converts a driver row into named cells, keyed by each value's storage
/// class rather than the column's declared type.
fn decode_row(row: &SqliteRow) -> Result<RawRow, DbError> {
    let mut cells = Vec::with_capacity(row.len());

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            CellValue::Null
        } else {
            let storage_class = raw.type_info().name().to_string();
            match storage_class.as_str() {
                "INTEGER" | "BOOLEAN" => CellValue::Integer(row.try_get::<i64, _>(idx)?),
                "REAL" => CellValue::Real(row.try_get::<f64, _>(idx)?),
                "TEXT" => CellValue::Text(row.try_get::<String, _>(idx)?),
                _ => CellValue::Unsupported(storage_class),
            }
        };

        cells.push((column.name().to_string(), value));
    }

    Ok(RawRow::new(cells))
}

//! The persistence port and its SQLite adapter.
//!
//! Handlers and the repository only ever see [`Database`]. The production
//! implementation is [`SqliteDatabase`]; tests substitute a recording double.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row as _, Sqlite, TypeInfo, ValueRef,
};

use crate::error::DbError;

/// A positional bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Text(String),
    Bool(bool),
}

/// A decoded column value, one variant per storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

/// One result row, columns in statement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<Value>) -> Self {
        Self { columns }
    }

    fn column(&self, index: usize) -> Result<&Value, DbError> {
        self.columns.get(index).ok_or(DbError::ColumnOutOfRange {
            index,
            len: self.columns.len(),
        })
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> DbError {
        DbError::ColumnType {
            index,
            expected,
            found: self.columns.get(index).map_or("nothing", Value::kind),
        }
    }

    pub fn get_i64(&self, index: usize) -> Result<i64, DbError> {
        match self.column(index)? {
            Value::Int(value) => Ok(*value),
            _ => Err(self.mismatch(index, "integer")),
        }
    }

    pub fn get_string(&self, index: usize) -> Result<String, DbError> {
        match self.column(index)? {
            Value::Text(value) => Ok(value.clone()),
            _ => Err(self.mismatch(index, "text")),
        }
    }

    /// SQLite has no boolean class, so integers are read as `value != 0`.
    pub fn get_bool(&self, index: usize) -> Result<bool, DbError> {
        match self.column(index)? {
            Value::Int(value) => Ok(*value != 0),
            _ => Err(self.mismatch(index, "boolean")),
        }
    }

    /// Accepts `current_timestamp` text (`YYYY-MM-DD HH:MM:SS`, UTC), RFC3339
    /// text, or integer unix seconds.
    pub fn get_timestamp(&self, index: usize) -> Result<DateTime<Utc>, DbError> {
        let parsed = match self.column(index)? {
            Value::Text(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(text)
                        .map(|dt| dt.with_timezone(&Utc))
                        .ok()
                }),
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0),
            _ => None,
        };
        parsed.ok_or_else(|| self.mismatch(index, "timestamp"))
    }
}

/// Narrow storage capability the repository is written against.
#[async_trait]
pub trait Database: Send + Sync {
    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, statement: &str, params: &[Param]) -> Result<u64, DbError>;

    /// Returns the first row, or [`DbError::NoRows`] when nothing matched.
    async fn query_row(&self, statement: &str, params: &[Param]) -> Result<Row, DbError>;

    async fn query_rows(&self, statement: &str, params: &[Param]) -> Result<Vec<Row>, DbError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), DbError>;
}

/// [`Database`] backed by an sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: Pool<Sqlite>,
    timeout: Duration,
}

impl SqliteDatabase {
    /// Opens a pool, creating the database file if it does not exist yet.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;
        Ok(Self::from_pool(pool, timeout))
    }

    /// Single-connection in-memory database that lives as long as the pool.
    pub async fn in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::from_pool(pool, Duration::from_secs(5)))
    }

    pub fn from_pool(pool: Pool<Sqlite>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, DbError>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::Timeout(self.timeout)),
        }
    }
}

fn prepare<'q>(statement: &'q str, params: &'q [Param]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params
        .iter()
        .fold(sqlx::query(statement), |query, param| match param {
            Param::Int(value) => query.bind(*value),
            Param::Text(value) => query.bind(value.as_str()),
            Param::Bool(value) => query.bind(*value),
        })
}

fn decode(row: &SqliteRow) -> Result<Row, DbError> {
    let mut columns = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::Int(row.try_get(index)?),
                "REAL" => Value::Real(row.try_get(index)?),
                "TEXT" => Value::Text(row.try_get(index)?),
                _ => Value::Blob(row.try_get(index)?),
            }
        };
        columns.push(value);
    }
    Ok(Row::new(columns))
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, statement: &str, params: &[Param]) -> Result<u64, DbError> {
        let result = self
            .bounded(prepare(statement, params).execute(&self.pool))
            .await?;
        Ok(result.rows_affected())
    }

    async fn query_row(&self, statement: &str, params: &[Param]) -> Result<Row, DbError> {
        match self
            .bounded(prepare(statement, params).fetch_optional(&self.pool))
            .await?
        {
            Some(row) => decode(&row),
            None => Err(DbError::NoRows),
        }
    }

    async fn query_rows(&self, statement: &str, params: &[Param]) -> Result<Vec<Row>, DbError> {
        let rows = self
            .bounded(prepare(statement, params).fetch_all(&self.pool))
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}

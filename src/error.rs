//! Error types for the persistence port and the HTTP layer.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by a [`Database`](crate::db::Database) implementation.
#[derive(Error, Debug)]
pub enum DbError {
    /// A single-row query matched nothing.
    #[error("no rows in result set")]
    NoRows,

    /// A row was read past its last column.
    #[error("column index {index} out of range for row of {len} columns")]
    ColumnOutOfRange { index: usize, len: usize },

    /// A column held a value the caller could not convert.
    #[error("column {index}: cannot read {found} as {expected}")]
    ColumnType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The statement did not finish before the configured deadline.
    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Request-level failures, each rendered as `{"error": "<message>"}`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppError {
    /// Malformed path id or request body.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// Anything else the persistence layer reported.
    #[error("{0}")]
    Persistence(String),

    /// The liveness probe against the database failed.
    #[error("{0}")]
    Health(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Health(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

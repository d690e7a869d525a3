use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, error, info};

use crate::{
    error::{AppError, DbError},
    model::{zero_time, Todo},
    schema::{decode_body, PageParams, TodoPayload},
    AppState,
};

fn persistence_failure(err: DbError) -> AppError {
    error!(%err, "database operation failed");
    AppError::from(err)
}

// Handler for the health checker route
pub async fn health_checker_handler(
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    info!("API application health is OK, checking database");
    if let Err(err) = data.db.ping().await {
        error!(%err, "database health check failed");
        return Err(AppError::Health(err.to_string()));
    }

    Ok(Json(json!({
        "status": "ok",
        "message": "everything working ok"
    })))
}

// Handler for getting a page of Todo items
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let (start, count) = PageParams::from_pairs(pairs).window();
    let todos = data
        .todos()
        .list(start, count)
        .await
        .map_err(persistence_failure)?;

    Ok((StatusCode::OK, Json(todos)))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: TodoPayload = decode_body(&body)
        .map_err(|_| AppError::InvalidInput("Invalid request payload".to_string()))?;

    let todo = data
        .todos()
        .create(payload)
        .await
        .map_err(persistence_failure)?;
    debug!(id = todo.id, "created todo");

    Ok((StatusCode::CREATED, Json(todo)))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let id = id.parse::<i64>().map_err(|_| AppError::InvalidInput("Invalid Todo ID".to_string()))?;

    match data.todos().get(id).await {
        Ok(todo) => Ok((StatusCode::OK, Json(todo))),
        Err(DbError::NoRows) => Err(AppError::NotFound("Todo not found".to_string())),
        Err(err) => Err(persistence_failure(err)),
    }
}

// Handler for updating a Todo by ID. An unknown id is answered like a
// successful update, carrying the zero creation time.
pub async fn update_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = id.parse::<i64>().map_err(|_| AppError::InvalidInput("Invalid Todo ID".to_string()))?;
    let payload: TodoPayload = decode_body(&body).map_err(|err| {
        AppError::InvalidInput(format!("Invalid todo payload json error: {err}"))
    })?;

    let created_on = data
        .todos()
        .update(id, &payload)
        .await
        .map_err(persistence_failure)?;
    debug!(id, found = created_on.is_some(), "updated todo");

    Ok((
        StatusCode::OK,
        Json(Todo {
            id,
            text: payload.text,
            done: payload.done,
            created_on: created_on.unwrap_or_else(zero_time),
        }),
    ))
}

// Handler for deleting a Todo by ID. A malformed id is reported as a server
// error and a missing row still counts as success.
pub async fn delete_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let id = id.parse::<i64>().map_err(|err| AppError::Persistence(err.to_string()))?;

    let affected = data
        .todos()
        .delete(id)
        .await
        .map_err(persistence_failure)?;
    debug!(id, affected, "deleted todo");

    Ok((StatusCode::OK, Json(json!({ "result": "success" }))))
}

use std::sync::Arc;

use axum::{middleware::from_fn, routing::get, Router};

use crate::{handler::*, middleware::mw_require_numeric_id, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/todos/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route_layer(from_fn(mw_require_numeric_id))
        .route("/todos", get(get_todos).post(create_todo))
        .route("/healthz", get(health_checker_handler))
        .with_state(app_state)
}

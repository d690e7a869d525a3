use axum::{
    extract::Path,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Route guard for `/todos/:id`: the segment must be one or more ASCII
/// digits, otherwise the path does not match and nothing else runs.
pub async fn mw_require_numeric_id<B>(
    Path(id): Path<String>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    next.run(request).await
}

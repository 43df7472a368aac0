//! REST handlers for the dashboard.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use bossman_core::db::StoreError;
use bossman_core::{ListOpts, Task, TaskStatus, TaskStore};

type AppState = Arc<TaskStore>;
type ApiError = (StatusCode, Json<ErrorResponse>);

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

pub fn router(store: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/blockers", get(get_blockers))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

async fn index() -> &'static str {
    "bossman"
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<TaskStatus>,
    parent_id: Option<String>,
    limit: Option<i64>,
}

async fn list_tasks(
    State(store): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let opts = ListOpts {
        status: params.status,
        parent_id: params.parent_id,
        limit: params.limit.unwrap_or(0),
    };
    store.query_tasks(&opts).map(Json).map_err(internal_error)
}

async fn get_task(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    match store.get_task(&id) {
        Ok(Some(task)) => Ok(Json(task)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("task not found: {}", id))),
        )),
        Err(err) => Err(internal_error(err)),
    }
}

async fn get_blockers(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    store.get_blockers(&id).map(Json).map_err(internal_error)
}

fn internal_error(err: StoreError) -> ApiError {
    tracing::error!(%err, "store query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(err.to_string())),
    )
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Notification};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_read))
        .route("/notifications/mark-all-read", post(mark_all_read))
}

#[instrument(skip(state))]
async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let notifications = repo::list_recent(&state.db, 50).await.map_err(internal)?;
    Ok(Json(notifications))
}

#[instrument(skip(state))]
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let updated = repo::mark_read(&state.db, id).await.map_err(internal)?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "notification not found".into()))
    }
}

#[instrument(skip(state))]
async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<StatusCode, (StatusCode, String)> {
    repo::mark_all_read(&state.db).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

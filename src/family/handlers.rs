use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::repo::{self, AgeGroup, FamilyMember};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/family", get(list_family).post(create_member))
}

#[instrument(skip(state))]
async fn list_family(
    State(state): State<AppState>,
) -> Result<Json<Vec<FamilyMember>>, (StatusCode, String)> {
    let members = repo::list(&state.db).await.map_err(internal)?;
    Ok(Json(members))
}

#[derive(Debug, Deserialize)]
struct CreateMemberRequest {
    name: String,
    age_group: AgeGroup,
}

#[instrument(skip(state, payload))]
async fn create_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<Json<FamilyMember>, (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }
    let member = repo::create(&state.db, name, payload.age_group)
        .await
        .map_err(internal)?;
    Ok(Json(member))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

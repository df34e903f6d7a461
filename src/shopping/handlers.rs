use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{AlexaItemRequest, CreateShoppingRequest, PatchShoppingRequest};
use super::repo::{self, NewShoppingEntry, ShoppingEntry, ShoppingPatch, REASON_ALEXA, REASON_MANUAL};
use crate::catalog;
use crate::notify::{self, NewNotification, TYPE_SHOPPING_REMINDER};
use crate::state::AppState;
use crate::units::sanitize_unit;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-lists", get(list_entries).post(create_entry))
        .route(
            "/shopping-lists/:id",
            axum::routing::patch(patch_entry).delete(delete_entry),
        )
        .route("/alexa/shopping-list", post(alexa_add_item))
}

#[instrument(skip(state))]
async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShoppingEntry>>, (StatusCode, String)> {
    let entries = repo::list(&state.db).await.map_err(internal)?;
    Ok(Json(entries))
}

#[instrument(skip(state, payload))]
async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateShoppingRequest>,
) -> Result<Json<ShoppingEntry>, (StatusCode, String)> {
    if payload.product_id.is_none() && payload.name.as_deref().map_or(true, |n| n.trim().is_empty())
    {
        return Err((StatusCode::BAD_REQUEST, "product_id or name is required".into()));
    }

    let entry = NewShoppingEntry {
        product_id: payload.product_id,
        name: if payload.product_id.is_some() {
            None
        } else {
            payload.name.clone()
        },
        quantity: payload.quantity.max(0.0),
        unit: sanitize_unit(&payload.unit).as_str().to_string(),
        priority: payload.priority,
        added_reason: REASON_MANUAL.to_string(),
    };
    let inserted = repo::insert(&state.db, &entry).await.map_err(internal)?;

    let label = payload.name.unwrap_or_else(|| "Article".to_string());
    notify::record(
        &state,
        NewNotification {
            kind: TYPE_SHOPPING_REMINDER.into(),
            title: "Ajout dans la liste de courses".into(),
            message: format!("{label} ajouté à la liste ({} {})", entry.quantity, entry.unit),
            related_product_id: entry.product_id,
        },
    )
    .await;

    Ok(Json(inserted))
}

#[instrument(skip(state, payload))]
async fn patch_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatchShoppingRequest>,
) -> Result<Json<ShoppingEntry>, (StatusCode, String)> {
    let fields = ShoppingPatch {
        quantity: payload.quantity.map(|q| q.max(0.0)),
        unit: payload.unit.map(|u| sanitize_unit(&u).as_str().to_string()),
        priority: payload.priority,
        is_purchased: payload.is_purchased,
    };
    match repo::patch(&state.db, id, &fields).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "shopping entry not found".into())),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "shopping entry not found".into()))
    }
}

#[instrument(skip(state, payload))]
async fn alexa_add_item(
    State(state): State<AppState>,
    Json(payload): Json<AlexaItemRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let item = payload.item.trim();
    if item.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "item is required".into()));
    }

    let product = match catalog::repo::find_product_fuzzy(&state.db, item).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, item, "product lookup failed, keeping the free-text entry");
            None
        }
    };

    let entry = NewShoppingEntry {
        product_id: product.as_ref().map(|p| p.id),
        name: if product.is_some() {
            None
        } else {
            Some(item.to_string())
        },
        quantity: payload.quantity.max(0.0),
        unit: sanitize_unit(&payload.unit).as_str().to_string(),
        priority: repo::PRIORITY_MEDIUM.to_string(),
        added_reason: REASON_ALEXA.to_string(),
    };
    let inserted = repo::insert(&state.db, &entry).await.map_err(internal)?;

    notify::record(
        &state,
        NewNotification {
            kind: TYPE_SHOPPING_REMINDER.into(),
            title: "Demande Alexa".into(),
            message: format!("{item} ajouté via Alexa"),
            related_product_id: entry.product_id,
        },
    )
    .await;

    Ok(Json(json!({ "success": true, "item": inserted })))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

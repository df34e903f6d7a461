use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateInventoryRequest, InventoryItem, UpdateInventoryRequest};
use super::repo::{self, InventoryPatch, NewInventoryEntry, Product};
use crate::state::AppState;
use crate::units::sanitize_unit;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route(
            "/inventory/:id",
            axum::routing::put(update_inventory).delete(delete_inventory),
        )
}

#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, (StatusCode, String)> {
    let products = repo::list_products(&state.db).await.map_err(internal)?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryItem>>, (StatusCode, String)> {
    let (entries, products) = tokio::try_join!(
        repo::list_inventory(&state.db),
        repo::list_products(&state.db),
    )
    .map_err(internal)?;

    let by_id: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();
    let items = entries
        .into_iter()
        .map(|entry| {
            let product = by_id.get(&entry.product_id).cloned();
            InventoryItem { entry, product }
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<Json<InventoryItem>, (StatusCode, String)> {
    let unit = payload.unit.clone();

    let product = match (payload.product_id, payload.name.as_deref()) {
        (Some(id), _) => {
            let products = repo::list_products(&state.db).await.map_err(internal)?;
            products
                .into_iter()
                .find(|p| p.id == id)
                .ok_or((StatusCode::NOT_FOUND, "unknown product".to_string()))?
        }
        (None, Some(name)) if !name.trim().is_empty() => {
            repo::find_or_create_product(&state.db, name, unit.as_deref())
                .await
                .map_err(internal)?
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "product_id or name is required".into(),
            ))
        }
    };

    let unit = unit
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| product.default_unit.clone());
    let entry = NewInventoryEntry {
        product_id: product.id,
        quantity: payload.quantity.unwrap_or(0.0).max(0.0),
        unit: sanitize_unit(&unit).as_str().to_string(),
        expiry_date: payload.expiry_date,
        minimum_threshold: payload.minimum_threshold.max(0.0),
    };
    let entry = repo::insert_inventory(&state.db, &entry)
        .await
        .map_err(internal)?;
    Ok(Json(InventoryItem {
        entry,
        product: Some(product),
    }))
}

#[instrument(skip(state, payload))]
async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> Result<Json<super::repo::InventoryEntry>, (StatusCode, String)> {
    let patch = InventoryPatch {
        quantity: payload.quantity.map(|q| q.max(0.0)),
        unit: payload
            .unit
            .map(|u| sanitize_unit(&u).as_str().to_string()),
        expiry_date: payload.expiry_date,
        minimum_threshold: payload.minimum_threshold.map(|t| t.max(0.0)),
    };
    match repo::update_inventory(&state.db, id, &patch).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "inventory entry not found".into())),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete_inventory(&state.db, id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "inventory entry not found".into()))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

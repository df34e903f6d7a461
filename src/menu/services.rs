//! Orchestration of a generation run: snapshot reads, allocation, link
//! sanitation and best-effort persistence of the side effects.

use rand::thread_rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::plan::{self, MenuSource, PlanOutcome, PlanRequest, Snapshot};
use super::repo::{self, Menu};
use crate::catalog::repo as catalog_repo;
use crate::family::{self, demo_family};
use crate::notify::{self, NewNotification, TYPE_LOW_STOCK, TYPE_SHOPPING_REMINDER};
use crate::recipes::{self, repo::fallback_recipes};
use crate::shopping::repo as shopping_repo;
use crate::shopping::NewShoppingEntry;
use crate::state::AppState;

pub struct GenerationResult {
    pub source: MenuSource,
    pub menus: Vec<Menu>,
}

/// Reads everything the allocator needs in one round. A fresh install with
/// no family or recipes falls back to the built-in demo data.
pub async fn read_snapshot(state: &AppState) -> anyhow::Result<Snapshot> {
    let (family, products, inventory, recipes, shopping) = tokio::try_join!(
        family::repo::list(&state.db),
        catalog_repo::list_products(&state.db),
        catalog_repo::list_inventory(&state.db),
        recipes::repo::list(&state.db),
        shopping_repo::list_unpurchased(&state.db),
    )?;

    Ok(Snapshot {
        family: if family.is_empty() { demo_family() } else { family },
        products,
        inventory,
        recipes: if recipes.is_empty() {
            fallback_recipes()
        } else {
            recipes
        },
        shopping,
    })
}

/// Runs the allocator and persists its outcome. Snapshot reads are fatal;
/// every write after allocation is best-effort so a partial storage failure
/// never loses the generated plan.
pub async fn generate(state: &AppState, request: PlanRequest) -> anyhow::Result<GenerationResult> {
    let snapshot = read_snapshot(state).await?;
    let outcome = plan::allocate(&snapshot, &request, &mut thread_rng());
    info!(
        slots = outcome.slots.len(),
        deltas = outcome.shopping_deltas.len(),
        source = outcome.source.as_str(),
        "meal plan allocated"
    );

    persist_inventory(state, &outcome).await;
    persist_shopping(state, &outcome).await;
    notify_low_stock(state, &snapshot, &outcome).await;

    let menus = persist_menus(state, &outcome).await;
    Ok(GenerationResult {
        source: outcome.source,
        menus,
    })
}

async fn persist_inventory(state: &AppState, outcome: &PlanOutcome) {
    for write in &outcome.inventory_writes {
        if let Err(e) =
            catalog_repo::set_inventory_quantity(&state.db, write.entry_id, write.quantity).await
        {
            warn!(entry_id = %write.entry_id, error = %e, "inventory write-back failed");
        }
    }
}

async fn persist_shopping(state: &AppState, outcome: &PlanOutcome) {
    let mut inserts = Vec::new();
    for delta in &outcome.shopping_deltas {
        match delta.existing_id {
            Some(id) => {
                if let Err(e) =
                    shopping_repo::merge_quantity(&state.db, id, delta.quantity, delta.unit.as_str())
                        .await
                {
                    warn!(shopping_id = %id, error = %e, "shopping merge failed");
                }
            }
            None => inserts.push(NewShoppingEntry {
                product_id: delta.product_id,
                name: delta.name.clone(),
                quantity: delta.quantity,
                unit: delta.unit.as_str().to_string(),
                priority: shopping_repo::PRIORITY_HIGH.to_string(),
                added_reason: shopping_repo::REASON_AUTO.to_string(),
            }),
        }
    }
    if inserts.is_empty() {
        return;
    }
    let count = inserts.len();
    if let Err(e) = shopping_repo::insert_many(&state.db, &inserts).await {
        warn!(error = %e, "shopping inserts failed");
        return;
    }
    notify::record(
        state,
        NewNotification {
            kind: TYPE_SHOPPING_REMINDER.to_string(),
            title: "Liste de courses mise à jour".to_string(),
            message: format!("{count} article(s) à acheter pour les prochains repas."),
            related_product_id: None,
        },
    )
    .await;
}

async fn notify_low_stock(state: &AppState, snapshot: &Snapshot, outcome: &PlanOutcome) {
    for alert in &outcome.low_stock {
        let product_name = snapshot
            .products
            .iter()
            .find(|p| p.id == alert.product_id)
            .map(|p| p.name.as_str())
            .unwrap_or("produit");
        notify::record(
            state,
            NewNotification {
                kind: TYPE_LOW_STOCK.to_string(),
                title: "Stock faible".to_string(),
                message: format!(
                    "{product_name}: il reste {} {}.",
                    alert.quantity, alert.unit
                ),
                related_product_id: Some(alert.product_id),
            },
        )
        .await;
    }
}

/// Replaces this run's generated menus in the covered range, sanitizing each
/// slot's recipe link first. Hand-entered menus keep their slots. A failed
/// upsert keeps the in-memory slot in the response under a synthetic id.
async fn persist_menus(state: &AppState, outcome: &PlanOutcome) -> Vec<Menu> {
    let source = outcome.source.as_str();

    if let (Some(from), Some(to)) = (
        outcome.slots.iter().map(|s| s.date).min(),
        outcome.slots.iter().map(|s| s.date).max(),
    ) {
        if let Err(e) = repo::delete_generated_range(&state.db, from, to, source).await {
            warn!(error = %e, "clearing generated menus failed");
        }
    }

    let mut menus = Vec::with_capacity(outcome.slots.len());
    for slot in &outcome.slots {
        let recipe_url = state
            .links
            .sanitize(slot.raw_recipe_url.as_deref(), &slot.title)
            .await;

        let id = match repo::upsert_slot(&state.db, slot, source, recipe_url.as_deref()).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(date = %slot.date, meal = %slot.meal_type, "slot held by a hand-entered menu");
                continue;
            }
            Err(e) => {
                warn!(date = %slot.date, meal = %slot.meal_type, error = %e, "menu upsert failed");
                Uuid::new_v4()
            }
        };
        menus.push(repo::menu_from_slot(id, slot, source, recipe_url));
    }
    menus
}

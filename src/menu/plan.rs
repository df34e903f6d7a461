//! The meal-plan allocator: fills a (day, meal type) grid from the recipe
//! pool, consumes inventory FIFO by expiry, and emits shopping deltas and
//! low-stock alerts.
//!
//! Everything here is pure over an in-memory snapshot; the service layer
//! owns I/O. Randomness is injected so tests can seed it.

use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use time::Date;
use uuid::Uuid;

use crate::catalog::{InventoryEntry, Product};
use crate::family::{AgeGroup, FamilyMember};
use crate::menu::portions::portion_multiplier;
use crate::recipes::{IngredientSpec, MealType, Recipe};
use crate::shopping::ShoppingEntry;
use crate::text::normalize_label;
use crate::units::{normalize_quantity, Unit, DEFAULT_FAMILY_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    Ready,
    MissingPartial,
    MissingAll,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Ready => "ready",
            StockStatus::MissingPartial => "missing-partial",
            StockStatus::MissingAll => "missing-all",
        }
    }
}

/// Source tag stored on generated rows. Hand-entered menus carry the string
/// `manual` straight in the table; no generation run produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuSource {
    Auto,
    Ai,
}

impl MenuSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MenuSource::Auto => "auto",
            MenuSource::Ai => "ai",
        }
    }
}

/// One meal of a caller-supplied plan; bypasses recipe selection and portion
/// scaling (its quantities are taken as absolute).
#[derive(Debug, Clone)]
pub struct ManualMeal {
    pub meal_type: MealType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Vec<IngredientSpec>,
    pub suitable_for: Option<Vec<Uuid>>,
    pub suitable_for_toddler: Option<bool>,
    pub portion_multiplier: Option<f64>,
    pub prep_time_minutes: Option<f64>,
    pub cook_time_minutes: Option<f64>,
    pub recipe_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub days: Vec<Date>,
    pub meal_types: Vec<MealType>,
    pub manual: Option<BTreeMap<Date, Vec<ManualMeal>>>,
}

/// Inventory, family and recipe state read once at request start.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub family: Vec<FamilyMember>,
    pub products: Vec<Product>,
    pub inventory: Vec<InventoryEntry>,
    pub recipes: Vec<Recipe>,
    /// Unpurchased shopping entries, used as merge targets for deltas.
    pub shopping: Vec<ShoppingEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedIngredient {
    pub name: String,
    pub product_id: Option<Uuid>,
    pub quantity: f64,
    pub unit: Unit,
    pub available_qty: f64,
    pub missing_qty: f64,
}

#[derive(Debug, Clone)]
pub struct PlannedSlot {
    pub date: Date,
    pub meal_type: MealType,
    pub title: String,
    pub description: String,
    pub suitable_for: Vec<Uuid>,
    pub portion_multiplier: f64,
    pub suitable_for_toddler: bool,
    pub stock_status: StockStatus,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    /// Link as proposed, before sanitation.
    pub raw_recipe_url: Option<String>,
    pub ingredients: Vec<PlannedIngredient>,
}

#[derive(Debug, Clone)]
pub struct InventoryWrite {
    pub entry_id: Uuid,
    pub quantity: f64,
}

/// Shortfall aggregated per product (or free-text name). `existing_id` set
/// means "merge into that unpurchased entry"; `quantity` is already the
/// summed total to store.
#[derive(Debug, Clone)]
pub struct ShoppingDelta {
    pub existing_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone)]
pub struct LowStockAlert {
    pub entry_id: Uuid,
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub source: MenuSource,
    pub slots: Vec<PlannedSlot>,
    pub inventory_writes: Vec<InventoryWrite>,
    pub shopping_deltas: Vec<ShoppingDelta>,
    pub low_stock: Vec<LowStockAlert>,
}

/// Scores a recipe against available stock: the mean, over ingredients with
/// a positive scaled requirement, of `min(available / required, 1)`.
/// `available_for` receives the normalized ingredient name and returns the
/// total stock for a known product, or None for an unknown one. Recipes
/// with no scoreable ingredient score 0.
pub fn availability_score<F>(recipe: &Recipe, multiplier: f64, available_for: F) -> f64
where
    F: Fn(&str) -> Option<f64>,
{
    let mut total = 0.0;
    let mut counted = 0u32;
    for ingredient in &recipe.ingredients {
        let required = ingredient.quantity.unwrap_or(0.0) * multiplier;
        if required <= 0.0 {
            continue;
        }
        counted += 1;
        let Some(available) = available_for(&normalize_label(&ingredient.name)) else {
            continue;
        };
        if available <= 0.0 {
            continue;
        }
        total += (available / required).min(1.0);
    }
    if counted == 0 {
        return 0.0;
    }
    ((total / f64::from(counted)) * 1000.0).round() / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_minutes(value: Option<f64>) -> Option<i32> {
    let v = value?;
    if !v.is_finite() {
        return None;
    }
    Some(v.round().max(0.0) as i32)
}

#[derive(Debug)]
struct Batch {
    entry_id: Uuid,
    product_id: Uuid,
    quantity: f64,
    unit: String,
    minimum_threshold: f64,
    dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DeltaKey {
    Product(Uuid),
    Name(String),
}

#[derive(Debug)]
struct DeltaAcc {
    existing_id: Option<Uuid>,
    product_id: Option<Uuid>,
    name: Option<String>,
    base_quantity: f64,
    added: f64,
    unit: Unit,
}

struct PlanState<'a> {
    family: &'a [FamilyMember],
    multiplier: f64,
    has_toddler: bool,
    product_index: HashMap<String, &'a Product>,
    batches: HashMap<Uuid, Vec<Batch>>,
    deltas: BTreeMap<DeltaKey, DeltaAcc>,
    low_stock: Vec<LowStockAlert>,
    alerted_entries: HashSet<Uuid>,
    used_recipes: HashSet<String>,
}

impl<'a> PlanState<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        let family = snapshot.family.as_slice();
        let family_size = if family.is_empty() {
            DEFAULT_FAMILY_SIZE
        } else {
            family.len()
        };
        let mut product_index = HashMap::new();
        for product in &snapshot.products {
            product_index.insert(normalize_label(&product.name), product);
        }

        // Batches carry normalized quantities; draw order is ascending
        // expiry with no-expiry batches last.
        let mut batches: HashMap<Uuid, Vec<Batch>> = HashMap::new();
        for entry in &snapshot.inventory {
            let normalized = normalize_quantity(Some(entry.quantity), &entry.unit, family_size);
            batches.entry(entry.product_id).or_default().push(Batch {
                entry_id: entry.id,
                product_id: entry.product_id,
                quantity: normalized.quantity.unwrap_or(entry.quantity.max(0.0)),
                unit: normalized.unit.as_str().to_string(),
                minimum_threshold: entry.minimum_threshold,
                dirty: false,
            });
        }
        let expiry_of = |id: Uuid| {
            snapshot
                .inventory
                .iter()
                .find(|e| e.id == id)
                .and_then(|e| e.expiry_date)
        };
        for list in batches.values_mut() {
            list.sort_by_key(|b| expiry_of(b.entry_id).unwrap_or(Date::MAX));
        }

        let mut deltas = BTreeMap::new();
        for entry in &snapshot.shopping {
            if entry.is_purchased {
                continue;
            }
            let key = match (entry.product_id, entry.name.as_deref()) {
                (Some(id), _) => DeltaKey::Product(id),
                (None, Some(name)) if !name.is_empty() => {
                    DeltaKey::Name(normalize_label(name))
                }
                _ => continue,
            };
            deltas.entry(key).or_insert(DeltaAcc {
                existing_id: Some(entry.id),
                product_id: entry.product_id,
                name: entry.name.clone(),
                base_quantity: entry.quantity,
                added: 0.0,
                unit: crate::units::sanitize_unit(&entry.unit),
            });
        }

        Self {
            family,
            multiplier: portion_multiplier(family),
            has_toddler: family.iter().any(|m| m.age_group == AgeGroup::Toddler),
            product_index,
            batches,
            deltas,
            low_stock: Vec::new(),
            alerted_entries: HashSet::new(),
            used_recipes: HashSet::new(),
        }
    }

    /// Clamp bounds fall back to the default household of four when the
    /// roster is empty.
    fn family_size(&self) -> usize {
        if self.family.is_empty() {
            DEFAULT_FAMILY_SIZE
        } else {
            self.family.len()
        }
    }

    fn available_total(&self, product_id: Uuid) -> f64 {
        self.batches
            .get(&product_id)
            .map(|list| list.iter().map(|b| b.quantity.max(0.0)).sum())
            .unwrap_or(0.0)
    }

    fn score(&self, recipe: &Recipe) -> f64 {
        availability_score(recipe, self.multiplier, |normalized_name| {
            self.product_index
                .get(normalized_name)
                .map(|product| self.available_total(product.id))
        })
    }

    /// Candidate selection: right meal type (whole pool as fallback),
    /// toddler-friendly preference, no repeats while alternatives remain,
    /// then a uniform pick among everything within 0.05 of the top score.
    fn draw_recipe<'r, R: Rng>(
        &self,
        recipes: &'r [Recipe],
        meal: MealType,
        rng: &mut R,
    ) -> Option<&'r Recipe> {
        let typed: Vec<&Recipe> = recipes.iter().filter(|r| r.meal_type == meal).collect();
        let base: Vec<&Recipe> = if typed.is_empty() {
            recipes.iter().collect()
        } else {
            typed
        };

        let pool: Vec<&Recipe> = if self.has_toddler {
            let friendly: Vec<&Recipe> = base
                .iter()
                .copied()
                .filter(|r| r.suitable_for_toddler)
                .collect();
            if friendly.is_empty() {
                base
            } else {
                friendly
            }
        } else {
            base
        };

        let fresh: Vec<&Recipe> = pool
            .iter()
            .copied()
            .filter(|r| !self.used_recipes.contains(&r.id))
            .collect();
        let source = if fresh.is_empty() { pool } else { fresh };
        if source.is_empty() {
            return None;
        }

        let mut scored: Vec<(&Recipe, f64)> =
            source.into_iter().map(|r| (r, self.score(r))).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top = scored[0].1;
        let bucket: Vec<&Recipe> = scored
            .iter()
            .filter(|(_, s)| (s - top).abs() < 0.05)
            .map(|(r, _)| *r)
            .collect();
        Some(bucket[rng.gen_range(0..bucket.len())])
    }

    /// Draws up to `required` from the product's batches in expiry order.
    /// Returns the consumed amount.
    fn consume_fifo(&mut self, product_id: Uuid, required: f64) -> f64 {
        let Some(list) = self.batches.get_mut(&product_id) else {
            return 0.0;
        };
        let mut remaining = required;
        let mut consumed = 0.0;
        for batch in list.iter_mut() {
            if remaining <= 0.0 {
                break;
            }
            if batch.quantity <= 0.0 {
                continue;
            }
            let take = batch.quantity.min(remaining);
            batch.quantity = round2(batch.quantity - take);
            consumed += take;
            remaining -= take;
            batch.dirty = true;
        }
        consumed
    }

    fn queue_low_stock_alerts(&mut self, product_id: Uuid) {
        let Some(list) = self.batches.get(&product_id) else {
            return;
        };
        let mut alerts = Vec::new();
        for batch in list {
            if !batch.dirty || batch.quantity > batch.minimum_threshold {
                continue;
            }
            if self.alerted_entries.contains(&batch.entry_id) {
                continue;
            }
            alerts.push(LowStockAlert {
                entry_id: batch.entry_id,
                product_id: batch.product_id,
                quantity: batch.quantity,
                unit: batch.unit.clone(),
            });
        }
        for alert in alerts {
            self.alerted_entries.insert(alert.entry_id);
            self.low_stock.push(alert);
        }
    }

    fn add_shortfall(
        &mut self,
        product: Option<&Product>,
        raw_name: &str,
        missing: f64,
        unit: Unit,
    ) {
        let (key, product_id, name) = match product {
            Some(p) => (DeltaKey::Product(p.id), Some(p.id), None),
            None => (
                DeltaKey::Name(normalize_label(raw_name)),
                None,
                Some(raw_name.to_string()),
            ),
        };
        let acc = self.deltas.entry(key).or_insert(DeltaAcc {
            existing_id: None,
            product_id,
            name,
            base_quantity: 0.0,
            added: 0.0,
            unit,
        });
        acc.added += missing;
    }
}

/// Runs one generation pass over the snapshot. The caller persists the
/// returned writes and sanitizes each slot's link afterwards.
pub fn allocate<R: Rng>(snapshot: &Snapshot, request: &PlanRequest, rng: &mut R) -> PlanOutcome {
    let mut state = PlanState::new(snapshot);
    let family_size = state.family_size();

    let manual = request.manual.as_ref().filter(|m| !m.is_empty());
    let source = if manual.is_some() {
        MenuSource::Ai
    } else {
        MenuSource::Auto
    };

    // A manual plan can extend the requested grid with its own days and
    // meal types; slots it does not cover are still auto-filled. Duplicates
    // in the request collapse so the grid holds one slot per (day, meal).
    let mut days: Vec<Date> = Vec::new();
    for day in &request.days {
        if !days.contains(day) {
            days.push(*day);
        }
    }
    if let Some(plan) = manual {
        for day in plan.keys() {
            if !days.contains(day) {
                days.push(*day);
            }
        }
        days.sort();
    }
    let mut meal_types: Vec<MealType> = Vec::new();
    for meal in &request.meal_types {
        if !meal_types.contains(meal) {
            meal_types.push(*meal);
        }
    }
    if meal_types.is_empty() {
        meal_types = MealType::DEFAULT_SET.to_vec();
    }
    if let Some(plan) = manual {
        for meals in plan.values() {
            for meal in meals {
                if !meal_types.contains(&meal.meal_type) {
                    meal_types.push(meal.meal_type);
                }
            }
        }
    }

    let mut slots = Vec::new();

    for day in &days {
        let planned_meals = manual.and_then(|plan| plan.get(day));

        for meal_type in &meal_types {
            let manual_meal =
                planned_meals.and_then(|meals| meals.iter().find(|m| m.meal_type == *meal_type));

            let recipe = match manual_meal {
                Some(_) => None,
                None => {
                    let Some(chosen) = state.draw_recipe(&snapshot.recipes, *meal_type, rng)
                    else {
                        continue;
                    };
                    state.used_recipes.insert(chosen.id.clone());
                    Some(chosen)
                }
            };

            let ingredients: &[IngredientSpec] = match (manual_meal, recipe) {
                (Some(m), _) => &m.ingredients,
                (None, Some(r)) => &r.ingredients,
                (None, None) => &[],
            };

            let toddler_ok = manual_meal
                .and_then(|m| m.suitable_for_toddler)
                .or(recipe.map(|r| r.suitable_for_toddler))
                .unwrap_or(true);

            let suitable_for: Vec<Uuid> = match manual_meal.and_then(|m| m.suitable_for.as_ref()) {
                Some(ids) => ids
                    .iter()
                    .copied()
                    .filter(|id| state.family.iter().any(|m| m.id == *id))
                    .collect(),
                None if !toddler_ok => state
                    .family
                    .iter()
                    .filter(|m| m.age_group != AgeGroup::Toddler)
                    .map(|m| m.id)
                    .collect(),
                None => state.family.iter().map(|m| m.id).collect(),
            };

            let mut lines = Vec::new();
            let mut has_missing = false;
            let mut any_consumed = false;

            for ingredient in ingredients {
                let normalized_name = normalize_label(&ingredient.name);
                let product = state.product_index.get(&normalized_name).copied();

                let base_quantity = ingredient.quantity.unwrap_or(0.0);
                let raw_unit = ingredient
                    .unit
                    .clone()
                    .or_else(|| product.map(|p| p.default_unit.clone()))
                    .unwrap_or_else(|| "pcs".to_string());
                let scaled = if manual_meal.is_some() {
                    base_quantity
                } else {
                    base_quantity * state.multiplier
                };
                let normalized = normalize_quantity(Some(scaled), &raw_unit, family_size);
                let Some(required) = normalized.quantity else {
                    continue;
                };
                let unit = normalized.unit;

                let Some(product) = product else {
                    has_missing = true;
                    lines.push(PlannedIngredient {
                        name: ingredient.name.clone(),
                        product_id: None,
                        quantity: round2(required),
                        unit,
                        available_qty: 0.0,
                        missing_qty: round2(required),
                    });
                    state.add_shortfall(None, &ingredient.name, required, unit);
                    continue;
                };

                let consumed = state.consume_fifo(product.id, required);
                let missing = round2(required - consumed);
                if missing > 0.0 {
                    has_missing = true;
                }
                if consumed > 0.0 {
                    any_consumed = true;
                }

                lines.push(PlannedIngredient {
                    name: product.name.clone(),
                    product_id: Some(product.id),
                    quantity: round2(required),
                    unit,
                    available_qty: round2(consumed),
                    missing_qty: missing,
                });

                if missing > 0.0 {
                    state.add_shortfall(Some(product), &ingredient.name, missing, unit);
                }
                state.queue_low_stock_alerts(product.id);
            }

            let stock_status = if !any_consumed {
                StockStatus::MissingAll
            } else if has_missing {
                StockStatus::MissingPartial
            } else {
                StockStatus::Ready
            };

            let title = manual_meal
                .and_then(|m| m.title.clone())
                .or_else(|| recipe.map(|r| r.title.clone()))
                .unwrap_or_else(|| meal_type.as_str().to_string());
            let description = manual_meal
                .and_then(|m| m.description.clone())
                .or_else(|| recipe.and_then(|r| r.description.clone()))
                .unwrap_or_default();
            let raw_recipe_url = manual_meal
                .and_then(|m| m.recipe_url.clone())
                .or_else(|| recipe.and_then(|r| r.recipe_url.clone()));

            slots.push(PlannedSlot {
                date: *day,
                meal_type: *meal_type,
                title,
                description,
                suitable_for,
                portion_multiplier: manual_meal
                    .and_then(|m| m.portion_multiplier)
                    .unwrap_or(state.multiplier),
                suitable_for_toddler: toddler_ok,
                stock_status,
                prep_time_minutes: parse_minutes(
                    manual_meal
                        .and_then(|m| m.prep_time_minutes)
                        .or_else(|| recipe.and_then(|r| r.prep_time_minutes.map(f64::from))),
                ),
                cook_time_minutes: parse_minutes(
                    manual_meal
                        .and_then(|m| m.cook_time_minutes)
                        .or_else(|| recipe.and_then(|r| r.cook_time_minutes.map(f64::from))),
                ),
                raw_recipe_url,
                ingredients: lines,
            });
        }
    }

    let inventory_writes = state
        .batches
        .values()
        .flatten()
        .filter(|b| b.dirty)
        .map(|b| InventoryWrite {
            entry_id: b.entry_id,
            quantity: b.quantity,
        })
        .collect();

    let shopping_deltas = state
        .deltas
        .into_values()
        .filter(|acc| acc.added > 0.0)
        .map(|acc| ShoppingDelta {
            existing_id: acc.existing_id,
            product_id: acc.product_id,
            name: acc.name,
            quantity: round2(acc.base_quantity + acc.added),
            unit: acc.unit,
        })
        .collect();

    PlanOutcome {
        source,
        slots,
        inventory_writes,
        shopping_deltas,
        low_stock: state.low_stock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::date;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn adult(n: u128) -> FamilyMember {
        FamilyMember {
            id: Uuid::from_u128(n),
            name: format!("adult-{n}"),
            age_group: AgeGroup::Adult,
        }
    }

    fn toddler(n: u128) -> FamilyMember {
        FamilyMember {
            id: Uuid::from_u128(n),
            name: format!("toddler-{n}"),
            age_group: AgeGroup::Toddler,
        }
    }

    fn product(n: u128, name: &str) -> Product {
        Product {
            id: Uuid::from_u128(n),
            name: name.to_string(),
            default_unit: "g".to_string(),
        }
    }

    fn batch(n: u128, product: u128, qty: f64, expiry: Option<Date>) -> InventoryEntry {
        InventoryEntry {
            id: Uuid::from_u128(n),
            product_id: Uuid::from_u128(product),
            quantity: qty,
            unit: "g".to_string(),
            expiry_date: expiry,
            minimum_threshold: 0.0,
        }
    }

    fn recipe(id: &str, meal: MealType, items: &[(&str, f64, &str)]) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: id.to_string(),
            meal_type: meal,
            description: None,
            ingredients: items
                .iter()
                .map(|(name, qty, unit)| IngredientSpec {
                    name: (*name).to_string(),
                    quantity: Some(*qty),
                    unit: Some((*unit).to_string()),
                })
                .collect(),
            suitable_for_toddler: true,
            prep_time_minutes: None,
            cook_time_minutes: None,
            recipe_url: None,
        }
    }

    fn one_day_request(meal: MealType) -> PlanRequest {
        PlanRequest {
            days: vec![date!(2024 - 05 - 06)],
            meal_types: vec![meal],
            manual: None,
        }
    }

    fn four_adults() -> Vec<FamilyMember> {
        (1..=4).map(adult).collect()
    }

    #[test]
    fn ingredient_lines_conserve_quantity() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Riz")],
            inventory: vec![batch(10, 1, 150.0, None)],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Riz", 400.0, "g")])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        assert_eq!(outcome.slots.len(), 1);
        for line in &outcome.slots[0].ingredients {
            assert!(
                (line.available_qty + line.missing_qty - line.quantity).abs() < 0.01,
                "{line:?}"
            );
        }
    }

    #[test]
    fn consumes_batches_fifo_by_expiry() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Riz")],
            inventory: vec![
                batch(10, 1, 300.0, None),
                batch(11, 1, 200.0, Some(date!(2024 - 05 - 10))),
                batch(12, 1, 200.0, Some(date!(2024 - 05 - 08))),
            ],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Riz", 400.0, "g")])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        // Requirement is 400 g: the two expiring batches drain first.
        let write_for = |n: u128| {
            outcome
                .inventory_writes
                .iter()
                .find(|w| w.entry_id == Uuid::from_u128(n))
        };
        assert_eq!(write_for(12).map(|w| w.quantity), Some(0.0));
        assert_eq!(write_for(11).map(|w| w.quantity), Some(0.0));
        assert!(write_for(10).is_none(), "no-expiry batch untouched");
        assert_eq!(outcome.slots[0].stock_status, StockStatus::Ready);
    }

    #[test]
    fn shortfalls_for_one_product_merge_into_one_delta() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Tomates")],
            inventory: vec![],
            recipes: vec![
                recipe("r1", MealType::Lunch, &[("Tomates", 300.0, "g")]),
                recipe("r2", MealType::Dinner, &[("Tomates", 200.0, "g")]),
            ],
            shopping: vec![],
        };
        let request = PlanRequest {
            days: vec![date!(2024 - 05 - 06)],
            meal_types: vec![MealType::Lunch, MealType::Dinner],
            manual: None,
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        assert_eq!(outcome.shopping_deltas.len(), 1);
        let delta = &outcome.shopping_deltas[0];
        assert_eq!(delta.product_id, Some(Uuid::from_u128(1)));
        assert_eq!(delta.existing_id, None);
        // 300 g and 200 g requirements, both fully missing.
        assert!((delta.quantity - 500.0).abs() < 0.01, "{delta:?}");
    }

    #[test]
    fn shortfall_merges_into_existing_unpurchased_entry() {
        let existing = ShoppingEntry {
            id: Uuid::from_u128(99),
            product_id: Some(Uuid::from_u128(1)),
            name: None,
            quantity: 100.0,
            unit: "g".to_string(),
            priority: "medium".to_string(),
            added_reason: "manual".to_string(),
            is_purchased: false,
            added_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Tomates")],
            inventory: vec![],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Tomates", 300.0, "g")])],
            shopping: vec![existing],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        assert_eq!(outcome.shopping_deltas.len(), 1);
        let delta = &outcome.shopping_deltas[0];
        assert_eq!(delta.existing_id, Some(Uuid::from_u128(99)));
        assert!((delta.quantity - 400.0).abs() < 0.01, "{delta:?}");
    }

    #[test]
    fn unmatched_ingredient_becomes_named_delta() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![],
            inventory: vec![],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Câpres", 20.0, "g")])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        let line = &outcome.slots[0].ingredients[0];
        assert_eq!(line.product_id, None);
        assert_eq!(line.available_qty, 0.0);
        assert_eq!(outcome.slots[0].stock_status, StockStatus::MissingAll);
        let delta = &outcome.shopping_deltas[0];
        assert_eq!(delta.name.as_deref(), Some("Câpres"));
        assert_eq!(delta.product_id, None);
    }

    #[test]
    fn partial_consumption_is_missing_partial() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Riz")],
            inventory: vec![batch(10, 1, 150.0, None)],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Riz", 400.0, "g")])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        assert_eq!(outcome.slots[0].stock_status, StockStatus::MissingPartial);
    }

    #[test]
    fn low_stock_alert_fires_once_per_batch() {
        let mut entry = batch(10, 1, 200.0, None);
        entry.minimum_threshold = 100.0;
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Riz")],
            inventory: vec![entry],
            recipes: vec![
                recipe("r1", MealType::Lunch, &[("Riz", 80.0, "g")]),
                recipe("r2", MealType::Dinner, &[("Riz", 80.0, "g")]),
            ],
            shopping: vec![],
        };
        let request = PlanRequest {
            days: vec![date!(2024 - 05 - 06)],
            meal_types: vec![MealType::Lunch, MealType::Dinner],
            manual: None,
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        assert_eq!(outcome.low_stock.len(), 1);
        assert_eq!(outcome.low_stock[0].entry_id, Uuid::from_u128(10));
    }

    #[test]
    fn toddler_household_prefers_toddler_friendly_recipes() {
        let mut spicy = recipe("spicy", MealType::Dinner, &[("Riz", 100.0, "g")]);
        spicy.suitable_for_toddler = false;
        let mild = recipe("mild", MealType::Dinner, &[("Riz", 100.0, "g")]);
        let snapshot = Snapshot {
            family: vec![adult(1), toddler(2)],
            products: vec![],
            inventory: vec![],
            recipes: vec![spicy, mild],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Dinner), &mut rng());
        assert_eq!(outcome.slots[0].title, "mild");
    }

    #[test]
    fn unsuitable_meal_excludes_toddlers_from_suitable_for() {
        let mut spicy = recipe("spicy", MealType::Dinner, &[]);
        spicy.suitable_for_toddler = false;
        let family = vec![adult(1), toddler(2)];
        let snapshot = Snapshot {
            family: family.clone(),
            products: vec![],
            inventory: vec![],
            recipes: vec![spicy],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Dinner), &mut rng());
        assert_eq!(outcome.slots[0].suitable_for, vec![family[0].id]);
    }

    #[test]
    fn recipes_are_not_repeated_while_alternatives_remain() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![],
            inventory: vec![],
            recipes: vec![
                recipe("a", MealType::Lunch, &[]),
                recipe("b", MealType::Lunch, &[]),
                recipe("c", MealType::Lunch, &[]),
            ],
            shopping: vec![],
        };
        let request = PlanRequest {
            days: vec![
                date!(2024 - 05 - 06),
                date!(2024 - 05 - 07),
                date!(2024 - 05 - 08),
            ],
            meal_types: vec![MealType::Lunch],
            manual: None,
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        let titles: HashSet<&str> = outcome.slots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles.len(), 3);
    }

    #[test]
    fn selection_stays_in_the_tie_bucket() {
        // "stocked" scores 1.0; "empty" scores 0.0; "close" scores within
        // 0.05 of the top. Any seed must pick from {stocked, close}.
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Riz"), product(2, "Pain")],
            inventory: vec![batch(10, 1, 720.0, None), batch(11, 2, 690.0, None)],
            recipes: vec![
                recipe("stocked", MealType::Lunch, &[("Riz", 100.0, "g")]),
                recipe("close", MealType::Lunch, &[("Pain", 720.0, "g")]),
                recipe("empty", MealType::Lunch, &[("Lait", 200.0, "ml")]),
            ],
            shopping: vec![],
        };
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng);
            let title = outcome.slots[0].title.as_str();
            assert!(title == "stocked" || title == "close", "seed {seed}: {title}");
        }
    }

    #[test]
    fn manual_plan_bypasses_selection_and_scaling() {
        let mut plan = BTreeMap::new();
        plan.insert(
            date!(2024 - 05 - 06),
            vec![ManualMeal {
                meal_type: MealType::Snack,
                title: Some("Compote maison".into()),
                description: None,
                ingredients: vec![IngredientSpec {
                    name: "Pommes".into(),
                    quantity: Some(500.0),
                    unit: Some("g".into()),
                }],
                suitable_for: None,
                suitable_for_toddler: None,
                portion_multiplier: None,
                prep_time_minutes: Some(10.0),
                cook_time_minutes: Some(20.0),
                recipe_url: None,
            }],
        );
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Pommes")],
            inventory: vec![batch(10, 1, 700.0, None)],
            recipes: vec![recipe("ignored", MealType::Lunch, &[])],
            shopping: vec![],
        };
        let request = PlanRequest {
            days: vec![],
            meal_types: vec![MealType::Lunch],
            manual: Some(plan),
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        assert_eq!(outcome.source, MenuSource::Ai);
        // The uncovered lunch slot is still auto-filled next to the manual snack.
        assert_eq!(outcome.slots.len(), 2);
        let lunch = outcome
            .slots
            .iter()
            .find(|s| s.meal_type == MealType::Lunch)
            .unwrap();
        assert_eq!(lunch.title, "ignored");
        let slot = outcome
            .slots
            .iter()
            .find(|s| s.meal_type == MealType::Snack)
            .unwrap();
        assert_eq!(slot.title, "Compote maison");
        assert_eq!(slot.meal_type, MealType::Snack);
        assert_eq!(slot.prep_time_minutes, Some(10));
        // 500 g taken as absolute, not scaled by the multiplier.
        assert_eq!(slot.ingredients[0].quantity, 500.0);
        assert_eq!(slot.ingredients[0].available_qty, 500.0);
    }

    #[test]
    fn duplicate_grid_entries_collapse_to_one_slot_each() {
        let mut plan = BTreeMap::new();
        plan.insert(
            date!(2024 - 05 - 06),
            vec![ManualMeal {
                meal_type: MealType::Lunch,
                title: Some("Quiche".into()),
                description: None,
                ingredients: vec![],
                suitable_for: None,
                suitable_for_toddler: None,
                portion_multiplier: None,
                prep_time_minutes: None,
                cook_time_minutes: None,
                recipe_url: None,
            }],
        );
        // The same day and meal type repeated, and a manual entry covering
        // that very slot, must still produce a single planned slot.
        let request = PlanRequest {
            days: vec![date!(2024 - 05 - 06), date!(2024 - 05 - 06)],
            meal_types: vec![MealType::Lunch, MealType::Lunch],
            manual: Some(plan),
        };
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![],
            inventory: vec![],
            recipes: vec![recipe("r1", MealType::Lunch, &[])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        let keys: HashSet<(Date, MealType)> = outcome
            .slots
            .iter()
            .map(|s| (s.date, s.meal_type))
            .collect();
        assert_eq!(outcome.slots.len(), keys.len());
        assert_eq!(outcome.slots.len(), 1);
        assert_eq!(outcome.slots[0].title, "Quiche");
    }

    #[test]
    fn generation_source_tags_auto_and_ai_runs() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![],
            inventory: vec![],
            recipes: vec![recipe("r1", MealType::Lunch, &[])],
            shopping: vec![],
        };
        let auto = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        assert_eq!(auto.source, MenuSource::Auto);
        assert_eq!(auto.source.as_str(), "auto");

        // An empty plan map is no plan at all.
        let mut request = one_day_request(MealType::Lunch);
        request.manual = Some(BTreeMap::new());
        let still_auto = allocate(&snapshot, &request, &mut rng());
        assert_eq!(still_auto.source, MenuSource::Auto);
    }

    #[test]
    fn empty_roster_clamps_to_default_household() {
        let mut plan = BTreeMap::new();
        plan.insert(
            date!(2024 - 05 - 06),
            vec![ManualMeal {
                meal_type: MealType::Lunch,
                title: Some("Riz au lait".into()),
                description: None,
                ingredients: vec![IngredientSpec {
                    name: "Riz".into(),
                    quantity: Some(1000.0),
                    unit: Some("g".into()),
                }],
                suitable_for: None,
                suitable_for_toddler: None,
                portion_multiplier: None,
                prep_time_minutes: None,
                cook_time_minutes: None,
                recipe_url: None,
            }],
        );
        let snapshot = Snapshot {
            family: vec![],
            products: vec![product(1, "Riz")],
            inventory: vec![],
            recipes: vec![],
            shopping: vec![],
        };
        let request = PlanRequest {
            days: vec![],
            meal_types: vec![],
            manual: Some(plan),
        };
        let outcome = allocate(&snapshot, &request, &mut rng());
        // Gram clamp tops out at 180 per head for the default household of
        // four, not for a household of one.
        assert_eq!(outcome.slots[0].ingredients[0].quantity, 720.0);
    }

    #[test]
    fn zero_quantity_ingredients_are_skipped() {
        let snapshot = Snapshot {
            family: four_adults(),
            products: vec![product(1, "Sel")],
            inventory: vec![],
            recipes: vec![recipe("r1", MealType::Lunch, &[("Sel", 0.0, "g")])],
            shopping: vec![],
        };
        let outcome = allocate(&snapshot, &one_day_request(MealType::Lunch), &mut rng());
        assert!(outcome.slots[0].ingredients.is_empty());
        assert!(outcome.shopping_deltas.is_empty());
    }

    #[test]
    fn availability_score_means_ratios_over_scoreable_ingredients() {
        let r = recipe(
            "r",
            MealType::Lunch,
            &[("Riz", 100.0, "g"), ("Lait", 200.0, "ml"), ("Sel", 0.0, "g")],
        );
        let score = availability_score(&r, 1.0, |name| match name {
            "riz" => Some(50.0),
            "lait" => Some(400.0),
            _ => None,
        });
        // riz: 50/100 = 0.5; lait capped at 1; sel excluded -> mean 0.75.
        assert_eq!(score, 0.75);

        let none = availability_score(&r, 1.0, |_| None);
        assert_eq!(none, 0.0);
    }

    #[test]
    fn recipe_without_scoreable_ingredients_scores_zero() {
        let r = recipe("r", MealType::Lunch, &[]);
        assert_eq!(availability_score(&r, 1.0, |_| Some(100.0)), 0.0);
    }
}

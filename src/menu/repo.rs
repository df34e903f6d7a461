use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use super::plan::{PlannedIngredient, PlannedSlot};
use crate::recipes::MealType;

const INGREDIENT_INSERT_CHUNK: usize = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuRow {
    pub id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub meal_type: String,
    pub title: String,
    pub description: Option<String>,
    pub suitable_for: Vec<Uuid>,
    pub portion_multiplier: f64,
    pub suitable_for_toddler: bool,
    pub stock_status: String,
    pub source: String,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub recipe_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuIngredientRow {
    pub id: Uuid,
    #[serde(skip)]
    pub menu_id: Uuid,
    pub name: String,
    pub product_id: Option<Uuid>,
    pub quantity: f64,
    pub unit: String,
    pub available_qty: f64,
    pub missing_qty: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    #[serde(flatten)]
    pub row: MenuRow,
    pub ingredients: Vec<MenuIngredientRow>,
}

pub async fn list_range(db: &PgPool, from: Date, to: Date) -> anyhow::Result<Vec<Menu>> {
    let rows = sqlx::query_as::<_, MenuRow>(
        r#"
        SELECT id, date, meal_type, title, description, suitable_for,
               portion_multiplier, suitable_for_toddler, stock_status, source,
               prep_time_minutes, cook_time_minutes, recipe_url
        FROM menus
        WHERE date BETWEEN $1 AND $2
        ORDER BY date, meal_type
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let lines = sqlx::query_as::<_, MenuIngredientRow>(
        r#"
        SELECT id, menu_id, name, product_id, quantity, unit, available_qty, missing_qty
        FROM menu_ingredients
        WHERE menu_id = ANY($1)
        ORDER BY name
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut menus: Vec<Menu> = rows
        .into_iter()
        .map(|row| Menu {
            row,
            ingredients: Vec::new(),
        })
        .collect();
    for line in lines {
        if let Some(menu) = menus.iter_mut().find(|m| m.row.id == line.menu_id) {
            menu.ingredients.push(line);
        }
    }
    Ok(menus)
}

/// Clears menus previously generated by this run's source in the range, so a
/// regeneration replaces its own output. Rows written by the other generator
/// or entered by hand (`source = 'manual'`) are left alone.
pub async fn delete_generated_range(
    db: &PgPool,
    from: Date,
    to: Date,
    source: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM menus
        WHERE date BETWEEN $1 AND $2
          AND source = $3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(source)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// One slot per (date, meal type); regenerating overwrites in place and the
/// old ingredient lines are replaced wholesale. A hand-entered row
/// (`source = 'manual'`) wins the conflict: the slot is left untouched and
/// None is returned.
pub async fn upsert_slot(
    db: &PgPool,
    slot: &PlannedSlot,
    source: &str,
    recipe_url: Option<&str>,
) -> anyhow::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO menus (date, meal_type, title, description, suitable_for,
                           portion_multiplier, suitable_for_toddler, stock_status,
                           source, prep_time_minutes, cook_time_minutes, recipe_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (date, meal_type)
        DO UPDATE SET title = EXCLUDED.title,
                      description = EXCLUDED.description,
                      suitable_for = EXCLUDED.suitable_for,
                      portion_multiplier = EXCLUDED.portion_multiplier,
                      suitable_for_toddler = EXCLUDED.suitable_for_toddler,
                      stock_status = EXCLUDED.stock_status,
                      source = EXCLUDED.source,
                      prep_time_minutes = EXCLUDED.prep_time_minutes,
                      cook_time_minutes = EXCLUDED.cook_time_minutes,
                      recipe_url = EXCLUDED.recipe_url
        WHERE menus.source <> 'manual'
        RETURNING id
        "#,
    )
    .bind(slot.date)
    .bind(slot.meal_type.as_str())
    .bind(&slot.title)
    .bind(&slot.description)
    .bind(&slot.suitable_for)
    .bind(slot.portion_multiplier)
    .bind(slot.suitable_for_toddler)
    .bind(slot.stock_status.as_str())
    .bind(source)
    .bind(slot.prep_time_minutes)
    .bind(slot.cook_time_minutes)
    .bind(recipe_url)
    .fetch_optional(db)
    .await?;

    let Some((id,)) = row else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM menu_ingredients WHERE menu_id = $1")
        .bind(id)
        .execute(db)
        .await?;
    insert_ingredients(db, id, &slot.ingredients).await?;
    Ok(Some(id))
}

async fn insert_ingredients(
    db: &PgPool,
    menu_id: Uuid,
    lines: &[PlannedIngredient],
) -> anyhow::Result<()> {
    for chunk in lines.chunks(INGREDIENT_INSERT_CHUNK) {
        let mut builder = sqlx::QueryBuilder::new(
            "INSERT INTO menu_ingredients (menu_id, name, product_id, quantity, unit, available_qty, missing_qty) ",
        );
        builder.push_values(chunk, |mut b, line| {
            b.push_bind(menu_id)
                .push_bind(&line.name)
                .push_bind(line.product_id)
                .push_bind(line.quantity)
                .push_bind(line.unit.as_str())
                .push_bind(line.available_qty)
                .push_bind(line.missing_qty);
        });
        builder.build().execute(db).await?;
    }
    Ok(())
}

/// In-memory view of a slot that was just generated, used to answer the
/// generation request without re-reading the table.
pub fn menu_from_slot(id: Uuid, slot: &PlannedSlot, source: &str, recipe_url: Option<String>) -> Menu {
    Menu {
        row: MenuRow {
            id,
            date: slot.date,
            meal_type: slot.meal_type.as_str().to_string(),
            title: slot.title.clone(),
            description: (!slot.description.is_empty()).then(|| slot.description.clone()),
            suitable_for: slot.suitable_for.clone(),
            portion_multiplier: slot.portion_multiplier,
            suitable_for_toddler: slot.suitable_for_toddler,
            stock_status: slot.stock_status.as_str().to_string(),
            source: source.to_string(),
            prep_time_minutes: slot.prep_time_minutes,
            cook_time_minutes: slot.cook_time_minutes,
            recipe_url,
        },
        ingredients: slot
            .ingredients
            .iter()
            .map(|line| MenuIngredientRow {
                id: Uuid::new_v4(),
                menu_id: id,
                name: line.name.clone(),
                product_id: line.product_id,
                quantity: line.quantity,
                unit: line.unit.as_str().to_string(),
                available_qty: line.available_qty,
                missing_qty: line.missing_qty,
            })
            .collect(),
    }
}

pub fn parse_meal_types(labels: &[String]) -> Vec<MealType> {
    let mut types = Vec::new();
    for label in labels {
        let meal = MealType::normalize(label);
        if !types.contains(&meal) {
            types.push(meal);
        }
    }
    if types.is_empty() {
        types = MealType::DEFAULT_SET.to_vec();
    }
    types
}

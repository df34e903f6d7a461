use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::text::normalize_label;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub default_unit: String,
}

/// One stock batch of a product. Several rows may exist per product; the
/// planner draws from them in ascending expiry order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    #[serde(with = "crate::dates::iso_date_option")]
    pub expiry_date: Option<Date>,
    pub minimum_threshold: f64,
}

pub async fn list_products(db: &PgPool) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, default_unit
        FROM products
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Idempotent find-or-create keyed on the normalized (lowercased,
/// diacritic-folded) name, so concurrent creators converge on one row.
pub async fn find_or_create_product(
    db: &PgPool,
    name: &str,
    default_unit: Option<&str>,
) -> anyhow::Result<Product> {
    let normalized = normalize_label(name);
    anyhow::ensure!(!normalized.is_empty(), "product name is empty");
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, normalized_name, default_unit)
        VALUES ($1, $2, $3)
        ON CONFLICT (normalized_name)
        DO UPDATE SET normalized_name = EXCLUDED.normalized_name
        RETURNING id, name, default_unit
        "#,
    )
    .bind(name.trim())
    .bind(&normalized)
    .bind(default_unit.unwrap_or("pcs"))
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn find_product_fuzzy(db: &PgPool, name: &str) -> anyhow::Result<Option<Product>> {
    let normalized = normalize_label(name);
    if normalized.is_empty() {
        return Ok(None);
    }
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, default_unit
        FROM products
        WHERE normalized_name = $1
        "#,
    )
    .bind(&normalized)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

pub async fn list_inventory(db: &PgPool) -> anyhow::Result<Vec<InventoryEntry>> {
    let rows = sqlx::query_as::<_, InventoryEntry>(
        r#"
        SELECT id, product_id, quantity, unit, expiry_date, minimum_threshold
        FROM inventory
        ORDER BY expiry_date ASC NULLS LAST
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub struct NewInventoryEntry {
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub expiry_date: Option<Date>,
    pub minimum_threshold: f64,
}

pub async fn insert_inventory(db: &PgPool, entry: &NewInventoryEntry) -> anyhow::Result<InventoryEntry> {
    let row = sqlx::query_as::<_, InventoryEntry>(
        r#"
        INSERT INTO inventory (product_id, quantity, unit, expiry_date, minimum_threshold)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, product_id, quantity, unit, expiry_date, minimum_threshold
        "#,
    )
    .bind(entry.product_id)
    .bind(entry.quantity)
    .bind(&entry.unit)
    .bind(entry.expiry_date)
    .bind(entry.minimum_threshold)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub struct InventoryPatch {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expiry_date: Option<Option<Date>>,
    pub minimum_threshold: Option<f64>,
}

pub async fn update_inventory(
    db: &PgPool,
    id: Uuid,
    patch: &InventoryPatch,
) -> anyhow::Result<Option<InventoryEntry>> {
    let row = sqlx::query_as::<_, InventoryEntry>(
        r#"
        UPDATE inventory
        SET quantity = COALESCE($2, quantity),
            unit = COALESCE($3, unit),
            expiry_date = CASE WHEN $4 THEN $5 ELSE expiry_date END,
            minimum_threshold = COALESCE($6, minimum_threshold),
            last_updated = $7
        WHERE id = $1
        RETURNING id, product_id, quantity, unit, expiry_date, minimum_threshold
        "#,
    )
    .bind(id)
    .bind(patch.quantity)
    .bind(patch.unit.as_deref())
    .bind(patch.expiry_date.is_some())
    .bind(patch.expiry_date.flatten())
    .bind(patch.minimum_threshold)
    .bind(OffsetDateTime::now_utc())
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Quantity write-back after allocation consumed stock.
pub async fn set_inventory_quantity(db: &PgPool, id: Uuid, quantity: f64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE inventory
        SET quantity = $2, last_updated = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(OffsetDateTime::now_utc())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_inventory(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_MEDIUM: &str = "medium";

pub const REASON_MANUAL: &str = "manual";
pub const REASON_AUTO: &str = "auto";
pub const REASON_ALEXA: &str = "alexa";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShoppingEntry {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub priority: String,
    pub added_reason: String,
    pub is_purchased: bool,
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewShoppingEntry {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub priority: String,
    pub added_reason: String,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<ShoppingEntry>> {
    let rows = sqlx::query_as::<_, ShoppingEntry>(
        r#"
        SELECT id, product_id, name, quantity, unit, priority, added_reason, is_purchased, added_at
        FROM shopping_lists
        ORDER BY is_purchased, priority DESC, added_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_unpurchased(db: &PgPool) -> anyhow::Result<Vec<ShoppingEntry>> {
    let rows = sqlx::query_as::<_, ShoppingEntry>(
        r#"
        SELECT id, product_id, name, quantity, unit, priority, added_reason, is_purchased, added_at
        FROM shopping_lists
        WHERE is_purchased = FALSE
        ORDER BY added_at
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(db: &PgPool, entry: &NewShoppingEntry) -> anyhow::Result<ShoppingEntry> {
    let row = sqlx::query_as::<_, ShoppingEntry>(
        r#"
        INSERT INTO shopping_lists (product_id, name, quantity, unit, priority, added_reason)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, product_id, name, quantity, unit, priority, added_reason, is_purchased, added_at
        "#,
    )
    .bind(entry.product_id)
    .bind(entry.name.as_deref())
    .bind(entry.quantity)
    .bind(&entry.unit)
    .bind(&entry.priority)
    .bind(&entry.added_reason)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn insert_many(db: &PgPool, entries: &[NewShoppingEntry]) -> anyhow::Result<()> {
    for entry in entries {
        insert(db, entry).await?;
    }
    Ok(())
}

/// Quantity merge used by auto-generated deltas: the existing unpurchased
/// entry absorbs the shortfall and is bumped to high priority.
pub async fn merge_quantity(
    db: &PgPool,
    id: Uuid,
    quantity: f64,
    unit: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE shopping_lists
        SET quantity = $2, unit = $3, priority = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(unit)
    .bind(PRIORITY_HIGH)
    .execute(db)
    .await?;
    Ok(())
}

pub struct ShoppingPatch {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub priority: Option<String>,
    pub is_purchased: Option<bool>,
}

pub async fn patch(
    db: &PgPool,
    id: Uuid,
    fields: &ShoppingPatch,
) -> anyhow::Result<Option<ShoppingEntry>> {
    let row = sqlx::query_as::<_, ShoppingEntry>(
        r#"
        UPDATE shopping_lists
        SET quantity = COALESCE($2, quantity),
            unit = COALESCE($3, unit),
            priority = COALESCE($4, priority),
            is_purchased = COALESCE($5, is_purchased)
        WHERE id = $1
        RETURNING id, product_id, name, quantity, unit, priority, added_reason, is_purchased, added_at
        "#,
    )
    .bind(id)
    .bind(fields.quantity)
    .bind(fields.unit.as_deref())
    .bind(fields.priority.as_deref())
    .bind(fields.is_purchased)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM shopping_lists WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_product_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_product_id: Option<Uuid>,
}

pub async fn insert(db: &PgPool, notification: &NewNotification) -> anyhow::Result<Notification> {
    let row = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (type, title, message, related_product_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, type, title, message, is_read, related_product_id, created_at
        "#,
    )
    .bind(&notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.related_product_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, type, title, message, is_read, related_product_id, created_at
        FROM notifications
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn mark_read(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(db: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE is_read = FALSE")
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

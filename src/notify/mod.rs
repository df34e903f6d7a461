//! Notifications: persisted rows plus a best-effort webhook fan-out.

mod handlers;
pub mod repo;
mod webhook;

pub use repo::{NewNotification, Notification};
pub use webhook::{Notifier, NoopNotifier, WebhookNotifier};

pub const TYPE_LOW_STOCK: &str = "low_stock";
pub const TYPE_SHOPPING_REMINDER: &str = "shopping_reminder";

use crate::state::AppState;
use axum::Router;
use tracing::warn;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

/// Stores a notification row, then forwards it to the webhook. Both steps
/// are best-effort; a failure is logged and never propagates.
pub async fn record(state: &AppState, notification: NewNotification) {
    if let Err(e) = repo::insert(&state.db, &notification).await {
        warn!(error = %e, kind = %notification.kind, "failed to store notification");
        return;
    }
    state
        .notifier
        .notify(&notification.kind, &notification.title, &notification.message)
        .await;
}

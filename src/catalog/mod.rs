mod dto;
mod handlers;
pub mod repo;

pub use repo::{InventoryEntry, Product};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

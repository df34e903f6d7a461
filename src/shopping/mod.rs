mod dto;
mod handlers;
pub mod repo;

pub use repo::{NewShoppingEntry, ShoppingEntry};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

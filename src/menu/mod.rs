//! Menu planning: portion scaling, the allocation engine and the HTTP
//! surface that drives it.

mod dto;
mod handlers;
pub mod plan;
pub mod portions;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

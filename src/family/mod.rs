mod handlers;
pub mod repo;

pub use repo::{demo_family, AgeGroup, FamilyMember};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

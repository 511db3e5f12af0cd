use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod stats;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::record_routes())
        .merge(stats::stats_routes())
}

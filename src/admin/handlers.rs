use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use crate::{
    admin::repo::{self, UserSummary},
    auth::jwt::CurrentUser,
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/users", get(list_users))
}

/// The gateway already enforced the admin claim for this namespace.
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<Vec<UserSummary>>, ApiError> {
    let users = repo::list_user_summaries(&state.db).await?;
    info!(admin_id = claims.id, users = users.len(), "admin user listing");
    Ok(ApiResponse::ok(users))
}

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::jwt::CurrentUser,
    categories::{
        dto::{CreateCategoryRequest, CreatedCategory},
        repo::{self, Category},
    },
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn category_routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories).post(create_category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ApiResponse<Vec<Category>>, ApiError> {
    let categories = repo::list_for_user(&state.db, claims.id).await?;
    Ok(ApiResponse::ok(categories))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<ApiResponse<CreatedCategory>, ApiError> {
    let name = match payload.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::validation("category name must not be empty")),
    };

    let id = repo::create(&state.db, claims.id, &name, payload.is_income).await?;
    info!(user_id = claims.id, category_id = id, "category created");
    Ok(ApiResponse::ok_with_message(
        "category added",
        CreatedCategory { id },
    ))
}

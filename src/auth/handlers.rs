use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginData, LoginRequest, PublicUser, RegisterRequest},
        jwt::{Claims, CurrentUser, JwtKeys},
        password,
        repo::User,
    },
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let (username, password) = match (payload.username, payload.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::validation("username and password are required")),
    };

    let username_len = username.chars().count();
    if !(3..=20).contains(&username_len) {
        return Err(ApiError::validation("username must be 3-20 characters"));
    }
    if password.chars().count() < 6 {
        return Err(ApiError::validation(
            "password must be at least 6 characters",
        ));
    }

    if User::find_by_username(&state.db, &username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(ApiError::conflict("username already taken"));
    }

    let hash = password::hash_password(&password).map_err(ApiError::Internal)?;
    let user = User::create(&state.db, &username, &hash).await?;

    info!(user_id = user.id, %username, "user registered");
    Ok(ApiResponse::message("registered successfully, please log in"))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let (username, password) = match (payload.username, payload.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::validation("username and password are required")),
    };

    // The same message for an unknown username and a wrong password, so the
    // response does not reveal which usernames exist.
    let Some(user) = User::find_by_username(&state.db, &username).await? else {
        warn!(%username, "login with unknown username");
        return Err(ApiError::validation("username or password incorrect"));
    };

    let password_ok =
        password::verify_password(&password, &user.password).map_err(ApiError::Internal)?;
    if !password_ok {
        warn!(user_id = user.id, "login with wrong password");
        return Err(ApiError::validation("username or password incorrect"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys
        .sign(user.id, &user.username, user.is_admin)
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, "user logged in");
    Ok(ApiResponse::ok_with_message(
        "login successful",
        LoginData {
            token,
            user: PublicUser {
                id: user.id,
                username: user.username,
                is_admin: user.is_admin,
            },
        },
    ))
}

/// Echoes the claims the gateway verified for this request.
#[instrument(skip_all)]
pub async fn me(CurrentUser(claims): CurrentUser) -> ApiResponse<Claims> {
    ApiResponse::ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn register_ok(state: &AppState, username: &str, password: &str) {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                username: Some(username.into()),
                password: Some(password.into()),
            }),
        )
        .await
        .expect("registration should succeed");
    }

    async fn try_login(
        state: &AppState,
        username: &str,
        password: &str,
    ) -> Result<ApiResponse<LoginData>, ApiError> {
        login(
            State(state.clone()),
            Json(LoginRequest {
                username: Some(username.into()),
                password: Some(password.into()),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn register_then_login_returns_token_for_same_user() {
        let state = AppState::for_tests().await;
        register_ok(&state, "alice", "secret1").await;

        let response = try_login(&state, "alice", "secret1")
            .await
            .expect("login should succeed");
        let data = response.data.expect("login payload");
        assert_eq!(data.user.username, "alice");
        assert!(!data.user.is_admin);

        let claims = JwtKeys::from_ref(&state)
            .verify(&data.token)
            .expect("token should verify");
        assert_eq!(claims.id, data.user.id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let state = AppState::for_tests().await;
        register_ok(&state, "alice", "secret1").await;

        let unknown_user = try_login(&state, "nobody", "secret1").await.unwrap_err();
        let wrong_password = try_login(&state, "alice", "wrong66").await.unwrap_err();

        assert!(matches!(unknown_user, ApiError::Validation(_)));
        assert_eq!(unknown_user.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn register_validates_field_lengths() {
        let state = AppState::for_tests().await;

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: Some("al".into()),
                password: Some("secret1".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: Some("alice".into()),
                password: Some("short".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: None,
                password: Some("secret1".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let state = AppState::for_tests().await;
        register_ok(&state, "alice", "secret1").await;

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                username: Some("alice".into()),
                password: Some("secret2".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}

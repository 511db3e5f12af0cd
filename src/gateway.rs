use axum::{
    extract::{FromRef, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{auth::jwt::JwtKeys, error::ApiError, state::AppState};

/// Exact paths that never require a token.
const ALLOW_LIST: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/login.html",
    "/register.html",
    "/css/style.css",
    "/js/api.js",
    "/js/auth.js",
    "/",
];

/// Static asset prefixes that bypass authentication.
const STATIC_PREFIXES: &[&str] = &["/js/", "/css/"];

/// HTML entry pages that get a login redirect instead of a 401 envelope.
const LOGIN_REDIRECT_PATHS: &[&str] = &["/index.html", "/admin.html"];

const ADMIN_PREFIX: &str = "/api/admin/";

pub fn requires_auth(path: &str) -> bool {
    !(ALLOW_LIST.contains(&path) || STATIC_PREFIXES.iter().any(|p| path.starts_with(p)))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Gate every request before it reaches a handler: allow-listed paths pass
/// through untouched, everything else needs a valid bearer token, and the
/// admin namespace additionally needs the admin claim. Verified claims are
/// attached to the request extensions for downstream extractors.
pub async fn auth_gateway(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    // Preflight requests with proper CORS headers are answered by the CORS
    // layer before they get here; stray OPTIONS requests end here.
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let path = req.uri().path().to_owned();
    if !requires_auth(&path) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        if LOGIN_REDIRECT_PATHS.contains(&path.as_str()) {
            return (StatusCode::FOUND, [(header::LOCATION, "/login.html")]).into_response();
        }
        return ApiError::auth("not logged in, please log in first").into_response();
    };

    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify(token) {
        Ok(claims) => claims,
        Err(_) => {
            warn!(%path, "invalid or expired token");
            return ApiError::auth("invalid token, please log in again").into_response();
        }
    };

    if path.starts_with(ADMIN_PREFIX) && !claims.is_admin {
        warn!(user_id = claims.id, %path, "admin route denied");
        return ApiError::forbidden("admin privileges required").into_response();
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}

use serde::{Deserialize, Serialize};

/// Request body for registration. Fields are optional so a missing key
/// surfaces as a validation error instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Payload returned by a successful login.
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: PublicUser,
}

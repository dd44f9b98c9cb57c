// HTTP handlers, one module per route group

pub mod auth;
pub mod google;
pub mod todos;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::{create_token, session_ttl};
use crate::auth::password::{hash_password, verify_password};
use crate::domain::user::User;

/// Signs a session token for `user`
pub(crate) fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    create_token(
        user.id(),
        user.email().as_str(),
        &state.config.jwt_secret,
        session_ttl(),
    )
    .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
}

// bcrypt is CPU bound, so it runs off the async worker threads

pub(crate) async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

pub(crate) async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| ApiError::internal(format!("Password verification failed: {}", e)))
}

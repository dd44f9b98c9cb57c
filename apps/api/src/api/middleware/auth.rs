use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::session::TOKEN_COOKIE;
use crate::api::state::AppState;
use crate::auth::jwt::verify_token;

/// Authenticated caller, extracted from the session token
///
/// The token is read from the `token` cookie; an `Authorization: Bearer`
/// header is accepted when no cookie is present.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(user: AuthUser) -> Result<String, ApiError> {
///     Ok(format!("Hello user {}", user.user_id))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_cookie = CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)
            .ok_or_else(|| ApiError::unauthorized("Access Denied. No token available"))?;

        let claims = verify_token(&token, &state.config.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            ApiError::unauthorized("Invalid token")
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use super::issue_token;
use crate::api::errors::ApiError;
use crate::api::session::{
    cleared_oauth_state_cookie, generate_oauth_state, oauth_state_cookie, session_cookie,
    OAUTH_STATE_COOKIE,
};
use crate::api::state::AppState;
use crate::domain::user::{Email, User};

/// Query parameters Google appends to the callback URL
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn not_configured() -> ApiError {
    ApiError::internal_server_error("Google login is not configured")
}

/// Start the Google login flow
///
/// GET /auth/google
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let provider = state.oauth.as_ref().ok_or_else(not_configured)?;

    let csrf_state = generate_oauth_state();
    let url = provider
        .authorize_url(&csrf_state)
        .map_err(ApiError::internal)?;

    Ok((
        jar.add(oauth_state_cookie(csrf_state, state.config.cookie_secure)),
        Redirect::to(&url),
    ))
}

/// Finish the Google login flow and hand the session to the frontend
///
/// GET /auth/google/callback
///
/// Always redirects: to `{UI_URL}/success-login?token=...` on success and
/// to `{UI_URL}/login` on any failure.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackParams>,
) -> (CookieJar, Redirect) {
    let secure = state.config.cookie_secure;
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.add(cleared_oauth_state_cookie(secure));
    let failure = Redirect::to(&format!("{}/login", state.config.ui_url));

    let user = match complete_google_login(&state, params, expected_state).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(status = %e.status, "Google login failed: {}", e.message);
            return (jar, failure);
        }
    };

    match issue_token(&state, &user) {
        Ok(token) => {
            tracing::info!(user_id = %user.id(), "User signed in with Google");
            let target = format!("{}/success-login?token={}", state.config.ui_url, token);
            (jar.add(session_cookie(token, secure)), Redirect::to(&target))
        }
        Err(_) => (jar, failure),
    }
}

/// Validates the callback, exchanges the code, then finds or creates the user
async fn complete_google_login(
    state: &AppState,
    params: GoogleCallbackParams,
    expected_state: Option<String>,
) -> Result<User, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::unauthorized(format!("Provider returned error: {}", error)));
    }

    let provider = state.oauth.as_ref().ok_or_else(not_configured)?;

    match (params.state.as_deref(), expected_state.as_deref()) {
        (Some(received), Some(expected)) if !expected.is_empty() && received == expected => {}
        _ => return Err(ApiError::unauthorized("OAuth state mismatch")),
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let profile = provider
        .exchange_code(&code)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let email = Email::new(&profile.email).map_err(ApiError::bad_request)?;
    let now = Utc::now();

    match state.users.find_by_email(&email).await? {
        Some(mut user) => {
            if user.backfill_profile_image(profile.picture.as_deref(), now) {
                state.users.update(&user).await?;
            }
            Ok(user)
        }
        None => {
            let user = User::from_oauth(
                profile.name,
                email,
                profile.picture,
                profile.email_verified,
                now,
            );
            state.users.create(&user).await?;
            tracing::info!(user_id = %user.id(), "Created user from Google profile");
            Ok(user)
        }
    }
}

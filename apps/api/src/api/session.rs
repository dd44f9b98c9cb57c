// Cookies carrying the session token and the OAuth CSRF state

use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::{distributions::Alphanumeric, Rng};
use time::Duration;

use crate::auth::jwt::SESSION_TTL_SECS;

/// Name of the cookie holding the session JWT
pub const TOKEN_COOKIE: &str = "token";

/// Name of the cookie holding the OAuth `state` between redirect and callback
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const OAUTH_STATE_TTL_SECS: i64 = 10 * 60;

fn base_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// HTTP-only cookie carrying a freshly issued session token
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    base_cookie(TOKEN_COOKIE, token, secure, Duration::seconds(SESSION_TTL_SECS))
}

/// Expired, empty session cookie that makes the browser drop its token
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    base_cookie(TOKEN_COOKIE, String::new(), secure, Duration::ZERO)
}

pub fn oauth_state_cookie(state: String, secure: bool) -> Cookie<'static> {
    base_cookie(
        OAUTH_STATE_COOKIE,
        state,
        secure,
        Duration::seconds(OAUTH_STATE_TTL_SECS),
    )
}

pub fn cleared_oauth_state_cookie(secure: bool) -> Cookie<'static> {
    base_cookie(OAUTH_STATE_COOKIE, String::new(), secure, Duration::ZERO)
}

/// Random value for the OAuth `state` parameter
pub fn generate_oauth_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_for_one_hour() {
        let cookie = session_cookie("abc".to_string(), false);

        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::hours(1)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn secure_flag_follows_config() {
        assert_eq!(session_cookie("t".to_string(), true).secure(), Some(true));
        assert_eq!(session_cookie("t".to_string(), false).secure(), Some(false));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = cleared_session_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn oauth_states_are_random() {
        let a = generate_oauth_state();
        let b = generate_oauth_state();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}

// JWT session token creation and verification
// Tokens ride in the `token` cookie and expire after one hour

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a session token, in seconds. The session cookie uses the same value.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Session token lifetime as a duration
pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `email` - Email address the token was issued for
/// * `iat` - Issued-at time (seconds since epoch)
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    pub email: String,
    pub iat: usize,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates a signed JWT for a user
///
/// # Arguments
/// * `user_id` - The user's ID, stored in the `sub` claim
/// * `email` - The user's email, stored in the `email` claim
/// * `secret` - HS256 signing key
/// * `ttl` - How long the token stays valid
///
/// # Example
/// ```
/// use todo_api::auth::jwt::{create_token, session_ttl};
/// use uuid::Uuid;
///
/// let token = create_token(Uuid::new_v4(), "a@gmail.com", "secret", session_ttl())
///     .expect("valid token");
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn create_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, String> {
    let now = Utc::now();
    let expiry = now + ttl;
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: expiry.timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT
///
/// Fails on a bad signature, a malformed token, or an expired `exp` claim.
///
/// # Example
/// ```
/// use todo_api::auth::jwt::{create_token, session_ttl, verify_token};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, "a@gmail.com", "secret", session_ttl()).unwrap();
///
/// let claims = verify_token(&token, "secret").expect("valid token");
/// assert_eq!(claims.sub, user_id);
/// ```
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
